//! Telio Core Library
//!
//! Reads the vehicle-side inputs of a telematics board (ignition, supply
//! voltage and up to seven general-purpose inputs) across every I/O wiring
//! scheme the board family has shipped with.
//!
//! # Features
//!
//! - **Scheme Detection**: Resolves the wiring scheme from manufacturing parameters
//! - **Sampling**: Bulk channel reads with single-channel retry, classified per scheme
//! - **Boot Mask**: Remaps the boot-time mask into one canonical layout
//! - **Shutdown Filter**: Marks ambiguous tri-state readings while powering down
//! - **Configuration**: Persistent JSON settings with defaults for every field
//!
//! # Module Structure
//!
//! - `io/` - Hardware interaction (detection, channel sources, sampling)
//! - `data/` - Data types and validation
//!
//! # Example
//!
//! ```no_run
//! use telio_core::{detect_scheme, sample, SysfsChannelSource, TelioSettings};
//!
//! let settings = TelioSettings::default();
//! let scheme = detect_scheme(&settings.detection);
//! let source = SysfsChannelSource::new(&settings.sampling.source_path);
//! let snapshot = sample(&source, scheme, &settings.sampling.thresholds());
//! ```

// Grouped modules
pub mod data;
pub mod io;

// Standalone modules
pub mod constants;
pub mod error;
pub mod settings;

// Re-export primary types from data/
pub use data::{
    Channel, ChannelKind, IgnitionReading, Input, InputLevel, InputSnapshot, Scheme, Thresholds,
};

// Re-export validation functions from data/
pub use data::{validate_poll_interval, validate_settings, validate_thresholds};

// Re-export error types
pub use error::{Result, TelioError};

// Re-export hardware functions from io/
pub use io::{
    channel_map, classify_analog, classify_digital, detect_scheme, mark_untrustworthy,
    millivolts_to_volts, parse_scheme_marker, remap_boot_mask, sample, snapshot_to_json,
    snapshot_to_json_compact, BootMask, ChannelMap, InputReport, RawChannelSource,
    SchemeCache, ShutdownWindow, SysfsChannelSource,
};

// Re-export settings functions
pub use settings::{
    get_cached_settings, get_settings_path, invalidate_settings_cache, load_settings,
    load_settings_from, save_settings_to, set_cached_settings, write_atomic,
    DetectionSettings, OutputSettings, SamplingSettings, ShutdownSettings, TelioSettings,
};

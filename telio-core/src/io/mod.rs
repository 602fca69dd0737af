//! Hardware-facing modules
//!
//! Scheme detection, raw channel access, sampling and the post-processing
//! applied to samples.

mod boot_mask;
mod capture;
pub mod channel_map;
mod detection;
mod sampling;
mod shutdown;
pub mod source;

pub use boot_mask::{remap_boot_mask, BootMask};
pub use capture::{snapshot_to_json, snapshot_to_json_compact, InputReport};
pub use channel_map::{channel_map, ChannelMap};
pub use detection::{detect_scheme, parse_scheme_marker, SchemeCache};
pub use sampling::{classify_analog, classify_digital, millivolts_to_volts, sample};
pub use shutdown::{mark_untrustworthy, ShutdownWindow};
pub use source::{RawChannelSource, SysfsChannelSource};

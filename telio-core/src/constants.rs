//! Constants and configuration values for Telio
//!
//! Centralizes all magic numbers, paths, and configuration defaults.
//! Never use magic numbers in other files - add them here first.

/// System paths
pub mod paths {
    use std::path::PathBuf;

    /// System-wide configuration directory
    pub const CONFIG_DIR: &str = "/etc/telio";

    /// Settings file name (inside the config directory)
    pub const SETTINGS_FILE: &str = "settings.json";

    /// Environment variable overriding the settings file location
    pub const CONFIG_ENV: &str = "TELIO_CONFIG";

    /// Manufacturing-parameter blob exposed by the board support package
    pub const MFG_PARAMS: &str = "/proc/mfg_params";

    /// Device-tree model string (fixed hardware identity)
    pub const BOARD_MODEL: &str = "/proc/device-tree/model";

    /// Default directory where the input driver publishes channel files
    pub const CHANNEL_SOURCE: &str = "/sys/class/telio/inputs";

    /// Default location of the published snapshot
    pub const STATE_FILE: &str = "/run/telio/inputs.json";

    /// User configuration directory (`~/.config/telio`)
    pub fn user_config_dir() -> Option<PathBuf> {
        let config_base = if let Ok(xdg) = std::env::var("XDG_CONFIG_HOME") {
            Some(PathBuf::from(xdg))
        } else {
            dirs::config_dir()
        };

        config_base.map(|p| p.join("telio"))
    }
}

/// Raw channel conventions shared with the driver
pub mod channel {
    /// Value returned by the driver for a channel that could not be read
    pub const ERROR_SENTINEL: i32 = -1;

    /// Analog channels report millivolts, divide by this to get volts
    pub const MILLIVOLTS_PER_VOLT: f32 = 1000.0;

    /// Number of general-purpose logical inputs
    pub const INPUT_COUNT: usize = 7;

    /// Bulk digital read file name
    pub const DIGITAL_ALL_FILE: &str = "digital";

    /// Bulk analog read file name
    pub const ANALOG_ALL_FILE: &str = "analog";

    /// Boot mask file name
    pub const BOOT_MASK_FILE: &str = "boot_mask";

    /// Single digital channel file name
    pub fn digital_file(index: u8) -> String {
        format!("digital{}_input", index)
    }

    /// Single analog channel file name
    pub fn analog_file(index: u8) -> String {
        format!("analog{}_input", index)
    }
}

/// Analog classification thresholds (millivolts)
pub mod thresholds {
    /// At or below this value an analog input reads as ground
    pub const DEFAULT_LOW_MV: i32 = 2500;

    /// At or above this value an analog input reads as powered
    pub const DEFAULT_HIGH_MV: i32 = 10000;
}

/// Scheme detection constants
pub mod detection {
    /// Marker preceding the scheme character in the manufacturing parameters
    pub const SCHEME_MARKER: &str = "p04_27<";

    /// Offset of the scheme character after the end of the marker
    pub const SCHEME_CHAR_OFFSET: usize = 0;

    /// Upper bound on how much of the parameter blob is read
    pub const MAX_PARAMS_BYTES: u64 = 64 * 1024;
}

/// Boot mask bit layout
pub mod boot_mask {
    /// Canonical bit positions
    pub const IGNITION: u8 = 1 << 0;
    pub const INPUT1: u8 = 1 << 1;
    pub const INPUT2: u8 = 1 << 2;
    pub const INPUT3: u8 = 1 << 3;
    pub const WIGGLE: u8 = 1 << 4;
    pub const ARM_LOCKUP: u8 = 1 << 5;
    pub const WATCHDOG: u8 = 1 << 6;

    /// All bits defined by the canonical layout
    pub const CANONICAL_MASK: u8 = 0x7F;

    /// Legacy digital layouts keep the reset causes in bits 1-3
    pub const LEGACY_RESET_CAUSES: u8 = 0x0E;

    /// Shift that moves legacy reset causes to canonical bits 4-6
    pub const LEGACY_RESET_SHIFT: u32 = 3;
}

/// Timing constants
pub mod timing {
    /// Default sampling period
    pub const DEFAULT_POLL_INTERVAL_MS: u32 = 1000;

    /// Poll interval bounds accepted from configuration
    pub const MIN_POLL_INTERVAL_MS: u32 = 50;
    pub const MAX_POLL_INTERVAL_MS: u32 = 60_000;

    /// How long readings stay untrustworthy after ignition drops
    pub const DEFAULT_SHUTDOWN_WINDOW_MS: u64 = 5000;

    /// Maximum consecutive failed samples before the daemon repeats its warning
    pub const FAILED_SAMPLE_LOG_EVERY: u32 = 10;
}

//! Data types and validation modules
//!
//! Contains the snapshot types shared by every component and the checks
//! applied to configuration values.

mod types;
mod validation;

pub use types::{
    Channel, ChannelKind, IgnitionReading, Input, InputLevel, InputSnapshot, Scheme, Thresholds,
};
pub use validation::{validate_poll_interval, validate_settings, validate_thresholds};

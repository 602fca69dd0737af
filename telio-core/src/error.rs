//! Error types, shared with every Telio crate

pub use telio_error::{Result, TelioError};

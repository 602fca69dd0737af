//! Unified error handling for Telio
//!
//! This crate provides a single error type used across all Telio components.
//! Sampling itself never fails outward (partial snapshots are valid results),
//! so these errors come from configuration, file access and the daemon.

use std::io;
use std::path::PathBuf;

/// Result type alias using TelioError
pub type Result<T> = std::result::Result<T, TelioError>;

/// Unified error type for all Telio operations
#[derive(thiserror::Error, Debug)]
pub enum TelioError {
    // ============================================================================
    // I/O and File System Errors
    // ============================================================================
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Failed to read file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: io::Error,
    },

    #[error("Failed to write file {path}: {source}")]
    FileWrite {
        path: PathBuf,
        source: io::Error,
    },

    #[error("File not found: {0}")]
    FileNotFound(PathBuf),

    // ============================================================================
    // Configuration Errors
    // ============================================================================
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to parse JSON: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid configuration value for {field}: {reason}")]
    InvalidConfig {
        field: String,
        reason: String,
    },

    #[error("Invalid thresholds: low {low_mv} mV must be positive and below high {high_mv} mV")]
    InvalidThresholds {
        low_mv: i32,
        high_mv: i32,
    },

    // ============================================================================
    // Hardware Access Errors
    // ============================================================================
    #[error("Failed to read channel from {path}: {reason}")]
    ChannelRead {
        path: PathBuf,
        reason: String,
    },

    // ============================================================================
    // Generic Errors
    // ============================================================================
    #[error("{0}")]
    Generic(String),
}

impl TelioError {
    /// Create a config error from a string
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid config error for a named field
    pub fn invalid_config(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidConfig {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Create a channel read error
    pub fn channel_read(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        Self::ChannelRead {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

// Allow converting from String to TelioError
impl From<String> for TelioError {
    fn from(s: String) -> Self {
        Self::Generic(s)
    }
}

// Allow converting from &str to TelioError
impl From<&str> for TelioError {
    fn from(s: &str) -> Self {
        Self::Generic(s.to_string())
    }
}

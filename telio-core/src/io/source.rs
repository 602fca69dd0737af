//! Raw channel sources
//!
//! The sampler only talks to the driver through [`RawChannelSource`].
//! [`SysfsChannelSource`] reads the values a driver publishes as plain files:
//!
//! ```text
//! <base>/digital            bulk digital states, e.g. "1 0 1 1 0"
//! <base>/analog             bulk analog values in millivolts
//! <base>/digital{N}_input   single digital channel N
//! <base>/analog{N}_input    single analog channel N
//! <base>/boot_mask          mask captured at boot (decimal or 0x hex)
//! ```
//!
//! Any value that cannot be read or parsed comes back as the `-1` sentinel.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tracing::trace;

use crate::constants::channel;
use crate::error::{Result, TelioError};

/// Access to the raw per-channel integers produced by the input driver
///
/// Every read returns [`channel::ERROR_SENTINEL`] for a channel that could not
/// be read. Bulk reads return `None` when the whole driver call fails.
#[cfg_attr(test, mockall::automock)]
pub trait RawChannelSource {
    /// Whether the driver binding can currently be obtained
    fn is_available(&self) -> bool;

    /// All digital pin states, in channel order
    fn read_all_digital(&self) -> Option<Vec<i32>>;

    /// All analog channel values in millivolts, in channel order
    fn read_all_analog(&self) -> Option<Vec<i32>>;

    /// A single digital channel
    fn read_digital(&self, index: u8) -> i32;

    /// A single analog channel in millivolts
    fn read_analog(&self, index: u8) -> i32;
}

/// File-backed channel source
#[derive(Debug, Clone)]
pub struct SysfsChannelSource {
    base: PathBuf,
}

impl SysfsChannelSource {
    pub fn new(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    pub fn base(&self) -> &Path {
        &self.base
    }

    /// Read the boot mask captured by the driver
    pub fn read_boot_mask(&self) -> Result<u8> {
        let path = self.base.join(channel::BOOT_MASK_FILE);
        let content = read_trimmed(&path)?;
        parse_mask(&content)
            .ok_or_else(|| TelioError::channel_read(&path, format!("invalid mask '{}'", content)))
    }

    fn read_bulk(&self, file: &str) -> Option<Vec<i32>> {
        let path = self.base.join(file);
        match read_trimmed(&path) {
            Ok(content) => Some(parse_bulk(&content)),
            Err(e) => {
                trace!(error = %e, "Bulk read failed");
                None
            }
        }
    }

    fn read_single(&self, file: &str) -> i32 {
        let path = self.base.join(file);
        read_trimmed(&path)
            .and_then(|content| {
                content
                    .parse::<i32>()
                    .map_err(|e| TelioError::channel_read(&path, format!("'{}': {}", content, e)))
            })
            .unwrap_or_else(|e| {
                trace!(error = %e, "Single channel read failed");
                channel::ERROR_SENTINEL
            })
    }
}

impl RawChannelSource for SysfsChannelSource {
    fn is_available(&self) -> bool {
        self.base.is_dir()
    }

    fn read_all_digital(&self) -> Option<Vec<i32>> {
        self.read_bulk(channel::DIGITAL_ALL_FILE)
    }

    fn read_all_analog(&self) -> Option<Vec<i32>> {
        self.read_bulk(channel::ANALOG_ALL_FILE)
    }

    fn read_digital(&self, index: u8) -> i32 {
        self.read_single(&channel::digital_file(index))
    }

    fn read_analog(&self, index: u8) -> i32 {
        self.read_single(&channel::analog_file(index))
    }
}

fn read_trimmed(path: &Path) -> Result<String> {
    fs::read_to_string(path)
        .map(|s| s.trim().to_string())
        .map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => TelioError::FileNotFound(path.to_path_buf()),
            _ => TelioError::FileRead {
                path: path.to_path_buf(),
                source: e,
            },
        })
}

/// Split on whitespace or commas; entries that do not parse become the sentinel
fn parse_bulk(content: &str) -> Vec<i32> {
    content
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|token| !token.is_empty())
        .map(|token| token.parse::<i32>().unwrap_or(channel::ERROR_SENTINEL))
        .collect()
}

fn parse_mask(content: &str) -> Option<u8> {
    if let Some(hex) = content
        .strip_prefix("0x")
        .or_else(|| content.strip_prefix("0X"))
    {
        u8::from_str_radix(hex, 16).ok()
    } else {
        content.parse::<u8>().ok()
    }
}

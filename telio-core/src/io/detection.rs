//! I/O scheme detection
//!
//! Resolves which board revision we are running on. Detection never fails:
//! anything it cannot make sense of resolves to the configured default scheme.
//!
//! # Detection order
//!
//! 1. A configured fixed scheme (boards that only ever carry one scheme)
//! 2. The board model string, for board families that are always unified
//! 3. The scheme character following `p04_27<` in the manufacturing parameters

use parking_lot::RwLock;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::constants::detection::{MAX_PARAMS_BYTES, SCHEME_CHAR_OFFSET, SCHEME_MARKER};
use crate::data::Scheme;
use crate::error::{Result, TelioError};
use crate::settings::DetectionSettings;

/// Map the scheme character to a scheme
fn scheme_for_char(c: char) -> Option<Scheme> {
    match c {
        '0' => Some(Scheme::Digital9x7),
        '1' => Some(Scheme::DigitalA),
        '2' => Some(Scheme::Mixed6),
        '3' => Some(Scheme::Unified),
        _ => None,
    }
}

/// Extract the scheme from manufacturing-parameter content
///
/// Returns `default` when the marker is missing, the content stops short of
/// the scheme character, or the character is not in the table.
pub fn parse_scheme_marker(content: &str, default: Scheme) -> Scheme {
    let Some(marker_pos) = content.find(SCHEME_MARKER) else {
        warn!(marker = SCHEME_MARKER, "Scheme marker not found, using default {}", default);
        return default;
    };

    let after_marker = &content[marker_pos + SCHEME_MARKER.len()..];
    let Some(scheme_char) = after_marker.chars().nth(SCHEME_CHAR_OFFSET) else {
        warn!("Manufacturing parameters end after scheme marker, using default {}", default);
        return default;
    };

    match scheme_for_char(scheme_char) {
        Some(scheme) => scheme,
        None => {
            warn!(
                value = %scheme_char,
                "Unrecognized scheme character, using default {}",
                default
            );
            default
        }
    }
}

/// Read at most `MAX_PARAMS_BYTES`, replacing invalid UTF-8 so a stray
/// binary byte cannot hide the marker
fn read_limited(path: &Path) -> Result<String> {
    let file = File::open(path).map_err(|e| TelioError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut buf = Vec::new();
    file.take(MAX_PARAMS_BYTES)
        .read_to_end(&mut buf)
        .map_err(|e| TelioError::FileRead {
            path: path.to_path_buf(),
            source: e,
        })?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Check the board model against the board families that are always unified
fn is_unified_board(settings: &DetectionSettings) -> bool {
    let Some(model_path) = &settings.board_model_path else {
        return false;
    };
    if settings.unified_board_models.is_empty() {
        return false;
    }

    match read_limited(model_path) {
        Ok(model) => {
            // device-tree strings are NUL terminated
            let model = model.trim_end_matches('\0').trim();
            let matched = settings
                .unified_board_models
                .iter()
                .any(|known| model.contains(known.as_str()));
            debug!(model = %model, matched, "Checked board model");
            matched
        }
        Err(e) => {
            debug!(error = %e, "Board model unavailable");
            false
        }
    }
}

/// Detect the I/O scheme of this board
///
/// Has no side effects beyond logging and always returns a valid scheme.
pub fn detect_scheme(settings: &DetectionSettings) -> Scheme {
    if let Some(fixed) = settings.fixed_scheme {
        info!(scheme = %fixed, "Using fixed I/O scheme");
        return fixed;
    }

    if is_unified_board(settings) {
        info!(scheme = %Scheme::Unified, "Board model identifies unified I/O scheme");
        return Scheme::Unified;
    }

    let scheme = match read_limited(&settings.mfg_params_path) {
        Ok(content) => parse_scheme_marker(&content, settings.default_scheme),
        Err(e) => {
            warn!(
                error = %e,
                "Manufacturing parameters unreadable, using default {}",
                settings.default_scheme
            );
            settings.default_scheme
        }
    };

    info!(scheme = %scheme, "Detected I/O scheme");
    scheme
}

/// Caches the detected scheme for the life of the process
///
/// The manufacturing parameters cannot change while we run, so detection
/// happens once unless [`SchemeCache::redetect`] is called explicitly.
#[derive(Debug)]
pub struct SchemeCache {
    settings: DetectionSettings,
    scheme: RwLock<Option<Scheme>>,
}

impl SchemeCache {
    pub fn new(settings: DetectionSettings) -> Self {
        Self {
            settings,
            scheme: RwLock::new(None),
        }
    }

    /// Cached scheme, detecting on first use
    pub fn get(&self) -> Scheme {
        if let Some(scheme) = *self.scheme.read() {
            return scheme;
        }

        let mut guard = self.scheme.write();
        *guard.get_or_insert_with(|| detect_scheme(&self.settings))
    }

    /// Run detection again and replace the cached scheme
    pub fn redetect(&self) -> Scheme {
        let scheme = detect_scheme(&self.settings);
        *self.scheme.write() = Some(scheme);
        scheme
    }
}

//! Application Settings
//!
//! Persistent settings stored as JSON, by default in /etc/telio/settings.json

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::{debug, info};

use crate::constants::{paths, thresholds, timing};
use crate::data::{Scheme, Thresholds};
use crate::error::{Result, TelioError};

// ============================================================================
// Cached Settings
// ============================================================================

/// Global cached settings, updated only when settings are saved, primed or invalidated
static SETTINGS_CACHE: OnceLock<RwLock<Option<TelioSettings>>> = OnceLock::new();

fn get_cache() -> &'static RwLock<Option<TelioSettings>> {
    SETTINGS_CACHE.get_or_init(|| RwLock::new(None))
}

/// Get cached settings (no disk I/O after the first call)
/// Falls back to loading from the default location if the cache is empty
pub fn get_cached_settings() -> TelioSettings {
    if let Some(settings) = get_cache().read().as_ref() {
        return settings.clone();
    }

    let settings = load_settings(None).unwrap_or_default();
    *get_cache().write() = Some(settings.clone());
    settings
}

/// Replace the cached settings (used after loading from an explicit path)
pub fn set_cached_settings(settings: &TelioSettings) {
    *get_cache().write() = Some(settings.clone());
}

/// Invalidate the settings cache
pub fn invalidate_settings_cache() {
    *get_cache().write() = None;
}

// ============================================================================
// Settings Types
// ============================================================================

/// Telio settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TelioSettings {
    #[serde(default)]
    pub detection: DetectionSettings,

    #[serde(default)]
    pub sampling: SamplingSettings,

    #[serde(default)]
    pub shutdown: ShutdownSettings,

    #[serde(default)]
    pub output: OutputSettings,
}

/// Scheme detection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionSettings {
    /// Manufacturing-parameter blob carrying the scheme marker
    #[serde(default = "default_mfg_params_path")]
    pub mfg_params_path: PathBuf,

    /// Scheme used whenever detection cannot decide
    #[serde(default)]
    pub default_scheme: Scheme,

    /// Skip detection entirely (boards that only ever carry one scheme)
    #[serde(default)]
    pub fixed_scheme: Option<Scheme>,

    /// File holding the board model string
    #[serde(default)]
    pub board_model_path: Option<PathBuf>,

    /// Board models that always use the unified scheme
    #[serde(default)]
    pub unified_board_models: Vec<String>,
}

/// Sampling settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplingSettings {
    #[serde(default = "default_low_mv")]
    pub low_mv: i32,

    #[serde(default = "default_high_mv")]
    pub high_mv: i32,

    #[serde(default = "default_poll_interval")]
    pub poll_interval_ms: u32,

    /// Directory where the input driver publishes channel files
    #[serde(default = "default_source_path")]
    pub source_path: PathBuf,
}

impl SamplingSettings {
    pub fn thresholds(&self) -> Thresholds {
        Thresholds {
            low_mv: self.low_mv,
            high_mv: self.high_mv,
        }
    }
}

/// Shutdown-window settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShutdownSettings {
    /// Downgrade tri-state ground readings while powering down
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Window length after ignition drops
    #[serde(default = "default_window_ms")]
    pub window_ms: u64,
}

/// Snapshot publishing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    /// Where the latest snapshot is written as JSON (None disables publishing)
    #[serde(default = "default_state_path")]
    pub state_path: Option<PathBuf>,
}

fn default_mfg_params_path() -> PathBuf {
    PathBuf::from(paths::MFG_PARAMS)
}

fn default_low_mv() -> i32 {
    thresholds::DEFAULT_LOW_MV
}

fn default_high_mv() -> i32 {
    thresholds::DEFAULT_HIGH_MV
}

fn default_poll_interval() -> u32 {
    timing::DEFAULT_POLL_INTERVAL_MS
}

fn default_source_path() -> PathBuf {
    PathBuf::from(paths::CHANNEL_SOURCE)
}

fn default_true() -> bool {
    true
}

fn default_window_ms() -> u64 {
    timing::DEFAULT_SHUTDOWN_WINDOW_MS
}

fn default_state_path() -> Option<PathBuf> {
    Some(PathBuf::from(paths::STATE_FILE))
}

impl Default for DetectionSettings {
    fn default() -> Self {
        Self {
            mfg_params_path: default_mfg_params_path(),
            default_scheme: Scheme::default(),
            fixed_scheme: None,
            board_model_path: None,
            unified_board_models: Vec::new(),
        }
    }
}

impl Default for SamplingSettings {
    fn default() -> Self {
        Self {
            low_mv: default_low_mv(),
            high_mv: default_high_mv(),
            poll_interval_ms: default_poll_interval(),
            source_path: default_source_path(),
        }
    }
}

impl Default for ShutdownSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            window_ms: default_window_ms(),
        }
    }
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            state_path: default_state_path(),
        }
    }
}

// ============================================================================
// Load / Save
// ============================================================================

/// Resolve which settings file to use
///
/// Order: explicit path, `$TELIO_CONFIG`, /etc/telio/settings.json if present,
/// then the user config directory.
pub fn get_settings_path(explicit: Option<&Path>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path.to_path_buf());
    }

    if let Ok(env_path) = std::env::var(paths::CONFIG_ENV) {
        if !env_path.trim().is_empty() {
            return Ok(PathBuf::from(env_path));
        }
    }

    let system_path = Path::new(paths::CONFIG_DIR).join(paths::SETTINGS_FILE);
    if system_path.exists() {
        return Ok(system_path);
    }

    paths::user_config_dir()
        .map(|dir| dir.join(paths::SETTINGS_FILE))
        .ok_or_else(|| TelioError::config("Could not determine config directory"))
}

/// Load settings, returning defaults when no settings file exists
pub fn load_settings(explicit: Option<&Path>) -> Result<TelioSettings> {
    let path = get_settings_path(explicit)?;
    load_settings_from(&path)
}

/// Load settings from a specific file
pub fn load_settings_from(path: &Path) -> Result<TelioSettings> {
    if !path.exists() {
        debug!("No settings file at {:?}, using defaults", path);
        return Ok(TelioSettings::default());
    }

    let content = fs::read_to_string(path).map_err(|e| TelioError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    let settings: TelioSettings = serde_json::from_str(&content).map_err(|e| {
        TelioError::config(format!("Failed to parse settings JSON {:?}: {}", path, e))
    })?;

    info!("Loaded settings from {:?}", path);
    Ok(settings)
}

/// Save settings to a file
/// Uses atomic write (temp file + rename) to prevent corruption on crash
pub fn save_settings_to(path: &Path, settings: &TelioSettings) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }

    let json = serde_json::to_string_pretty(settings)?;
    write_atomic(path, json.as_bytes())?;

    set_cached_settings(settings);
    debug!("Saved settings to {:?}", path);
    Ok(())
}

/// Write a file via temp file + fsync + rename
pub fn write_atomic(path: &Path, contents: &[u8]) -> Result<()> {
    let temp_path = path.with_extension("tmp");

    let mut file = fs::File::create(&temp_path).map_err(|e| TelioError::FileWrite {
        path: temp_path.clone(),
        source: e,
    })?;

    file.write_all(contents).map_err(|e| TelioError::FileWrite {
        path: temp_path.clone(),
        source: e,
    })?;

    file.sync_all().map_err(|e| TelioError::FileWrite {
        path: temp_path.clone(),
        source: e,
    })?;

    drop(file);

    fs::rename(&temp_path, path).map_err(|e| TelioError::FileWrite {
        path: path.to_path_buf(),
        source: e,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let settings = load_settings_from(&dir.path().join("absent.json")).unwrap();
        assert_eq!(settings.sampling.low_mv, thresholds::DEFAULT_LOW_MV);
        assert_eq!(settings.detection.default_scheme, Scheme::None);
        assert!(settings.shutdown.enabled);
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(
            &path,
            r#"{ "detection": { "default_scheme": "mixed6" }, "sampling": { "high_mv": 9000 } }"#,
        )
        .unwrap();

        let settings = load_settings_from(&path).unwrap();
        assert_eq!(settings.detection.default_scheme, Scheme::Mixed6);
        assert_eq!(settings.sampling.high_mv, 9000);
        assert_eq!(settings.sampling.low_mv, thresholds::DEFAULT_LOW_MV);
        assert_eq!(
            settings.detection.mfg_params_path,
            PathBuf::from(paths::MFG_PARAMS)
        );
        assert_eq!(
            settings.output.state_path,
            Some(PathBuf::from(paths::STATE_FILE))
        );
    }

    #[test]
    fn test_garbage_file_is_config_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{ not json").unwrap();
        assert!(matches!(
            load_settings_from(&path),
            Err(TelioError::Config(_))
        ));
    }

    #[test]
    fn test_explicit_path_wins() {
        let path = PathBuf::from("/opt/telio/custom.json");
        assert_eq!(get_settings_path(Some(&path)).unwrap(), path);
    }

    #[test]
    #[serial]
    fn test_save_roundtrip_updates_cache() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut settings = TelioSettings::default();
        settings.detection.fixed_scheme = Some(Scheme::Unified);
        settings.sampling.poll_interval_ms = 250;
        save_settings_to(&path, &settings).unwrap();

        assert!(!path.with_extension("tmp").exists());
        let loaded = load_settings_from(&path).unwrap();
        assert_eq!(loaded.detection.fixed_scheme, Some(Scheme::Unified));
        assert_eq!(loaded.sampling.poll_interval_ms, 250);

        assert_eq!(get_cached_settings().sampling.poll_interval_ms, 250);
        invalidate_settings_cache();
    }

    #[test]
    #[serial]
    fn test_set_cached_settings() {
        let mut settings = TelioSettings::default();
        settings.shutdown.window_ms = 1234;
        set_cached_settings(&settings);
        assert_eq!(get_cached_settings().shutdown.window_ms, 1234);
        invalidate_settings_cache();
    }
}

//! Configuration validation
//!
//! Checks values read from the settings file before the sampler uses them.

use std::path::Path;

use crate::constants::timing;
use crate::data::types::Thresholds;
use crate::error::{Result, TelioError};
use crate::settings::TelioSettings;

/// Validates analog thresholds: both positive and strictly ordered
pub fn validate_thresholds(thresholds: &Thresholds) -> Result<Thresholds> {
    if thresholds.low_mv <= 0 || thresholds.low_mv >= thresholds.high_mv {
        return Err(TelioError::InvalidThresholds {
            low_mv: thresholds.low_mv,
            high_mv: thresholds.high_mv,
        });
    }
    Ok(*thresholds)
}

/// Validates the sampling period
pub fn validate_poll_interval(interval_ms: u32) -> Result<u32> {
    if !(timing::MIN_POLL_INTERVAL_MS..=timing::MAX_POLL_INTERVAL_MS).contains(&interval_ms) {
        return Err(TelioError::invalid_config(
            "sampling.poll_interval_ms",
            format!(
                "{} is outside {}..={}",
                interval_ms,
                timing::MIN_POLL_INTERVAL_MS,
                timing::MAX_POLL_INTERVAL_MS
            ),
        ));
    }
    Ok(interval_ms)
}

fn validate_absolute(field: &str, path: &Path) -> Result<()> {
    if !path.is_absolute() {
        return Err(TelioError::invalid_config(
            field,
            format!("{} must be an absolute path", path.display()),
        ));
    }
    Ok(())
}

/// Validates a whole settings document
pub fn validate_settings(settings: &TelioSettings) -> Result<()> {
    validate_thresholds(&settings.sampling.thresholds())?;
    validate_poll_interval(settings.sampling.poll_interval_ms)?;

    validate_absolute("detection.mfg_params_path", &settings.detection.mfg_params_path)?;
    if let Some(model_path) = &settings.detection.board_model_path {
        validate_absolute("detection.board_model_path", model_path)?;
    }
    validate_absolute("sampling.source_path", &settings.sampling.source_path)?;
    if let Some(state_path) = &settings.output.state_path {
        validate_absolute("output.state_path", state_path)?;
    }

    if settings
        .detection
        .unified_board_models
        .iter()
        .any(|model| model.trim().is_empty())
    {
        return Err(TelioError::invalid_config(
            "detection.unified_board_models",
            "model names cannot be empty",
        ));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_default_thresholds_are_valid() {
        assert!(validate_thresholds(&Thresholds::default()).is_ok());
    }

    #[test]
    fn test_inverted_thresholds_rejected() {
        let bad = Thresholds {
            low_mv: 10000,
            high_mv: 2500,
        };
        assert!(matches!(
            validate_thresholds(&bad),
            Err(TelioError::InvalidThresholds { .. })
        ));

        let equal = Thresholds {
            low_mv: 5000,
            high_mv: 5000,
        };
        assert!(validate_thresholds(&equal).is_err());
    }

    #[test]
    fn test_non_positive_low_rejected() {
        let bad = Thresholds {
            low_mv: 0,
            high_mv: 2500,
        };
        assert!(validate_thresholds(&bad).is_err());
    }

    #[test]
    fn test_poll_interval_bounds() {
        assert!(validate_poll_interval(timing::MIN_POLL_INTERVAL_MS).is_ok());
        assert!(validate_poll_interval(timing::MAX_POLL_INTERVAL_MS).is_ok());
        assert!(validate_poll_interval(10).is_err());
        assert!(validate_poll_interval(120_000).is_err());
    }

    #[test]
    fn test_default_settings_are_valid() {
        assert!(validate_settings(&TelioSettings::default()).is_ok());
    }

    #[test]
    fn test_relative_source_path_rejected() {
        let mut settings = TelioSettings::default();
        settings.sampling.source_path = PathBuf::from("relative/inputs");
        assert!(matches!(
            validate_settings(&settings),
            Err(TelioError::InvalidConfig { .. })
        ));
    }

    #[test]
    fn test_empty_board_model_rejected() {
        let mut settings = TelioSettings::default();
        settings.detection.unified_board_models = vec!["  ".to_string()];
        assert!(validate_settings(&settings).is_err());
    }
}

use std::fmt;

use thiserror::Error;
use vidsync_model::PlayerConfig;

/// Hard failures: a player built from this config would misbehave.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigGuardRailError {
    #[error("{field} must be a finite number of seconds greater than zero (got {value})")]
    NonPositiveDuration { field: &'static str, value: f64 },
    #[error("default_url must use http or https (got {scheme})")]
    UnsupportedDefaultUrl { scheme: String },
}

/// Suspicious but workable settings.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigWarning {
    ThresholdNotBelowFrequency { threshold: f64, frequency: f64 },
    AggressiveRetry { retry_timeout: f64 },
}

impl fmt::Display for ConfigWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigWarning::ThresholdNotBelowFrequency {
                threshold,
                frequency,
            } => write!(
                f,
                "sync_threshold_secs ({threshold}) is not below sync_frequency_secs ({frequency}); drift may accumulate between checks"
            ),
            ConfigWarning::AggressiveRetry { retry_timeout } => write!(
                f,
                "retry_timeout_secs ({retry_timeout}) is under one second; failing sources will be hammered"
            ),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigWarnings {
    pub items: Vec<ConfigWarning>,
}

impl ConfigWarnings {
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ConfigWarning> {
        self.items.iter()
    }
}

fn require_positive(
    field: &'static str,
    value: f64,
) -> Result<(), ConfigGuardRailError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigGuardRailError::NonPositiveDuration { field, value })
    }
}

/// Check guard rails and collect warnings for a loaded config.
pub fn validate(
    config: &PlayerConfig,
) -> Result<ConfigWarnings, ConfigGuardRailError> {
    require_positive("retry_timeout_secs", config.retry_timeout_secs)?;
    require_positive("sync_frequency_secs", config.sync_frequency_secs)?;
    require_positive("sync_threshold_secs", config.sync_threshold_secs)?;

    if let Some(url) = &config.default_url
        && !matches!(url.scheme(), "http" | "https")
    {
        return Err(ConfigGuardRailError::UnsupportedDefaultUrl {
            scheme: url.scheme().to_string(),
        });
    }

    let mut warnings = ConfigWarnings::default();
    if config.sync_threshold_secs >= config.sync_frequency_secs {
        warnings.items.push(ConfigWarning::ThresholdNotBelowFrequency {
            threshold: config.sync_threshold_secs,
            frequency: config.sync_frequency_secs,
        });
    }
    if config.retry_timeout_secs < 1.0 {
        warnings.items.push(ConfigWarning::AggressiveRetry {
            retry_timeout: config.retry_timeout_secs,
        });
    }

    Ok(warnings)
}

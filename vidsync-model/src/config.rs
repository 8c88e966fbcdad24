//! Player configuration shared by the config loader, the core and tooling.

use url::Url;

pub const DEFAULT_RETRY_TIMEOUT_SECS: f64 = 6.0;
pub const DEFAULT_SYNC_FREQUENCY_SECS: f64 = 5.0;
pub const DEFAULT_SYNC_THRESHOLD_SECS: f64 = 1.0;

/// Tunables for one synchronized player.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct PlayerConfig {
    /// Played by the owner when the session starts.
    pub default_url: Option<Url>,
    /// Lock state the owner publishes when the session starts.
    pub default_locked: bool,
    /// Whether the owner retries a failed load instead of stopping the session.
    /// Non-owners always retry.
    pub retry_on_error: bool,
    /// Delay before a failed load is retried.
    pub retry_timeout_secs: f64,
    /// Interval between drift checks.
    pub sync_frequency_secs: f64,
    /// Drift tolerated before a corrective seek is issued. Kept coarse so
    /// clock jitter between peers does not cause seek thrashing.
    pub sync_threshold_secs: f64,
    pub debug_logging: bool,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            default_url: None,
            default_locked: false,
            retry_on_error: true,
            retry_timeout_secs: DEFAULT_RETRY_TIMEOUT_SECS,
            sync_frequency_secs: DEFAULT_SYNC_FREQUENCY_SECS,
            sync_threshold_secs: DEFAULT_SYNC_THRESHOLD_SECS,
            debug_logging: true,
        }
    }
}

impl PlayerConfig {
    pub fn with_default_url(mut self, url: Url) -> Self {
        self.default_url = Some(url);
        self
    }

    pub fn with_retry_on_error(mut self, retry: bool) -> Self {
        self.retry_on_error = retry;
        self
    }

    pub fn with_default_locked(mut self, locked: bool) -> Self {
        self.default_locked = locked;
        self
    }
}

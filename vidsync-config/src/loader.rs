use std::{
    fs,
    path::{Path, PathBuf},
};

use tracing::{debug, warn};
use vidsync_model::PlayerConfig;

use crate::{
    error::ConfigLoadError,
    validation::{ConfigWarnings, validate},
};

/// Path to a TOML or JSON player config.
pub const CONFIG_PATH_ENV: &str = "VIDSYNC_CONFIG_PATH";
/// Inline JSON player config.
pub const CONFIG_JSON_ENV: &str = "VIDSYNC_CONFIG_JSON";

const CANDIDATES: &[&str] = &[
    "vidsync.toml",
    "vidsync.json",
    "config/vidsync.toml",
    "config/vidsync.json",
];

/// Source that produced the player configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ConfigSource {
    #[default]
    Default,
    EnvPath(PathBuf),
    EnvInline,
    File(PathBuf),
}

/// A validated config together with where it came from.
#[derive(Debug, Clone)]
pub struct ConfigLoad {
    pub config: PlayerConfig,
    pub source: ConfigSource,
    pub warnings: ConfigWarnings,
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String>>;

/// Resolves a [`PlayerConfig`] from the environment and well-known files.
///
/// Evaluation order:
/// 1) `$VIDSYNC_CONFIG_PATH` (TOML or JSON file),
/// 2) `$VIDSYNC_CONFIG_JSON` (inline JSON),
/// 3) the first existing candidate file under the base directory,
/// 4) defaults.
pub struct ConfigLoader {
    env: EnvLookup,
    base_dir: PathBuf,
}

impl std::fmt::Debug for ConfigLoader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigLoader")
            .field("base_dir", &self.base_dir)
            .finish_non_exhaustive()
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Loader reading the process environment relative to the working directory.
    pub fn new() -> Self {
        Self {
            env: Box::new(|key| std::env::var(key).ok()),
            base_dir: PathBuf::from("."),
        }
    }

    /// Replace the environment lookup (primarily for tests).
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    pub fn with_base_dir(mut self, base_dir: impl Into<PathBuf>) -> Self {
        self.base_dir = base_dir.into();
        self
    }

    fn var(&self, key: &str) -> Option<String> {
        (self.env)(key).filter(|value| !value.trim().is_empty())
    }

    pub fn load(&self) -> Result<ConfigLoad, ConfigLoadError> {
        let (config, source) = self.resolve()?;
        let warnings = validate(&config)?;
        for warning in warnings.iter() {
            warn!(%warning, "player config warning");
        }
        debug!(?source, "player config loaded");

        Ok(ConfigLoad {
            config,
            source,
            warnings,
        })
    }

    fn resolve(&self) -> Result<(PlayerConfig, ConfigSource), ConfigLoadError> {
        if let Some(path_str) = self.var(CONFIG_PATH_ENV) {
            let path = PathBuf::from(path_str);
            let config = load_from_file(&path)?;
            return Ok((config, ConfigSource::EnvPath(path)));
        }

        if let Some(raw) = self.var(CONFIG_JSON_ENV) {
            let config = parse_json(&raw, CONFIG_JSON_ENV)?;
            return Ok((config, ConfigSource::EnvInline));
        }

        if let Some(path) = self.find_default_file() {
            let config = load_from_file(&path)?;
            return Ok((config, ConfigSource::File(path)));
        }

        Ok((PlayerConfig::default(), ConfigSource::Default))
    }

    fn find_default_file(&self) -> Option<PathBuf> {
        CANDIDATES
            .iter()
            .map(|candidate| self.base_dir.join(candidate))
            .find(|path| path.exists())
    }
}

/// Load and validate a config file; the extension picks the format.
///
/// ```
/// use vidsync_config::{ConfigSource, load_path};
///
/// let dir = tempfile::tempdir()?;
/// let path = dir.path().join("vidsync.toml");
/// std::fs::write(&path, "sync_threshold_secs = 2.0\n")?;
///
/// let load = load_path(&path)?;
/// assert_eq!(load.config.sync_threshold_secs, 2.0);
/// assert_eq!(load.source, ConfigSource::File(path));
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn load_path(path: &Path) -> Result<ConfigLoad, ConfigLoadError> {
    let config = load_from_file(path)?;
    let warnings = validate(&config)?;
    Ok(ConfigLoad {
        config,
        source: ConfigSource::File(path.to_path_buf()),
        warnings,
    })
}

pub fn load_from_file(path: &Path) -> Result<PlayerConfig, ConfigLoadError> {
    let contents =
        fs::read_to_string(path).map_err(|source| ConfigLoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    let origin = path.display().to_string();

    match path.extension().and_then(|ext| ext.to_str()) {
        Some("json") => parse_json(&contents, &origin),
        Some("toml") | Some("tml") => toml::from_str(&contents)
            .map_err(|source| ConfigLoadError::Toml { origin, source }),
        _ => parse_from_str(&contents, &origin),
    }
}

/// Try TOML first, then JSON for convenience.
pub fn parse_from_str(
    contents: &str,
    origin: &str,
) -> Result<PlayerConfig, ConfigLoadError> {
    toml::from_str(contents).or_else(|toml_err| {
        serde_json::from_str(contents).map_err(|json_err| {
            ConfigLoadError::Unrecognized {
                origin: origin.to_string(),
                toml: toml_err.to_string(),
                json: json_err.to_string(),
            }
        })
    })
}

pub fn parse_json(
    raw: &str,
    origin: &str,
) -> Result<PlayerConfig, ConfigLoadError> {
    serde_json::from_str(raw).map_err(|source| ConfigLoadError::Json {
        origin: origin.to_string(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env_of(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + 'static {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_configured() {
        let dir = tempfile::tempdir().unwrap();
        let load = ConfigLoader::new()
            .with_env(env_of(&[]))
            .with_base_dir(dir.path())
            .load()
            .unwrap();

        assert_eq!(load.source, ConfigSource::Default);
        assert_eq!(load.config, PlayerConfig::default());
    }

    #[test]
    fn env_path_wins_over_inline_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.toml");
        fs::write(
            &path,
            "retry_on_error = false\nsync_threshold_secs = 0.5\ndefault_url = \"https://youtu.be/abc?t=30\"\n",
        )
        .unwrap();
        let path_str = path.display().to_string();

        let load = ConfigLoader::new()
            .with_env(env_of(&[
                (CONFIG_PATH_ENV, path_str.as_str()),
                (CONFIG_JSON_ENV, r#"{"retry_on_error": true}"#),
            ]))
            .with_base_dir(dir.path())
            .load()
            .unwrap();

        assert_eq!(load.source, ConfigSource::EnvPath(path));
        assert!(!load.config.retry_on_error);
        assert_eq!(load.config.sync_threshold_secs, 0.5);
        assert_eq!(load.config.sync_frequency_secs, 5.0);
        assert_eq!(
            load.config.default_url.as_ref().map(|u| u.as_str()),
            Some("https://youtu.be/abc?t=30")
        );
    }

    #[test]
    fn inline_json_is_used_when_no_path() {
        let dir = tempfile::tempdir().unwrap();
        let load = ConfigLoader::new()
            .with_env(env_of(&[(
                CONFIG_JSON_ENV,
                r#"{"default_locked": true, "retry_timeout_secs": 2.5}"#,
            )]))
            .with_base_dir(dir.path())
            .load()
            .unwrap();

        assert_eq!(load.source, ConfigSource::EnvInline);
        assert!(load.config.default_locked);
        assert_eq!(load.config.retry_timeout_secs, 2.5);
    }

    #[test]
    fn candidate_file_is_discovered() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir_all(dir.path().join("config")).unwrap();
        let path = dir.path().join("config/vidsync.json");
        fs::write(&path, r#"{"debug_logging": false}"#).unwrap();

        let load = ConfigLoader::new()
            .with_env(env_of(&[]))
            .with_base_dir(dir.path())
            .load()
            .unwrap();

        assert_eq!(load.source, ConfigSource::File(path));
        assert!(!load.config.debug_logging);
    }

    #[test]
    fn guard_rails_reject_loaded_config() {
        let dir = tempfile::tempdir().unwrap();
        let err = ConfigLoader::new()
            .with_env(env_of(&[(CONFIG_JSON_ENV, r#"{"sync_frequency_secs": -1}"#)]))
            .with_base_dir(dir.path())
            .load()
            .unwrap_err();

        assert!(matches!(err, ConfigLoadError::GuardRail(_)));
    }

    #[test]
    fn extensionless_file_falls_back_to_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player");
        fs::write(&path, r#"{"sync_frequency_secs": 10}"#).unwrap();

        let config = load_from_file(&path).unwrap();
        assert_eq!(config.sync_frequency_secs, 10.0);
    }

    #[test]
    fn garbage_reports_both_parsers() {
        let err = parse_from_str("{{ not config", "inline").unwrap_err();
        assert!(matches!(err, ConfigLoadError::Unrecognized { .. }));
    }
}

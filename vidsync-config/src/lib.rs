//! Shared configuration library for vidsync.
//!
//! This crate centralizes player config loading (environment, inline JSON and
//! candidate files) and the guard rails applied before a player is built. The
//! `vidsyncctl` binary re-exports these utilities so there is a single source
//! of truth for config defaults and validation rules.

pub mod error;
pub mod loader;
pub mod validation;

pub use error::ConfigLoadError;
pub use loader::{
    CONFIG_JSON_ENV, CONFIG_PATH_ENV, ConfigLoad, ConfigLoader, ConfigSource,
    load_path,
};
pub use validation::{ConfigGuardRailError, ConfigWarning, ConfigWarnings};
pub use vidsync_model::PlayerConfig;

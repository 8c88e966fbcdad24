//! Core data model definitions shared across vidsync crates.
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod generation;
pub mod peer;
pub mod player_state;
pub mod prelude;
pub mod record;

// Intentionally curated re-exports for downstream consumers.
pub use config::PlayerConfig;
pub use error::{ModelError, Result as ModelResult, parse_media_url};
pub use generation::Generation;
pub use peer::{PeerId, PeerIdentity, PeerRole};
pub use player_state::{PlayerState, ScreenMode, SourceKind, VideoErrorCode};
pub use record::{PlaybackRecord, StartTime};

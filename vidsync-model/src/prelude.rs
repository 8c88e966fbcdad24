//! Frequently used model types for the core and tooling crates.

pub use crate::config::PlayerConfig;
pub use crate::error::{ModelError, parse_media_url};
pub use crate::generation::Generation;
pub use crate::peer::{PeerId, PeerIdentity, PeerRole};
pub use crate::player_state::{PlayerState, ScreenMode, SourceKind, VideoErrorCode};
pub use crate::record::{PlaybackRecord, StartTime};
pub use url::Url;

use std::fmt;

/// Local playback state of one peer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum PlayerState {
    #[default]
    Stopped,
    Loading,
    Playing,
    Error,
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PlayerState::Stopped => "stopped",
            PlayerState::Loading => "loading",
            PlayerState::Playing => "playing",
            PlayerState::Error => "error",
        };
        f.write_str(label)
    }
}

/// Error codes reported by the media backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum VideoErrorCode {
    Unknown,
    InvalidUrl,
    AccessDenied,
    PlayerError,
    RateLimited,
}

impl fmt::Display for VideoErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            VideoErrorCode::Unknown => "unknown",
            VideoErrorCode::InvalidUrl => "invalid url",
            VideoErrorCode::AccessDenied => "access denied",
            VideoErrorCode::PlayerError => "player error",
            VideoErrorCode::RateLimited => "rate limited",
        };
        f.write_str(label)
    }
}

/// What the screen sink should display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ScreenMode {
    Normal,
    Logo,
    Loading,
    Error,
}

/// Which decoder family feeds the screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum SourceKind {
    /// File-oriented decoder.
    Video,
    /// Streaming-capable decoder; the default backend.
    #[default]
    Stream,
}

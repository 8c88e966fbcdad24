use thiserror::Error;
use vidsync_contracts::replication::TransportError;
use vidsync_model::ModelError;

use crate::access::ControlAction;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("control denied for {action}")]
    ControlDenied { action: ControlAction },

    #[error("playback record is owned by another peer")]
    NotOwner,

    #[error("media url is empty")]
    EmptyUrl,

    #[error("invalid media url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("unsupported media url: {0}")]
    UnsupportedUrl(String),

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
}

impl From<ModelError> for SyncError {
    fn from(err: ModelError) -> Self {
        match err {
            ModelError::EmptyUrl => SyncError::EmptyUrl,
            ModelError::InvalidUrl(parse) => SyncError::InvalidUrl(parse),
            ModelError::UnsupportedScheme(scheme) => {
                SyncError::UnsupportedUrl(scheme)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, SyncError>;

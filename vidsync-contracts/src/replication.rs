use thiserror::Error;
use vidsync_model::PlaybackRecord;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    #[error("only the owner may publish the playback record")]
    NotOwner,
    #[error("publish rejected: {0}")]
    Rejected(String),
}

/// Best-effort replication of the playback record between peers.
///
/// Delivery of a published record is reported on the other peers through
/// the embedder calling `SyncPlayer::on_record_changed`.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait ReplicationTransport: Send {
    /// Whether the local peer currently owns the record.
    fn is_owner(&self) -> bool;

    /// Take ownership. Atomic and totally ordered by the transport; after it
    /// returns the local peer is the sole writer.
    fn acquire_ownership(&mut self);

    /// Replicate `record` to every other peer.
    fn publish(&mut self, record: &PlaybackRecord) -> Result<(), TransportError>;
}

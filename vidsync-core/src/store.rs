//! Local copy of the replicated playback record with single-writer edits.
//!
//! Mutating the record requires an [`OwnershipToken`], which can only be
//! minted from a transport that reports local ownership. Remote snapshots
//! replace the local copy wholesale.

use tracing::debug;
use url::Url;
use vidsync_contracts::replication::ReplicationTransport;
use vidsync_model::{Generation, PlaybackRecord, StartTime};

use crate::error::{Result, SyncError};

/// Proof that the local peer held ownership when the token was minted.
///
/// Tokens are not stored; mint one per edit.
#[derive(Debug)]
pub struct OwnershipToken(());

impl OwnershipToken {
    pub fn from_transport<T>(transport: &T) -> Result<Self>
    where
        T: ReplicationTransport + ?Sized,
    {
        if transport.is_owner() {
            Ok(OwnershipToken(()))
        } else {
            Err(SyncError::NotOwner)
        }
    }

    #[cfg(test)]
    pub(crate) fn for_tests() -> Self {
        OwnershipToken(())
    }
}

/// Owner-side mutations of the replicated record.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordChange {
    /// Commit a new media load under `generation`.
    NewMedia { url: Url, generation: Generation },
    /// The owner's backend confirmed playback; position 0 maps to `start_time`.
    OwnerStarted { start_time: f64 },
    /// Playback ended or failed without retry.
    OwnerStopped,
    /// Explicit stop: no media.
    Cleared,
    /// Seek: position 0 now maps to this network time.
    StartTime(f64),
    Locked(bool),
}

impl RecordChange {
    fn apply_to(self, record: &mut PlaybackRecord) {
        match self {
            RecordChange::NewMedia { url, generation } => {
                record.commit_media(url, generation);
            }
            RecordChange::OwnerStarted { start_time } => {
                record.mark_owner_started(start_time);
            }
            RecordChange::OwnerStopped => record.mark_owner_stopped(),
            RecordChange::Cleared => record.clear(),
            RecordChange::StartTime(start) => {
                record.start_time = StartTime::At(start);
            }
            RecordChange::Locked(locked) => record.locked = locked,
        }
    }
}

#[derive(Debug, Default)]
pub struct RecordStore {
    record: PlaybackRecord,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current(&self) -> &PlaybackRecord {
        &self.record
    }

    /// Apply an owner-side change. Returns whether the record changed.
    pub fn edit(&mut self, _token: &OwnershipToken, change: RecordChange) -> bool {
        let before = self.record.clone();
        change.apply_to(&mut self.record);
        before != self.record
    }

    /// Replace the local copy with a snapshot delivered by the transport.
    pub fn apply_remote(&mut self, record: PlaybackRecord) {
        if record.generation < self.record.generation {
            debug!(
                incoming = %record.generation,
                local = %self.record.generation,
                "replicated record carries an older generation"
            );
        }
        self.record = record;
    }
}

use std::{
    collections::{HashMap, HashSet},
    sync::Arc,
};

use parking_lot::Mutex;
use tracing::debug;
use vidsync_contracts::replication::{ReplicationTransport, TransportError};
use vidsync_model::{PeerId, PlaybackRecord};

#[derive(Debug, Default)]
struct HubState {
    owner: Option<PeerId>,
    peers: Vec<PeerId>,
    /// Latest undelivered record per peer. Newer publishes overwrite older
    /// ones, like snapshot replication does.
    pending: HashMap<PeerId, PlaybackRecord>,
    latest: Option<PlaybackRecord>,
    offline: HashSet<PeerId>,
    reject_next: Option<String>,
    publish_count: u64,
}

/// In-process replication fabric.
///
/// The first peer to join owns the record. Ownership moves atomically on
/// [`acquire_ownership`](ReplicationTransport::acquire_ownership); published
/// records queue for every other online peer until the embedder drains them
/// with [`take_pending`](Self::take_pending).
#[derive(Debug, Clone, Default)]
pub struct LoopbackHub {
    state: Arc<Mutex<HubState>>,
}

impl LoopbackHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn join(&self, peer: PeerId) -> LoopbackTransport {
        let mut state = self.state.lock();
        if state.owner.is_none() {
            state.owner = Some(peer);
        }
        if !state.peers.contains(&peer) {
            state.peers.push(peer);
        }
        // Late joiners see the current record.
        if let Some(latest) = state.latest.clone()
            && state.owner != Some(peer)
        {
            state.pending.insert(peer, latest);
        }

        LoopbackTransport {
            peer,
            hub: self.clone(),
        }
    }

    pub fn owner(&self) -> Option<PeerId> {
        self.state.lock().owner
    }

    pub fn latest(&self) -> Option<PlaybackRecord> {
        self.state.lock().latest.clone()
    }

    pub fn publish_count(&self) -> u64 {
        self.state.lock().publish_count
    }

    pub fn take_pending(&self, peer: PeerId) -> Option<PlaybackRecord> {
        self.state.lock().pending.remove(&peer)
    }

    pub fn has_pending(&self, peer: PeerId) -> bool {
        self.state.lock().pending.contains_key(&peer)
    }

    /// Queue the latest record for `peer` again.
    pub fn redeliver(&self, peer: PeerId) {
        let mut state = self.state.lock();
        if let Some(latest) = state.latest.clone() {
            state.pending.insert(peer, latest);
        }
    }

    /// Drop whatever is queued for `peer`, as if the update was lost.
    pub fn discard_pending(&self, peer: PeerId) {
        self.state.lock().pending.remove(&peer);
    }

    /// While offline, publishes skip `peer` entirely.
    pub fn set_offline(&self, peer: PeerId, offline: bool) {
        let mut state = self.state.lock();
        if offline {
            state.offline.insert(peer);
            state.pending.remove(&peer);
        } else {
            state.offline.remove(&peer);
        }
    }

    /// Fail the next publish with [`TransportError::Rejected`].
    pub fn reject_next_publish(&self, reason: impl Into<String>) {
        self.state.lock().reject_next = Some(reason.into());
    }
}

/// One peer's endpoint on a [`LoopbackHub`].
#[derive(Debug, Clone)]
pub struct LoopbackTransport {
    peer: PeerId,
    hub: LoopbackHub,
}

impl LoopbackTransport {
    pub fn peer(&self) -> PeerId {
        self.peer
    }

    pub fn hub(&self) -> &LoopbackHub {
        &self.hub
    }
}

impl ReplicationTransport for LoopbackTransport {
    fn is_owner(&self) -> bool {
        self.hub.state.lock().owner == Some(self.peer)
    }

    fn acquire_ownership(&mut self) {
        let mut state = self.hub.state.lock();
        debug!(from = ?state.owner, to = %self.peer, "ownership transferred");
        state.owner = Some(self.peer);
    }

    fn publish(&mut self, record: &PlaybackRecord) -> Result<(), TransportError> {
        let mut state = self.hub.state.lock();
        if state.owner != Some(self.peer) {
            return Err(TransportError::NotOwner);
        }
        if let Some(reason) = state.reject_next.take() {
            return Err(TransportError::Rejected(reason));
        }

        state.publish_count += 1;
        state.latest = Some(record.clone());
        let targets: Vec<PeerId> = state
            .peers
            .iter()
            .copied()
            .filter(|peer| *peer != self.peer && !state.offline.contains(peer))
            .collect();
        for peer in targets {
            state.pending.insert(peer, record.clone());
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidsync_model::Generation;

    fn record(generation: u64) -> PlaybackRecord {
        PlaybackRecord {
            generation: Generation::new(generation),
            ..PlaybackRecord::default()
        }
    }

    #[test]
    fn first_joiner_owns_and_only_owner_publishes() {
        let hub = LoopbackHub::new();
        let (a, b) = (PeerId::new(), PeerId::new());
        let mut owner = hub.join(a);
        let mut follower = hub.join(b);

        assert!(owner.is_owner());
        assert!(!follower.is_owner());
        assert_eq!(follower.publish(&record(1)), Err(TransportError::NotOwner));

        owner.publish(&record(1)).unwrap();
        assert_eq!(hub.take_pending(b), Some(record(1)));
        assert_eq!(hub.take_pending(a), None);
    }

    #[test]
    fn newer_publish_overwrites_undelivered_record() {
        let hub = LoopbackHub::new();
        let (a, b) = (PeerId::new(), PeerId::new());
        let mut owner = hub.join(a);
        hub.join(b);

        owner.publish(&record(1)).unwrap();
        owner.publish(&record(2)).unwrap();

        assert_eq!(hub.take_pending(b), Some(record(2)));
        assert!(!hub.has_pending(b));
        assert_eq!(hub.publish_count(), 2);
    }

    #[test]
    fn acquiring_moves_the_single_writer() {
        let hub = LoopbackHub::new();
        let (a, b) = (PeerId::new(), PeerId::new());
        let mut first = hub.join(a);
        let mut second = hub.join(b);

        second.acquire_ownership();

        assert!(!first.is_owner());
        assert_eq!(first.publish(&record(3)), Err(TransportError::NotOwner));
        second.publish(&record(3)).unwrap();
        assert_eq!(hub.take_pending(a), Some(record(3)));
    }

    #[test]
    fn offline_peers_miss_updates_and_late_joiners_catch_up() {
        let hub = LoopbackHub::new();
        let (a, b, c) = (PeerId::new(), PeerId::new(), PeerId::new());
        let mut owner = hub.join(a);
        hub.join(b);
        hub.set_offline(b, true);

        owner.publish(&record(4)).unwrap();
        assert!(!hub.has_pending(b));

        hub.join(c);
        assert_eq!(hub.take_pending(c), Some(record(4)));

        hub.set_offline(b, false);
        hub.redeliver(b);
        assert_eq!(hub.take_pending(b), Some(record(4)));
    }

    #[test]
    fn rejected_publish_is_reported_once() {
        let hub = LoopbackHub::new();
        let mut owner = hub.join(PeerId::new());
        hub.reject_next_publish("quota");

        assert_eq!(
            owner.publish(&record(1)),
            Err(TransportError::Rejected("quota".into()))
        );
        assert!(owner.publish(&record(1)).is_ok());
    }
}

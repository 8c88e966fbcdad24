//! In-memory collaborators for running several peers in one process.
//!
//! Used by the integration tests and by `vidsyncctl simulate`.

mod backend;
mod clock;
mod sink;
mod transport;

pub use backend::ScriptedBackend;
pub use clock::ManualClock;
pub use sink::RecordingSink;
pub use transport::{LoopbackHub, LoopbackTransport};

use vidsync_contracts::replication::ReplicationTransport;
use vidsync_model::{PeerId, PeerIdentity, PeerRole, PlayerConfig};

use crate::player::SyncPlayer;

pub type LoopbackPlayer = SyncPlayer<ScriptedBackend, LoopbackTransport, ManualClock>;

/// Upper bound on delivery rounds per [`LoopbackSession::pump`].
const MAX_PUMP_ROUNDS: usize = 64;

/// A player plus test handles onto its collaborators.
#[derive(Debug)]
pub struct LoopbackPeer {
    pub player: LoopbackPlayer,
    pub backend: ScriptedBackend,
    pub sink: RecordingSink,
}

impl LoopbackPeer {
    pub fn id(&self) -> PeerId {
        self.player.identity().id
    }
}

/// Several loopback peers sharing one hub and one clock.
///
/// The first peer is the session host and initial owner; the rest join as
/// guests.
#[derive(Debug)]
pub struct LoopbackSession {
    hub: LoopbackHub,
    clock: ManualClock,
    peers: Vec<LoopbackPeer>,
}

impl LoopbackSession {
    /// `media_duration` is what every peer's backend reports for loaded
    /// media; pass infinity for a live stream.
    pub fn new(config: &PlayerConfig, peer_count: usize, media_duration: f64) -> Self {
        let hub = LoopbackHub::new();
        let clock = ManualClock::new(0.0);
        let mut session = Self {
            hub,
            clock,
            peers: Vec::with_capacity(peer_count),
        };
        for index in 0..peer_count {
            let role = if index == 0 {
                PeerRole::Host
            } else {
                PeerRole::Guest
            };
            session.add_peer(config, role, 0.0, ScriptedBackend::autoplay(media_duration));
        }
        session
    }

    /// Join another peer whose network clock is off by `network_skew`.
    pub fn add_peer(
        &mut self,
        config: &PlayerConfig,
        role: PeerRole,
        network_skew: f64,
        backend: ScriptedBackend,
    ) -> usize {
        let identity = PeerIdentity::new(PeerId::new(), role);
        let transport = self.hub.join(identity.id);
        let sink = RecordingSink::new();
        let player = SyncPlayer::new(
            config.clone(),
            identity,
            backend.clone(),
            transport,
            self.clock.skewed(network_skew),
        )
        .with_sink(Box::new(sink.clone()));

        self.peers.push(LoopbackPeer {
            player,
            backend,
            sink,
        });
        self.peers.len() - 1
    }

    pub fn hub(&self) -> &LoopbackHub {
        &self.hub
    }

    pub fn clock(&self) -> &ManualClock {
        &self.clock
    }

    pub fn peers(&self) -> &[LoopbackPeer] {
        &self.peers
    }

    pub fn peer(&self, index: usize) -> &LoopbackPeer {
        &self.peers[index]
    }

    pub fn peer_mut(&mut self, index: usize) -> &mut LoopbackPeer {
        &mut self.peers[index]
    }

    pub fn owner_index(&self) -> Option<usize> {
        self.peers
            .iter()
            .position(|peer| peer.player.transport().is_owner())
    }

    /// Start every player and settle.
    pub fn start(&mut self) {
        for peer in &mut self.peers {
            peer.player.start();
        }
        self.pump();
    }

    /// Deliver queued records and backend events until nothing is left.
    /// Returns the number of deliveries made.
    pub fn pump(&mut self) -> usize {
        let mut delivered = 0;
        for _ in 0..MAX_PUMP_ROUNDS {
            let mut progressed = false;
            for peer in &mut self.peers {
                if let Some(record) = self.hub.take_pending(peer.id()) {
                    peer.player.on_record_changed(record);
                    progressed = true;
                    delivered += 1;
                }
                for event in peer.backend.take_events() {
                    peer.player.on_backend_event(event);
                    progressed = true;
                    delivered += 1;
                }
            }
            if !progressed {
                break;
            }
        }
        delivered
    }

    /// Advance time by `delta`, play media out, tick every player and settle.
    pub fn step(&mut self, delta: f64) {
        self.clock.advance(delta);
        for peer in &self.peers {
            peer.backend.advance(delta);
        }
        self.pump();
        for peer in &mut self.peers {
            peer.player.tick();
        }
        self.pump();
    }

    /// Owner republishes its record to every peer.
    pub fn republish(&mut self) {
        for peer in &mut self.peers {
            peer.player.republish();
        }
        self.pump();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vidsync_model::PlayerState;

    #[test]
    fn session_plays_default_media_on_every_peer() {
        let url = url::Url::parse("https://example.com/movie.mp4").unwrap();
        let config = PlayerConfig::default().with_default_url(url.clone());
        let mut session = LoopbackSession::new(&config, 3, 600.0);

        session.start();
        session.step(0.1);
        session.step(0.1);

        for peer in session.peers() {
            assert_eq!(peer.player.state(), PlayerState::Playing);
            assert_eq!(peer.backend.loaded(), Some(url.clone()));
        }
        assert_eq!(session.owner_index(), Some(0));
    }
}

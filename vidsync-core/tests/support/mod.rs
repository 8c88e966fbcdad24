#![allow(dead_code)]

use tracing_subscriber::{EnvFilter, fmt};
use vidsync_contracts::replication::ReplicationTransport;
use vidsync_core::{
    SyncPlayer,
    loopback::{
        LoopbackHub, LoopbackPlayer, LoopbackSession, ManualClock,
        RecordingSink, ScriptedBackend,
    },
};
use vidsync_model::{PeerId, PeerIdentity, PeerRole, PlayerConfig};

pub const SHARE_URL: &str = "https://youtu.be/abc?t=30";
pub const FILE_URL: &str = "https://example.com/movie.mp4";
pub const NEXT_URL: &str = "https://example.com/next.mp4";
pub const LIVE_URL: &str = "https://example.com/live.m3u8";
pub const MEDIA_SECS: f64 = 600.0;
pub const STEP_SECS: f64 = 0.1;

pub fn init_tracing() {
    let _ = fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

/// Started loopback session with autoplay backends.
pub fn open_session(config: &PlayerConfig, peers: usize) -> LoopbackSession {
    init_tracing();
    let mut session = LoopbackSession::new(config, peers, MEDIA_SECS);
    session.start();
    session
}

pub fn run_steps(session: &mut LoopbackSession, steps: usize) {
    for _ in 0..steps {
        session.step(STEP_SECS);
    }
}

/// One manually driven peer: the test fires backend callbacks itself.
pub struct ManualPeer {
    pub player: LoopbackPlayer,
    pub backend: ScriptedBackend,
    pub sink: RecordingSink,
}

impl ManualPeer {
    pub fn join(
        hub: &LoopbackHub,
        clock: &ManualClock,
        config: &PlayerConfig,
        role: PeerRole,
        media_duration: f64,
    ) -> Self {
        let identity = PeerIdentity::new(PeerId::new(), role);
        let backend = ScriptedBackend::manual(media_duration);
        let sink = RecordingSink::new();
        let player = SyncPlayer::new(
            config.clone(),
            identity,
            backend.clone(),
            hub.join(identity.id),
            clock.clone(),
        )
        .with_sink(Box::new(sink.clone()));
        Self {
            player,
            backend,
            sink,
        }
    }

    pub fn id(&self) -> PeerId {
        self.player.identity().id
    }

    /// Hand over whatever the hub queued for this peer.
    pub fn deliver(&mut self, hub: &LoopbackHub) -> bool {
        match hub.take_pending(self.id()) {
            Some(record) => {
                self.player.on_record_changed(record);
                true
            }
            None => false,
        }
    }

    pub fn is_owner(&self) -> bool {
        self.player.transport().is_owner()
    }
}

/// Host and guest with manual backends on a shared hub and clock.
pub struct ManualDuo {
    pub hub: LoopbackHub,
    pub clock: ManualClock,
    pub owner: ManualPeer,
    pub follower: ManualPeer,
}

impl ManualDuo {
    pub fn start(config: &PlayerConfig, start_at: f64, media_duration: f64) -> Self {
        init_tracing();
        let hub = LoopbackHub::new();
        let clock = ManualClock::new(start_at);
        let mut owner =
            ManualPeer::join(&hub, &clock, config, PeerRole::Host, media_duration);
        let mut follower =
            ManualPeer::join(&hub, &clock, config, PeerRole::Guest, media_duration);

        owner.player.start();
        follower.player.start();
        follower.deliver(&hub);
        owner.backend.take_commands();
        follower.backend.take_commands();

        Self {
            hub,
            clock,
            owner,
            follower,
        }
    }
}

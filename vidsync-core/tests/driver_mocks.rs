//! Driver behaviour pinned down against strict mock collaborators.

use std::sync::{
    Arc,
    atomic::{AtomicBool, Ordering},
};

use anyhow::Result;
use url::Url;
use vidsync_contracts::{
    access::MockAccessPolicy, backend::MockMediaBackend, clock::MockSessionClock,
    replication::MockReplicationTransport,
};
use vidsync_core::{SyncError, SyncPlayer, access::ControlAction};
use vidsync_model::{
    Generation, PeerId, PeerIdentity, PlaybackRecord, PlayerConfig, PlayerState,
    StartTime,
};

const FILE_URL: &str = "https://example.com/movie.mp4";

fn idle_backend() -> MockMediaBackend {
    let mut backend = MockMediaBackend::new();
    backend.expect_position().return_const(0.0);
    backend.expect_duration().return_const(0.0);
    backend.expect_is_playing().return_const(false);
    backend
}

fn fixed_clock(now: f64) -> MockSessionClock {
    let mut clock = MockSessionClock::new();
    clock.expect_network_now().return_const(now);
    clock.expect_local_now().return_const(now);
    clock
}

fn follower_transport() -> MockReplicationTransport {
    let mut transport = MockReplicationTransport::new();
    transport.expect_is_owner().return_const(false);
    transport.expect_acquire_ownership().never();
    transport.expect_publish().never();
    transport
}

fn locked_record() -> PlaybackRecord {
    PlaybackRecord {
        locked: true,
        ..PlaybackRecord::default()
    }
}

#[test]
fn duplicate_record_delivery_loads_once() -> Result<()> {
    let url = Url::parse(FILE_URL)?;
    let expected = url.clone();

    let mut backend = idle_backend();
    backend.expect_stop().times(1).return_const(());
    backend
        .expect_load()
        .withf(move |loaded| *loaded == expected)
        .times(1)
        .return_const(());
    backend.expect_play().never();
    backend.expect_set_position().never();

    let mut player = SyncPlayer::new(
        PlayerConfig::default(),
        PeerIdentity::guest(PeerId::new()),
        backend,
        follower_transport(),
        fixed_clock(10.0),
    );

    let record = PlaybackRecord {
        url: Some(url),
        generation: Generation::new(1),
        owner_playing: false,
        start_time: StartTime::Pending,
        locked: false,
    };
    player.on_record_changed(record.clone());
    player.on_record_changed(record);

    assert_eq!(player.state(), PlayerState::Loading);
    assert_eq!(player.applied_generation(), Generation::new(1));
    Ok(())
}

#[test]
fn locked_record_denies_guest_before_touching_collaborators() {
    let mut backend = idle_backend();
    backend.expect_stop().never();
    backend.expect_load().never();
    backend.expect_play().never();
    backend.expect_pause().never();
    backend.expect_set_position().never();

    let mut player = SyncPlayer::new(
        PlayerConfig::default(),
        PeerIdentity::guest(PeerId::new()),
        backend,
        follower_transport(),
        fixed_clock(0.0),
    );
    player.on_record_changed(locked_record());

    assert!(matches!(
        player.request_play(FILE_URL),
        Err(SyncError::ControlDenied {
            action: ControlAction::Play
        })
    ));
    assert!(matches!(
        player.request_stop(),
        Err(SyncError::ControlDenied {
            action: ControlAction::Stop
        })
    ));
    assert!(matches!(
        player.request_seek(5.0),
        Err(SyncError::ControlDenied {
            action: ControlAction::Seek
        })
    ));
    assert!(matches!(
        player.toggle_lock(),
        Err(SyncError::ControlDenied {
            action: ControlAction::Lock
        })
    ));
    assert!(player.trigger_play().is_ok());
    assert_eq!(player.record(), &locked_record());
}

#[test]
fn installed_policy_lets_guest_unlock_and_take_ownership() -> Result<()> {
    let owned = Arc::new(AtomicBool::new(false));

    let mut transport = MockReplicationTransport::new();
    let reader = Arc::clone(&owned);
    transport
        .expect_is_owner()
        .returning(move || reader.load(Ordering::SeqCst));
    let writer = Arc::clone(&owned);
    transport
        .expect_acquire_ownership()
        .times(1)
        .returning(move || writer.store(true, Ordering::SeqCst));
    transport
        .expect_publish()
        .withf(|record| !record.locked)
        .times(1)
        .returning(|_| Ok(()));

    let mut policy = MockAccessPolicy::new();
    policy.expect_has_control_access().return_const(true);

    let mut player = SyncPlayer::new(
        PlayerConfig::default(),
        PeerIdentity::guest(PeerId::new()),
        idle_backend(),
        transport,
        fixed_clock(0.0),
    )
    .with_access_policy(Arc::new(policy));
    player.on_record_changed(locked_record());

    player.toggle_lock()?;

    assert!(player.is_owner());
    assert!(!player.locked());
    Ok(())
}

//! Playback state machine.
//!
//! [`PlaybackMachine`] holds the per-peer local session state and exposes one
//! transition function per external event. Transitions never touch the
//! backend, the transport or the sinks directly; they return [`Effects`] that
//! the driver applies. Every input a transition needs (ownership, the current
//! replicated record, both clocks, backend readings) arrives in a [`Context`].

mod effects;
pub mod sync;

pub use effects::{Effect, Effects, SinkEvent};

use tracing::debug;
use url::Url;
use vidsync_contracts::backend::BackendCommand;
use vidsync_model::{
    Generation, PlaybackRecord, PlayerConfig, PlayerState, ScreenMode,
    StartTime, VideoErrorCode,
};

use crate::{
    schedule::{DeferredTask, TaskKind},
    store::RecordChange,
    timecode::start_offset,
};
use sync::{
    LIVE_STREAM_END_GRACE_SECS, drift_correction, expected_position,
    is_seekable,
};

/// Local playback phase.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum Phase {
    #[default]
    Stopped,
    /// A load was issued and the backend has not started playing yet.
    Loading,
    /// Non-owner with the stream ready, waiting for the owner's go-ahead.
    AwaitingGoAhead,
    Playing,
    Error(VideoErrorCode),
}

impl Phase {
    /// Publicly visible state. Waiting for the go-ahead still counts as loading.
    pub fn player_state(&self) -> PlayerState {
        match self {
            Phase::Stopped => PlayerState::Stopped,
            Phase::Loading | Phase::AwaitingGoAhead => PlayerState::Loading,
            Phase::Playing => PlayerState::Playing,
            Phase::Error(_) => PlayerState::Error,
        }
    }

    pub fn is_playing(&self) -> bool {
        matches!(self, Phase::Playing)
    }
}

/// Backend readings taken right before a transition.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct BackendProbe {
    pub position: f64,
    pub duration: f64,
    pub is_playing: bool,
}

/// Inputs of one transition.
#[derive(Debug, Clone, Copy)]
pub struct Context<'a> {
    pub is_owner: bool,
    /// The replicated record as currently known locally.
    pub record: &'a PlaybackRecord,
    pub network_now: f64,
    pub local_now: f64,
    pub probe: BackendProbe,
}

/// Timing and retry knobs of the machine.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MachineSettings {
    pub retry_on_error: bool,
    pub retry_timeout: f64,
    pub sync_frequency: f64,
    pub sync_threshold: f64,
}

impl From<&PlayerConfig> for MachineSettings {
    fn from(config: &PlayerConfig) -> Self {
        Self {
            retry_on_error: config.retry_on_error,
            retry_timeout: config.retry_timeout_secs,
            sync_frequency: config.sync_frequency_secs,
            sync_threshold: config.sync_threshold_secs,
        }
    }
}

impl Default for MachineSettings {
    fn default() -> Self {
        Self::from(&PlayerConfig::default())
    }
}

#[derive(Debug, Clone)]
pub struct PlaybackMachine {
    settings: MachineSettings,
    phase: Phase,
    last_error: Option<VideoErrorCode>,
    /// Last generation this peer started loading.
    applied_generation: Generation,
    seekable: bool,
    duration: f64,
    position: f64,
    /// Offset the owner seeks to once playback starts.
    target_offset: f64,
    last_position: f64,
    last_sync_at: Option<f64>,
    /// Local time of the backend's last start callback for the current load.
    started_at: Option<f64>,
    current_url: Option<Url>,
    last_url: Option<Url>,
}

impl PlaybackMachine {
    pub fn new(settings: MachineSettings) -> Self {
        Self {
            settings,
            phase: Phase::Stopped,
            last_error: None,
            applied_generation: Generation::ZERO,
            seekable: false,
            duration: 0.0,
            position: 0.0,
            target_offset: 0.0,
            last_position: 0.0,
            last_sync_at: None,
            started_at: None,
            current_url: None,
            last_url: None,
        }
    }

    pub fn settings(&self) -> &MachineSettings {
        &self.settings
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn state(&self) -> PlayerState {
        self.phase.player_state()
    }

    /// Error code of the most recent backend failure, kept after recovery.
    pub fn last_error(&self) -> Option<VideoErrorCode> {
        self.last_error
    }

    pub fn applied_generation(&self) -> Generation {
        self.applied_generation
    }

    pub fn seekable(&self) -> bool {
        self.seekable
    }

    /// Cached duration, refreshed while playing a seekable source.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Cached position, refreshed while playing a seekable source.
    pub fn position(&self) -> f64 {
        self.position
    }

    pub fn target_offset(&self) -> f64 {
        self.target_offset
    }

    /// Position captured by the last stop of a seekable source.
    pub fn last_position(&self) -> f64 {
        self.last_position
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.current_url.as_ref()
    }

    pub fn last_url(&self) -> Option<&Url> {
        self.last_url.as_ref()
    }

    pub fn waiting_for_go_ahead(&self) -> bool {
        self.phase == Phase::AwaitingGoAhead
    }

    fn enter(&mut self, phase: Phase, fx: &mut Effects) {
        let before = self.phase.player_state();
        self.phase = phase;
        let after = phase.player_state();
        if before != after || matches!(phase, Phase::Error(_)) {
            debug!(from = %before, to = %after, "player state changed");
            fx.notify(SinkEvent::State(after));
        }
    }

    fn remember_url(&mut self, url: Option<Url>) {
        self.last_url = self.current_url.take();
        self.current_url = url;
    }

    /// Commit `url` as a new generation and start loading it.
    ///
    /// The caller must hold ownership; `acquired_ownership` reports whether
    /// it was taken for this request.
    pub fn request_play(
        &mut self,
        ctx: &Context<'_>,
        url: Url,
        acquired_ownership: bool,
    ) -> Effects {
        let mut fx = Effects::new();
        fx.cancel(TaskKind::Play);

        let generation = ctx.record.generation.advance(acquired_ownership);
        debug!(%generation, %url, acquired_ownership, "committing media");
        fx.record(RecordChange::NewMedia {
            url: url.clone(),
            generation,
        });
        self.applied_generation = generation;
        self.target_offset = f64::from(start_offset(&url));
        self.remember_url(Some(url.clone()));
        self.start_load(Some(&url), &mut fx);
        fx
    }

    /// Load the replicated URL again, e.g. when a retry fires.
    pub fn load_current(&mut self, ctx: &Context<'_>) -> Effects {
        let mut fx = Effects::new();
        self.start_load(ctx.record.url.as_ref(), &mut fx);
        fx
    }

    fn start_load(&mut self, url: Option<&Url>, fx: &mut Effects) {
        fx.cancel(TaskKind::Load);
        fx.cancel(TaskKind::StopLocal);
        self.started_at = None;
        let Some(url) = url else {
            debug!("no media to load");
            return;
        };

        debug!(%url, "starting load");
        self.enter(Phase::Loading, fx);
        fx.notify(SinkEvent::Screen(ScreenMode::Loading));
        fx.backend(BackendCommand::Stop);
        fx.backend(BackendCommand::Load(url.clone()));
    }

    /// Explicit stop. An owner also resets the replicated record.
    pub fn request_stop(&mut self, ctx: &Context<'_>) -> Effects {
        self.stop(ctx, ctx.is_owner)
    }

    /// Stop local playback without touching the replicated record.
    pub fn stop_local(&mut self, ctx: &Context<'_>) -> Effects {
        self.stop(ctx, false)
    }

    fn stop(&mut self, ctx: &Context<'_>, clear_record: bool) -> Effects {
        let mut fx = Effects::new();
        if self.seekable {
            self.last_position = ctx.probe.position;
        }

        fx.backend(BackendCommand::Stop);
        if clear_record {
            fx.record(RecordChange::Cleared);
        }
        self.target_offset = 0.0;
        self.started_at = None;
        fx.cancel(TaskKind::Play);
        fx.cancel(TaskKind::Load);
        fx.cancel(TaskKind::StopLocal);

        self.enter(Phase::Stopped, &mut fx);
        fx.notify(SinkEvent::Screen(ScreenMode::Logo));
        fx
    }

    pub fn request_lock(&mut self, locked: bool) -> Effects {
        let mut fx = Effects::new();
        fx.record(RecordChange::Locked(locked));
        fx
    }

    /// Move the session to `offset` seconds. The caller must hold ownership.
    pub fn request_seek(&mut self, ctx: &Context<'_>, offset: f64) -> Effects {
        let mut fx = Effects::new();
        let start = ctx.network_now - offset;
        debug!(offset, start, "seeking session");
        fx.record(RecordChange::StartTime(start));
        if !self.phase.is_playing() {
            self.target_offset = offset.max(0.0);
        }
        self.correct_drift_from(start, ctx, &mut fx);
        fx
    }

    /// Re-derive local playback from the replicated record without changing it.
    pub fn resync(&mut self, ctx: &Context<'_>) -> Effects {
        let mut fx = Effects::new();
        if ctx.is_owner || self.phase.is_playing() {
            self.last_sync_at = Some(ctx.local_now);
            self.correct_drift(ctx, &mut fx);
        } else if ctx.record.owner_playing
            && matches!(self.phase, Phase::Stopped | Phase::Error(_))
        {
            debug!("owner is playing but local backend is idle, reloading");
            self.start_load(ctx.record.url.as_ref(), &mut fx);
        }
        fx
    }

    /// Hard resync: restart the backend.
    ///
    /// An owner with a seekable source reloads and resumes at the current
    /// position. A non-owner stops and reloads if the owner is playing.
    pub fn reload(&mut self, ctx: &Context<'_>) -> Effects {
        let mut fx = Effects::new();
        if ctx.is_owner {
            if self.seekable {
                let resume = if ctx.probe.is_playing {
                    ctx.probe.position
                } else {
                    self.target_offset
                };
                self.start_load(ctx.record.url.as_ref(), &mut fx);
                self.target_offset = resume;
            }
            return fx;
        }

        fx.backend(BackendCommand::Stop);
        if ctx.record.owner_playing {
            self.start_load(ctx.record.url.as_ref(), &mut fx);
        } else {
            self.enter(Phase::Stopped, &mut fx);
            fx.notify(SinkEvent::Screen(ScreenMode::Logo));
        }
        fx
    }

    pub fn on_ready(&mut self, ctx: &Context<'_>) -> Effects {
        let mut fx = Effects::new();
        if self.phase != Phase::Loading {
            debug!(phase = ?self.phase, "ready outside of loading, ignoring");
            return fx;
        }

        self.duration = ctx.probe.duration;
        self.seekable = is_seekable(self.duration);
        debug!(duration = self.duration, seekable = self.seekable, "media ready");
        fx.notify(SinkEvent::AudioStart);

        if ctx.is_owner || ctx.record.owner_playing {
            fx.backend(BackendCommand::Play);
        } else {
            self.enter(Phase::AwaitingGoAhead, &mut fx);
        }
        fx
    }

    pub fn on_started(&mut self, ctx: &Context<'_>) -> Effects {
        let mut fx = Effects::new();
        if matches!(self.phase, Phase::Stopped | Phase::Error(_)) {
            debug!(phase = ?self.phase, "start without a pending load, ignoring");
            return fx;
        }
        self.started_at = Some(ctx.local_now);

        if ctx.is_owner {
            let start_time = ctx.network_now - self.target_offset;
            fx.record(RecordChange::OwnerStarted { start_time });
            self.enter(Phase::Playing, &mut fx);
            fx.backend(BackendCommand::Seek(self.target_offset));
            fx.notify(SinkEvent::Screen(ScreenMode::Normal));
        } else if !ctx.record.owner_playing {
            debug!("started before the owner, pausing for go-ahead");
            fx.backend(BackendCommand::Pause);
            self.enter(Phase::AwaitingGoAhead, &mut fx);
        } else {
            self.enter(Phase::Playing, &mut fx);
            fx.notify(SinkEvent::Screen(ScreenMode::Normal));
            self.correct_drift(ctx, &mut fx);
        }
        fx
    }

    pub fn on_ended(&mut self, ctx: &Context<'_>) -> Effects {
        let mut fx = Effects::new();
        if !self.seekable
            && self
                .started_at
                .is_some_and(|at| ctx.local_now - at < LIVE_STREAM_END_GRACE_SECS)
        {
            debug!("end of stream right after start, ignoring");
            return fx;
        }

        debug!("media ended");
        self.started_at = None;
        self.seekable = false;
        self.last_position = 0.0;
        self.enter(Phase::Stopped, &mut fx);
        fx.notify(SinkEvent::Screen(ScreenMode::Logo));
        fx.notify(SinkEvent::AudioStop);
        if ctx.is_owner {
            fx.record(RecordChange::OwnerStopped);
        }
        fx
    }

    pub fn on_error(&mut self, ctx: &Context<'_>, code: VideoErrorCode) -> Effects {
        let mut fx = Effects::new();
        fx.backend(BackendCommand::Stop);
        self.target_offset = 0.0;
        self.started_at = None;
        self.last_error = Some(code);

        self.enter(Phase::Error(code), &mut fx);
        fx.notify(SinkEvent::VideoError(code));
        fx.notify(SinkEvent::Screen(ScreenMode::Error));
        fx.notify(SinkEvent::AudioStop);

        if ctx.is_owner && !self.settings.retry_on_error {
            debug!(%code, "load failed, retry disabled; stopping session");
            fx.record(RecordChange::OwnerStopped);
        } else {
            let at = ctx.local_now + self.settings.retry_timeout;
            debug!(%code, retry_at = at, "load failed, scheduling retry");
            fx.schedule(DeferredTask::Load, at);
        }
        fx
    }

    /// React to a record delivered by the transport. `ctx.record` is the new
    /// record. Owners ignore deliveries.
    pub fn on_record_changed(&mut self, ctx: &Context<'_>) -> Effects {
        let mut fx = Effects::new();
        if ctx.is_owner {
            return fx;
        }

        let record = ctx.record;
        if self.phase.is_playing() && !record.owner_playing {
            fx.schedule(DeferredTask::StopLocal, ctx.local_now);
        }

        if !record.generation.is_newer_than(self.applied_generation) {
            debug!(
                generation = %record.generation,
                applied = %self.applied_generation,
                "generation already applied"
            );
            return fx;
        }

        debug!(generation = %record.generation, "adopting replicated media");
        self.applied_generation = record.generation;
        self.remember_url(record.url.clone());
        self.start_load(record.url.as_ref(), &mut fx);
        fx
    }

    /// Periodic pass: refresh cached stream readings, release a pending
    /// go-ahead and run drift correction every `sync_frequency` seconds.
    pub fn tick(&mut self, ctx: &Context<'_>) -> Effects {
        let mut fx = Effects::new();
        if self.phase.is_playing() && self.seekable {
            self.duration = ctx.probe.duration;
            self.position = ctx.probe.position;
        }

        if !ctx.is_owner && self.phase == Phase::AwaitingGoAhead {
            if ctx.record.owner_playing {
                debug!("owner go-ahead received");
                fx.backend(BackendCommand::Play);
                self.enter(Phase::Playing, &mut fx);
                fx.notify(SinkEvent::Screen(ScreenMode::Normal));
                self.correct_drift(ctx, &mut fx);
            }
            return fx;
        }

        let due = self
            .last_sync_at
            .is_none_or(|last| ctx.local_now - last > self.settings.sync_frequency);
        if due {
            self.last_sync_at = Some(ctx.local_now);
            self.correct_drift(ctx, &mut fx);
        }
        fx
    }

    fn correct_drift(&mut self, ctx: &Context<'_>, fx: &mut Effects) {
        if let StartTime::At(start) = ctx.record.start_time {
            self.correct_drift_from(start, ctx, fx);
        }
    }

    fn correct_drift_from(&mut self, start: f64, ctx: &Context<'_>, fx: &mut Effects) {
        if !self.phase.is_playing() || !self.seekable {
            return;
        }

        let expected =
            expected_position(ctx.network_now, start, ctx.probe.duration);
        if let Some(target) = drift_correction(
            ctx.probe.position,
            expected,
            self.settings.sync_threshold,
        ) {
            debug!(
                position = ctx.probe.position,
                expected = target,
                "drift beyond threshold, seeking"
            );
            fx.backend(BackendCommand::Seek(target));
            self.position = target;
        }
    }
}

//! The per-peer driver tying the machine to its collaborators.

use std::{fmt, sync::Arc};

use tracing::{Span, debug, debug_span, info, warn};
use url::Url;
use vidsync_contracts::{
    access::AccessPolicy,
    backend::{BackendEvent, MediaBackend},
    clock::SessionClock,
    presentation::PresentationSink,
    replication::ReplicationTransport,
};
use vidsync_model::{
    Generation, PeerIdentity, PlaybackRecord, PlayerConfig, PlayerState,
    ScreenMode, SourceKind, VideoErrorCode, parse_media_url,
};

use crate::{
    access::{ControlAction, ControlGate},
    error::Result,
    machine::{
        BackendProbe, Context, Effect, Effects, MachineSettings, Phase,
        PlaybackMachine, SinkEvent,
    },
    schedule::{DeferredTask, Scheduler, TaskKind},
    store::{OwnershipToken, RecordChange, RecordStore},
};

/// One peer's synchronized player.
///
/// All entry points run to completion on the caller's thread. The embedder
/// forwards backend callbacks to [`on_backend_event`](Self::on_backend_event),
/// replicated records to [`on_record_changed`](Self::on_record_changed) and
/// calls [`tick`](Self::tick) once per scheduler pass.
pub struct SyncPlayer<B, T, C> {
    config: PlayerConfig,
    backend: B,
    transport: T,
    clock: C,
    gate: ControlGate,
    sinks: Vec<Box<dyn PresentationSink>>,
    store: RecordStore,
    machine: PlaybackMachine,
    scheduler: Scheduler,
    span: Span,
}

impl<B, T, C> fmt::Debug for SyncPlayer<B, T, C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncPlayer")
            .field("peer", &self.gate.identity().id)
            .field("phase", &self.machine.phase())
            .field("record", self.store.current())
            .field("applied_generation", &self.machine.applied_generation())
            .field("pending_tasks", &self.scheduler.len())
            .field("sink_count", &self.sinks.len())
            .finish_non_exhaustive()
    }
}

impl<B, T, C> SyncPlayer<B, T, C>
where
    B: MediaBackend,
    T: ReplicationTransport,
    C: SessionClock,
{
    pub fn new(
        config: PlayerConfig,
        identity: PeerIdentity,
        backend: B,
        transport: T,
        clock: C,
    ) -> Self {
        let machine = PlaybackMachine::new(MachineSettings::from(&config));
        let span = debug_span!("sync_player", peer = %identity.id);
        Self {
            config,
            backend,
            transport,
            clock,
            gate: ControlGate::new(identity),
            sinks: Vec::new(),
            store: RecordStore::new(),
            machine,
            scheduler: Scheduler::new(),
            span,
        }
    }

    pub fn with_access_policy(mut self, policy: Arc<dyn AccessPolicy>) -> Self {
        self.gate = self.gate.with_policy(policy);
        self
    }

    pub fn with_sink(mut self, sink: Box<dyn PresentationSink>) -> Self {
        self.sinks.push(sink);
        self
    }

    pub fn add_sink(&mut self, sink: Box<dyn PresentationSink>) {
        self.sinks.push(sink);
    }

    /// Session start: reset the backend, announce the idle screen and, as
    /// owner, publish the configured lock state and queue the default URL.
    pub fn start(&mut self) {
        let _span = self.span.clone().entered();
        self.backend.stop();
        self.notify(SinkEvent::State(PlayerState::Stopped));

        if let Ok(token) = OwnershipToken::from_transport(&self.transport) {
            self.store
                .edit(&token, RecordChange::Locked(self.config.default_locked));
            self.publish();
        }

        self.notify(SinkEvent::Source(SourceKind::Stream));
        self.notify(SinkEvent::Screen(ScreenMode::Logo));

        if self.transport.is_owner()
            && let Some(url) = self.config.default_url.clone()
        {
            debug!(%url, "queueing default media");
            self.scheduler
                .schedule(DeferredTask::Play(url), self.clock.local_now());
        }
    }

    /// Play `raw_url` for the whole session, taking ownership if needed.
    pub fn request_play(&mut self, raw_url: &str) -> Result<()> {
        let url = parse_media_url(raw_url)?;
        self.play(url, ControlAction::Play)
    }

    /// Play the replicated URL again unless already loading or playing.
    pub fn trigger_play(&mut self) -> Result<()> {
        if matches!(self.machine.state(), PlayerState::Loading | PlayerState::Playing) {
            return Ok(());
        }
        match self.store.current().url.clone() {
            Some(url) => self.play(url, ControlAction::Replay),
            None => {
                debug!("nothing to replay");
                Ok(())
            }
        }
    }

    fn play(&mut self, url: Url, action: ControlAction) -> Result<()> {
        let _span = self.span.clone().entered();
        self.gate
            .authorize(action, self.transport.is_owner(), self.store.current())?;

        let acquired = self.take_ownership();
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.request_play(&ctx, url, acquired);
        self.apply(fx);
        Ok(())
    }

    /// Stop playback for the whole session.
    pub fn request_stop(&mut self) -> Result<()> {
        let _span = self.span.clone().entered();
        self.gate.authorize(
            ControlAction::Stop,
            self.transport.is_owner(),
            self.store.current(),
        )?;

        self.take_ownership();
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.request_stop(&ctx);
        self.apply(fx);
        Ok(())
    }

    pub fn request_lock(&mut self, locked: bool) -> Result<()> {
        let _span = self.span.clone().entered();
        self.gate.authorize(
            ControlAction::Lock,
            self.transport.is_owner(),
            self.store.current(),
        )?;

        self.take_ownership();
        let fx = self.machine.request_lock(locked);
        self.apply(fx);
        Ok(())
    }

    pub fn toggle_lock(&mut self) -> Result<()> {
        let locked = !self.store.current().locked;
        self.request_lock(locked)
    }

    /// Move the whole session to `offset` seconds into the stream.
    pub fn request_seek(&mut self, offset: f64) -> Result<()> {
        let _span = self.span.clone().entered();
        self.gate.authorize(
            ControlAction::Seek,
            self.transport.is_owner(),
            self.store.current(),
        )?;

        self.take_ownership();
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.request_seek(&ctx, offset);
        self.apply(fx);
        Ok(())
    }

    /// Realign local playback with the replicated record. Never changes it.
    pub fn resync(&mut self) {
        let _span = self.span.clone().entered();
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.resync(&ctx);
        self.apply(fx);
    }

    /// Restart the local backend, resuming where the session is.
    pub fn reload(&mut self) {
        let _span = self.span.clone().entered();
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.reload(&ctx);
        self.apply(fx);
    }

    /// Republish the current record; owners call this periodically so
    /// peers that missed an update converge.
    pub fn republish(&mut self) {
        if self.transport.is_owner() {
            let _span = self.span.clone().entered();
            self.publish();
        }
    }

    pub fn on_backend_event(&mut self, event: BackendEvent) {
        match event {
            BackendEvent::Ready => self.on_backend_ready(),
            BackendEvent::Started => self.on_backend_started(),
            BackendEvent::Ended => self.on_backend_ended(),
            BackendEvent::Error(code) => self.on_backend_error(code),
        }
    }

    pub fn on_backend_ready(&mut self) {
        let _span = self.span.clone().entered();
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.on_ready(&ctx);
        self.apply(fx);
    }

    pub fn on_backend_started(&mut self) {
        let _span = self.span.clone().entered();
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.on_started(&ctx);
        self.apply(fx);
    }

    pub fn on_backend_ended(&mut self) {
        let _span = self.span.clone().entered();
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.on_ended(&ctx);
        self.apply(fx);
    }

    pub fn on_backend_error(&mut self, code: VideoErrorCode) {
        let _span = self.span.clone().entered();
        warn!(%code, url = self.store.current().url_str(), "media backend failed");
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.on_error(&ctx, code);
        self.apply(fx);
    }

    /// A record delivered by the transport. Ignored while owning.
    pub fn on_record_changed(&mut self, record: PlaybackRecord) {
        let _span = self.span.clone().entered();
        if self.transport.is_owner() {
            debug!("owner ignores replicated record");
            return;
        }

        self.store.apply_remote(record);
        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.on_record_changed(&ctx);
        self.apply(fx);
    }

    /// One scheduler pass: run due deferred tasks, then the periodic checks.
    pub fn tick(&mut self) {
        let _span = self.span.clone().entered();
        let now = self.clock.local_now();
        for task in self.scheduler.take_due(now) {
            self.run_task(task);
        }

        let ctx = Self::context(
            &self.backend,
            &self.transport,
            &self.clock,
            self.store.current(),
        );
        let fx = self.machine.tick(&ctx);
        self.apply(fx);
    }

    fn run_task(&mut self, task: DeferredTask) {
        debug!(?task, "running deferred task");
        let fx = match task {
            DeferredTask::Load => {
                let ctx = Self::context(
                    &self.backend,
                    &self.transport,
                    &self.clock,
                    self.store.current(),
                );
                self.machine.load_current(&ctx)
            }
            DeferredTask::StopLocal => {
                let ctx = Self::context(
                    &self.backend,
                    &self.transport,
                    &self.clock,
                    self.store.current(),
                );
                self.machine.stop_local(&ctx)
            }
            DeferredTask::Play(url) => {
                if !self.transport.is_owner() {
                    debug!(%url, "queued media dropped, another peer owns the session");
                    return;
                }
                if let Err(err) = self.play(url, ControlAction::Replay) {
                    warn!(%err, "queued media could not be played");
                }
                return;
            }
        };
        self.apply(fx);
    }

    fn take_ownership(&mut self) -> bool {
        if self.transport.is_owner() {
            return false;
        }
        self.transport.acquire_ownership();
        info!(generation = %self.store.current().generation, "took ownership of the playback record");
        true
    }

    fn context<'a>(
        backend: &B,
        transport: &T,
        clock: &C,
        record: &'a PlaybackRecord,
    ) -> Context<'a> {
        Context {
            is_owner: transport.is_owner(),
            record,
            network_now: clock.network_now(),
            local_now: clock.local_now(),
            probe: BackendProbe {
                position: backend.position(),
                duration: backend.duration(),
                is_playing: backend.is_playing(),
            },
        }
    }

    fn apply(&mut self, fx: Effects) {
        let mut dirty = false;
        for effect in fx {
            match effect {
                Effect::Backend(command) => command.dispatch(&mut self.backend),
                Effect::Record(change) => {
                    match OwnershipToken::from_transport(&self.transport) {
                        Ok(token) => dirty |= self.store.edit(&token, change),
                        Err(err) => {
                            warn!(%err, ?change, "record change dropped");
                        }
                    }
                }
                Effect::Notify(event) => self.notify(event),
                Effect::Schedule { task, at } => self.scheduler.schedule(task, at),
                Effect::Cancel(kind) => self.scheduler.cancel(kind),
            }
        }

        if dirty {
            self.publish();
        }
    }

    fn notify(&mut self, event: SinkEvent) {
        for sink in &mut self.sinks {
            event.deliver(sink.as_mut());
        }
    }

    fn publish(&mut self) {
        let record = self.store.current();
        match self.transport.publish(record) {
            Ok(()) => debug!(
                generation = %record.generation,
                owner_playing = record.owner_playing,
                "record published"
            ),
            Err(err) => warn!(%err, "failed to publish playback record"),
        }
    }
}

impl<B, T, C> SyncPlayer<B, T, C>
where
    B: MediaBackend,
    T: ReplicationTransport,
{
    pub fn config(&self) -> &PlayerConfig {
        &self.config
    }

    pub fn identity(&self) -> &PeerIdentity {
        self.gate.identity()
    }

    pub fn state(&self) -> PlayerState {
        self.machine.state()
    }

    pub fn phase(&self) -> Phase {
        self.machine.phase()
    }

    pub fn last_error(&self) -> Option<VideoErrorCode> {
        self.machine.last_error()
    }

    pub fn record(&self) -> &PlaybackRecord {
        self.store.current()
    }

    pub fn is_owner(&self) -> bool {
        self.transport.is_owner()
    }

    pub fn can_take_control(&self) -> bool {
        self.gate.can_take_control(self.store.current())
    }

    pub fn locked(&self) -> bool {
        self.store.current().locked
    }

    pub fn applied_generation(&self) -> Generation {
        self.machine.applied_generation()
    }

    pub fn waiting_for_go_ahead(&self) -> bool {
        self.machine.waiting_for_go_ahead()
    }

    pub fn seekable(&self) -> bool {
        self.machine.seekable()
    }

    pub fn duration(&self) -> f64 {
        self.machine.duration()
    }

    pub fn position(&self) -> f64 {
        self.machine.position()
    }

    pub fn last_position(&self) -> f64 {
        self.machine.last_position()
    }

    pub fn current_url(&self) -> Option<&Url> {
        self.machine.current_url()
    }

    pub fn last_url(&self) -> Option<&Url> {
        self.machine.last_url()
    }

    /// Local time of the pending retry load, if any.
    pub fn pending_load_at(&self) -> Option<f64> {
        self.scheduler.fire_time(TaskKind::Load)
    }

    /// Local time of the pending deferred play, if any.
    pub fn pending_play_at(&self) -> Option<f64> {
        self.scheduler.fire_time(TaskKind::Play)
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn backend_mut(&mut self) -> &mut B {
        &mut self.backend
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}

use vidsync_contracts::{backend::BackendCommand, presentation::PresentationSink};
use vidsync_model::{PlayerState, ScreenMode, SourceKind, VideoErrorCode};

use crate::{
    schedule::{DeferredTask, TaskKind},
    store::RecordChange,
};

/// Side effect requested by a machine transition.
///
/// The driver applies effects in order: backend commands go to the media
/// backend, record changes to the store (followed by one publish),
/// notifications to every sink and scheduling to the task heap.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Backend(BackendCommand),
    Record(RecordChange),
    Notify(SinkEvent),
    Schedule { task: DeferredTask, at: f64 },
    Cancel(TaskKind),
}

/// Presentation notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkEvent {
    State(PlayerState),
    VideoError(VideoErrorCode),
    Screen(ScreenMode),
    Source(SourceKind),
    AudioStart,
    AudioStop,
}

impl SinkEvent {
    pub fn deliver(self, sink: &mut dyn PresentationSink) {
        match self {
            SinkEvent::State(state) => sink.on_state_changed(state),
            SinkEvent::VideoError(code) => sink.on_video_error(code),
            SinkEvent::Screen(mode) => sink.on_screen_mode(mode),
            SinkEvent::Source(source) => sink.on_source_changed(source),
            SinkEvent::AudioStart => sink.on_audio_start(),
            SinkEvent::AudioStop => sink.on_audio_stop(),
        }
    }
}

/// Ordered effect list produced by one transition.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Effects {
    items: Vec<Effect>,
}

impl Effects {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, effect: Effect) {
        self.items.push(effect);
    }

    pub(crate) fn backend(&mut self, command: BackendCommand) {
        self.push(Effect::Backend(command));
    }

    pub(crate) fn record(&mut self, change: RecordChange) {
        self.push(Effect::Record(change));
    }

    pub(crate) fn notify(&mut self, event: SinkEvent) {
        self.push(Effect::Notify(event));
    }

    pub(crate) fn schedule(&mut self, task: DeferredTask, at: f64) {
        self.push(Effect::Schedule { task, at });
    }

    pub(crate) fn cancel(&mut self, kind: TaskKind) {
        self.push(Effect::Cancel(kind));
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Effect> {
        self.items.iter()
    }

    /// Backend commands in issue order.
    pub fn backend_commands(&self) -> Vec<&BackendCommand> {
        self.items
            .iter()
            .filter_map(|effect| match effect {
                Effect::Backend(command) => Some(command),
                _ => None,
            })
            .collect()
    }

    pub fn record_changes(&self) -> Vec<&RecordChange> {
        self.items
            .iter()
            .filter_map(|effect| match effect {
                Effect::Record(change) => Some(change),
                _ => None,
            })
            .collect()
    }

    pub fn notifications(&self) -> Vec<SinkEvent> {
        self.items
            .iter()
            .filter_map(|effect| match effect {
                Effect::Notify(event) => Some(*event),
                _ => None,
            })
            .collect()
    }

    pub fn seeks(&self) -> Vec<f64> {
        self.items
            .iter()
            .filter_map(|effect| match effect {
                Effect::Backend(BackendCommand::Seek(at)) => Some(*at),
                _ => None,
            })
            .collect()
    }
}

impl IntoIterator for Effects {
    type Item = Effect;
    type IntoIter = std::vec::IntoIter<Effect>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

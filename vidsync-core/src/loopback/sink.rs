use std::sync::Arc;

use parking_lot::Mutex;
use vidsync_contracts::presentation::PresentationSink;
use vidsync_model::{PlayerState, ScreenMode, SourceKind, VideoErrorCode};

use crate::machine::SinkEvent;

/// Sink that records every notification; clones share the log.
#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<SinkEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<SinkEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<SinkEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    /// State notifications in delivery order.
    pub fn states(&self) -> Vec<PlayerState> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::State(state) => Some(*state),
                _ => None,
            })
            .collect()
    }

    pub fn video_errors(&self) -> Vec<VideoErrorCode> {
        self.events
            .lock()
            .iter()
            .filter_map(|event| match event {
                SinkEvent::VideoError(code) => Some(*code),
                _ => None,
            })
            .collect()
    }

    pub fn last_screen(&self) -> Option<ScreenMode> {
        self.events.lock().iter().rev().find_map(|event| match event {
            SinkEvent::Screen(mode) => Some(*mode),
            _ => None,
        })
    }

    fn push(&self, event: SinkEvent) {
        self.events.lock().push(event);
    }
}

impl PresentationSink for RecordingSink {
    fn on_state_changed(&mut self, state: PlayerState) {
        self.push(SinkEvent::State(state));
    }

    fn on_video_error(&mut self, code: VideoErrorCode) {
        self.push(SinkEvent::VideoError(code));
    }

    fn on_source_changed(&mut self, source: SourceKind) {
        self.push(SinkEvent::Source(source));
    }

    fn on_screen_mode(&mut self, mode: ScreenMode) {
        self.push(SinkEvent::Screen(mode));
    }

    fn on_audio_start(&mut self) {
        self.push(SinkEvent::AudioStart);
    }

    fn on_audio_stop(&mut self) {
        self.push(SinkEvent::AudioStop);
    }
}

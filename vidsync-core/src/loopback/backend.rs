use std::{collections::VecDeque, sync::Arc};

use parking_lot::Mutex;
use url::Url;
use vidsync_contracts::backend::{BackendCommand, BackendEvent, MediaBackend};
use vidsync_model::VideoErrorCode;

#[derive(Debug)]
struct BackendState {
    autoplay: bool,
    media_duration: f64,
    failing_loads: u32,
    failure: VideoErrorCode,
    loaded: Option<Url>,
    playing: bool,
    position: f64,
    duration: f64,
    commands: Vec<BackendCommand>,
    events: VecDeque<BackendEvent>,
}

/// Deterministic stand-in for a video backend.
///
/// Every command is logged. In autoplay mode the backend answers like a
/// real one would, one step at a time: a load queues `Ready`, play queues
/// `Started` and advancing past the end queues `Ended`. Queued events are
/// drained by the embedder with [`take_events`](Self::take_events). Clones
/// share state, so a test can keep a handle while the player owns another.
#[derive(Debug, Clone)]
pub struct ScriptedBackend {
    state: Arc<Mutex<BackendState>>,
}

impl ScriptedBackend {
    /// Backend that only records commands; events are injected by the test.
    pub fn manual(media_duration: f64) -> Self {
        Self::build(false, media_duration)
    }

    /// Backend that answers loads and plays with the matching events.
    pub fn autoplay(media_duration: f64) -> Self {
        Self::build(true, media_duration)
    }

    fn build(autoplay: bool, media_duration: f64) -> Self {
        Self {
            state: Arc::new(Mutex::new(BackendState {
                autoplay,
                media_duration,
                failing_loads: 0,
                failure: VideoErrorCode::PlayerError,
                loaded: None,
                playing: false,
                position: 0.0,
                duration: 0.0,
                commands: Vec::new(),
                events: VecDeque::new(),
            })),
        }
    }

    /// Make the next `count` loads fail with `code`.
    pub fn fail_next_loads(&self, count: u32, code: VideoErrorCode) {
        let mut state = self.state.lock();
        state.failing_loads = count;
        state.failure = code;
    }

    /// Duration reported for media loaded from now on.
    pub fn set_media_duration(&self, duration: f64) {
        self.state.lock().media_duration = duration;
    }

    /// Overwrite the playback position without logging a command,
    /// e.g. to simulate local drift.
    pub fn set_position_raw(&self, position: f64) {
        self.state.lock().position = position;
    }

    pub fn push_event(&self, event: BackendEvent) {
        self.state.lock().events.push_back(event);
    }

    pub fn take_events(&self) -> Vec<BackendEvent> {
        self.state.lock().events.drain(..).collect()
    }

    pub fn commands(&self) -> Vec<BackendCommand> {
        self.state.lock().commands.clone()
    }

    pub fn take_commands(&self) -> Vec<BackendCommand> {
        std::mem::take(&mut self.state.lock().commands)
    }

    pub fn loaded(&self) -> Option<Url> {
        self.state.lock().loaded.clone()
    }

    /// Let `delta` seconds of media play out.
    pub fn advance(&self, delta: f64) {
        let mut state = self.state.lock();
        if !state.playing {
            return;
        }
        state.position += delta;
        if state.duration.is_finite() && state.position >= state.duration {
            state.position = state.duration;
            state.playing = false;
            if state.autoplay {
                state.events.push_back(BackendEvent::Ended);
            }
        }
    }
}

impl MediaBackend for ScriptedBackend {
    fn load(&mut self, url: &Url) {
        let mut state = self.state.lock();
        state.commands.push(BackendCommand::Load(url.clone()));
        state.playing = false;
        state.position = 0.0;

        if state.failing_loads > 0 {
            state.failing_loads -= 1;
            state.loaded = None;
            state.duration = 0.0;
            let code = state.failure;
            state.events.push_back(BackendEvent::Error(code));
            return;
        }

        state.loaded = Some(url.clone());
        state.duration = state.media_duration;
        if state.autoplay {
            state.events.push_back(BackendEvent::Ready);
        }
    }

    fn stop(&mut self) {
        let mut state = self.state.lock();
        state.commands.push(BackendCommand::Stop);
        state.loaded = None;
        state.playing = false;
        state.position = 0.0;
        state.duration = 0.0;
    }

    fn play(&mut self) {
        let mut state = self.state.lock();
        state.commands.push(BackendCommand::Play);
        if state.loaded.is_some() && !state.playing {
            state.playing = true;
            if state.autoplay {
                state.events.push_back(BackendEvent::Started);
            }
        }
    }

    fn pause(&mut self) {
        let mut state = self.state.lock();
        state.commands.push(BackendCommand::Pause);
        state.playing = false;
    }

    fn set_position(&mut self, seconds: f64) {
        let mut state = self.state.lock();
        state.commands.push(BackendCommand::Seek(seconds));
        let duration = state.duration;
        state.position = if duration.is_finite() {
            seconds.max(0.0).min(duration.max(0.0))
        } else {
            seconds.max(0.0)
        };
    }

    fn position(&self) -> f64 {
        self.state.lock().position
    }

    fn duration(&self) -> f64 {
        self.state.lock().duration
    }

    fn is_playing(&self) -> bool {
        self.state.lock().playing
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url() -> Url {
        Url::parse("https://example.com/a.mp4").unwrap()
    }

    #[test]
    fn autoplay_answers_each_command() {
        let mut backend = ScriptedBackend::autoplay(10.0);
        backend.load(&url());
        assert_eq!(backend.take_events(), vec![BackendEvent::Ready]);
        assert_eq!(backend.duration(), 10.0);

        backend.play();
        assert_eq!(backend.take_events(), vec![BackendEvent::Started]);

        backend.advance(4.0);
        assert_eq!(backend.position(), 4.0);
        backend.advance(7.0);
        assert_eq!(backend.position(), 10.0);
        assert!(!backend.is_playing());
        assert_eq!(backend.take_events(), vec![BackendEvent::Ended]);
    }

    #[test]
    fn live_media_never_ends_on_its_own() {
        let mut backend = ScriptedBackend::autoplay(f64::INFINITY);
        backend.load(&url());
        backend.play();
        backend.take_events();

        backend.advance(10_000.0);
        assert!(backend.is_playing());
        assert!(backend.take_events().is_empty());
    }

    #[test]
    fn failing_loads_report_errors() {
        let mut backend = ScriptedBackend::autoplay(10.0);
        backend.fail_next_loads(1, VideoErrorCode::RateLimited);

        backend.load(&url());
        assert_eq!(
            backend.take_events(),
            vec![BackendEvent::Error(VideoErrorCode::RateLimited)]
        );
        backend.load(&url());
        assert_eq!(backend.take_events(), vec![BackendEvent::Ready]);
    }

    #[test]
    fn manual_mode_only_logs() {
        let mut backend = ScriptedBackend::manual(10.0);
        backend.load(&url());
        backend.play();
        backend.set_position(3.0);

        assert!(backend.take_events().is_empty());
        assert_eq!(
            backend.take_commands(),
            vec![
                BackendCommand::Load(url()),
                BackendCommand::Play,
                BackendCommand::Seek(3.0)
            ]
        );
    }
}

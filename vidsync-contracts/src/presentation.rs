use vidsync_model::{PlayerState, ScreenMode, SourceKind, VideoErrorCode};

/// Downstream observer of player transitions (screens, audio sources).
///
/// Fire-and-forget: nothing a sink does feeds back into playback state.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait PresentationSink: Send {
    fn on_state_changed(&mut self, state: PlayerState);

    fn on_video_error(&mut self, code: VideoErrorCode);

    fn on_source_changed(&mut self, source: SourceKind);

    fn on_screen_mode(&mut self, _mode: ScreenMode) {}

    fn on_audio_start(&mut self) {}

    fn on_audio_stop(&mut self) {}
}

use url::Url;
use vidsync_model::VideoErrorCode;

/// Video decoding/transport backend driven by the player.
///
/// Commands return immediately; the backend reports progress later through
/// [`BackendEvent`]s that the embedder forwards to the player.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait MediaBackend: Send {
    fn load(&mut self, url: &Url);

    fn stop(&mut self);

    fn play(&mut self);

    fn pause(&mut self);

    /// Seek to `seconds` from the start of the stream.
    fn set_position(&mut self, seconds: f64);

    fn position(&self) -> f64;

    /// Stream duration in seconds. Live streams report infinity, NaN or a
    /// value of one second or less.
    fn duration(&self) -> f64;

    fn is_playing(&self) -> bool;
}

/// Asynchronous callbacks emitted by a [`MediaBackend`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackendEvent {
    /// The URL finished loading.
    Ready,
    /// Playback actually began.
    Started,
    /// End of stream. Live streams may report this right after `Started`.
    Ended,
    Error(VideoErrorCode),
}

/// Command vocabulary of the backend contract, as issued by the core.
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCommand {
    Load(Url),
    Stop,
    Play,
    Pause,
    Seek(f64),
}

impl BackendCommand {
    /// Issue this command against a backend.
    pub fn dispatch<B>(&self, backend: &mut B)
    where
        B: MediaBackend + ?Sized,
    {
        match self {
            BackendCommand::Load(url) => backend.load(url),
            BackendCommand::Stop => backend.stop(),
            BackendCommand::Play => backend.play(),
            BackendCommand::Pause => backend.pause(),
            BackendCommand::Seek(seconds) => backend.set_position(*seconds),
        }
    }
}

use url::Url;

use crate::generation::Generation;

/// Network-clock timestamp at which position 0 of the stream corresponds.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "at", rename_all = "snake_case"))]
pub enum StartTime {
    /// Nothing is playing.
    #[default]
    Cleared,
    /// A load was committed but the owner has not confirmed playback yet.
    Pending,
    /// Playback position 0 maps to this network time (seconds).
    At(f64),
}

impl StartTime {
    /// Seconds of playback the session expects at network time `now`.
    ///
    /// `None` while no start time is known; the value is not clamped.
    pub fn elapsed(&self, now: f64) -> Option<f64> {
        match self {
            StartTime::At(start) => Some(now - start),
            StartTime::Cleared | StartTime::Pending => None,
        }
    }
}

/// The replicated playback record: written by the owner, read by everyone.
///
/// The transport carries it as one unit; peers never observe a partial update.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct PlaybackRecord {
    /// Currently targeted media; `None` means no media.
    pub url: Option<Url>,
    pub generation: Generation,
    /// Set once the owner's backend confirmed playback of `generation`.
    pub owner_playing: bool,
    pub start_time: StartTime,
    /// Bars non-privileged peers from taking control.
    pub locked: bool,
}

impl Default for PlaybackRecord {
    /// Records start locked until the owner publishes its configured lock state.
    fn default() -> Self {
        Self {
            url: None,
            generation: Generation::ZERO,
            owner_playing: false,
            start_time: StartTime::Cleared,
            locked: true,
        }
    }
}

impl PlaybackRecord {
    pub fn has_media(&self) -> bool {
        self.url.is_some()
    }

    pub fn url_str(&self) -> &str {
        self.url.as_ref().map(Url::as_str).unwrap_or("")
    }

    /// Commit a new media load. Clears the go-ahead until the owner starts.
    pub fn commit_media(&mut self, url: Url, generation: Generation) {
        self.url = Some(url);
        self.generation = generation;
        self.owner_playing = false;
        self.start_time = StartTime::Pending;
    }

    pub fn mark_owner_started(&mut self, start_time: f64) {
        self.owner_playing = true;
        self.start_time = StartTime::At(start_time);
    }

    pub fn mark_owner_stopped(&mut self) {
        self.owner_playing = false;
        self.start_time = StartTime::Cleared;
    }

    /// Reset to empty/stopped. The generation is kept so peers never regress.
    pub fn clear(&mut self) {
        self.url = None;
        self.mark_owner_stopped();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pending_start_time_has_no_elapsed() {
        assert_eq!(StartTime::Pending.elapsed(100.0), None);
        assert_eq!(StartTime::Cleared.elapsed(100.0), None);
        assert_eq!(StartTime::At(40.0).elapsed(100.0), Some(60.0));
    }

    #[test]
    fn clear_keeps_generation_and_lock() {
        let mut record = PlaybackRecord {
            locked: false,
            ..PlaybackRecord::default()
        };
        let url = Url::parse("https://example.com/video.mp4").unwrap();
        record.commit_media(url, Generation::new(7));
        record.mark_owner_started(12.0);

        record.clear();

        assert!(!record.has_media());
        assert!(!record.owner_playing);
        assert_eq!(record.start_time, StartTime::Cleared);
        assert_eq!(record.generation, Generation::new(7));
        assert!(!record.locked);
    }

    #[test]
    fn commit_media_resets_go_ahead() {
        let mut record = PlaybackRecord::default();
        record.owner_playing = true;
        record.start_time = StartTime::At(1.0);

        let url = Url::parse("https://youtu.be/abc").unwrap();
        record.commit_media(url, Generation::new(1));

        assert!(!record.owner_playing);
        assert_eq!(record.start_time, StartTime::Pending);
        assert_eq!(record.url_str(), "https://youtu.be/abc");
    }

    #[cfg(feature = "serde")]
    #[test]
    fn record_survives_json() {
        let mut record = PlaybackRecord::default();
        record.commit_media(
            Url::parse("https://example.com/a.mp4").unwrap(),
            Generation::new(2),
        );
        record.mark_owner_started(50.5);

        let raw = serde_json::to_string(&record).unwrap();
        let back: PlaybackRecord = serde_json::from_str(&raw).unwrap();
        assert_eq!(back, record);
    }
}

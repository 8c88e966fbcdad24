/// Time sources consumed by the player.
#[cfg_attr(feature = "mock", mockall::automock)]
pub trait SessionClock: Send {
    /// Shared network time in seconds. Monotonic and approximately agreed on
    /// by all peers; skew below the sync threshold is tolerated.
    fn network_now(&self) -> f64;

    /// Local monotonic time in seconds, used for retry and deferral timers.
    fn local_now(&self) -> f64;
}

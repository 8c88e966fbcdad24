use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use vidsync_contracts::clock::SessionClock;

/// Hand-advanced clock shared between loopback peers.
///
/// Clones observe the same time. [`skewed`](Self::skewed) derives a clock
/// whose network time runs ahead (or behind) by a fixed amount, the way a
/// peer with an imperfectly synchronized network clock would.
#[derive(Debug, Clone)]
pub struct ManualClock {
    seconds: Arc<AtomicU64>,
    network_skew: f64,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl ManualClock {
    pub fn new(start: f64) -> Self {
        Self {
            seconds: Arc::new(AtomicU64::new(start.to_bits())),
            network_skew: 0.0,
        }
    }

    pub fn skewed(&self, network_skew: f64) -> Self {
        Self {
            seconds: Arc::clone(&self.seconds),
            network_skew,
        }
    }

    pub fn now(&self) -> f64 {
        f64::from_bits(self.seconds.load(Ordering::SeqCst))
    }

    pub fn set(&self, seconds: f64) {
        self.seconds.store(seconds.to_bits(), Ordering::SeqCst);
    }

    pub fn advance(&self, delta: f64) {
        self.set(self.now() + delta);
    }
}

impl SessionClock for ManualClock {
    fn network_now(&self) -> f64 {
        self.now() + self.network_skew
    }

    fn local_now(&self) -> f64 {
        self.now()
    }
}

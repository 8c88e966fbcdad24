/// Monotonic counter distinguishing successive load requests.
///
/// The owner bumps it by one for every URL it commits; a peer that takes
/// control while committing bumps it by two so its load can never collide
/// with one the previous owner published concurrently.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct Generation(pub u64);

impl Generation {
    pub const ZERO: Generation = Generation(0);

    pub fn new(value: u64) -> Self {
        Generation(value)
    }

    /// The generation committed by the next load request.
    pub fn advance(self, acquired_ownership: bool) -> Self {
        let step = if acquired_ownership { 2 } else { 1 };
        Generation(self.0.saturating_add(step))
    }

    /// Whether `self` supersedes the generation a peer already applied.
    pub fn is_newer_than(self, applied: Generation) -> bool {
        self > applied
    }

    pub fn get(self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn owner_advances_by_one_and_taker_by_two() {
        let current = Generation::new(4);
        assert_eq!(current.advance(false), Generation(5));
        assert_eq!(current.advance(true), Generation(6));
    }

    #[test]
    fn equal_generation_is_not_newer() {
        let applied = Generation::new(3);
        assert!(!Generation::new(3).is_newer_than(applied));
        assert!(!Generation::new(2).is_newer_than(applied));
        assert!(Generation::new(5).is_newer_than(applied));
    }
}

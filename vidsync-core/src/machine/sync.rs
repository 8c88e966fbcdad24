//! Clock-derived position math.

/// Streams whose reported end arrives sooner than this after start are
/// assumed to be live connections glitching, not finishing.
pub const LIVE_STREAM_END_GRACE_SECS: f64 = 1.0;

/// Durations at or below this are treated as live streams.
pub const MIN_SEEKABLE_DURATION_SECS: f64 = 1.0;

/// A finite duration above one second means arbitrary seeks are supported.
pub fn is_seekable(duration: f64) -> bool {
    duration.is_finite() && duration > MIN_SEEKABLE_DURATION_SECS
}

/// Position the session expects at `network_now`, clamped to the stream.
pub fn expected_position(network_now: f64, start_time: f64, duration: f64) -> f64 {
    (network_now - start_time).max(0.0).min(duration.max(0.0))
}

/// Corrective seek target, if `position` drifted beyond `threshold`.
pub fn drift_correction(position: f64, expected: f64, threshold: f64) -> Option<f64> {
    ((position - expected).abs() > threshold).then_some(expected)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn live_durations_are_not_seekable() {
        assert!(!is_seekable(f64::INFINITY));
        assert!(!is_seekable(f64::NAN));
        assert!(!is_seekable(1.0));
        assert!(!is_seekable(0.0));
        assert!(is_seekable(1.5));
        assert!(is_seekable(3600.0));
    }

    #[test]
    fn expected_position_is_clamped() {
        assert_eq!(expected_position(200.0, 100.0, 600.0), 100.0);
        assert_eq!(expected_position(90.0, 100.0, 600.0), 0.0);
        assert_eq!(expected_position(900.0, 100.0, 600.0), 600.0);
    }

    #[test]
    fn correction_only_beyond_threshold() {
        assert_eq!(drift_correction(100.5, 100.0, 1.0), None);
        assert_eq!(drift_correction(101.0, 100.0, 1.0), None);
        assert_eq!(drift_correction(101.2, 100.0, 1.0), Some(100.0));
        assert_eq!(drift_correction(97.0, 100.0, 1.0), Some(100.0));
    }

    #[test]
    fn correction_matches_threshold_rule_for_many_positions() {
        let threshold = 1.0;
        let expected = expected_position(1_100.0, 1_000.0, 300.0);
        for tenth in 0..2_000 {
            let position = f64::from(tenth) / 10.0;
            let seeks = drift_correction(position, expected, threshold).is_some();
            assert_eq!(seeks, (position - expected).abs() > threshold, "position {position}");
        }
    }
}

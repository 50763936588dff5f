use std::collections::VecDeque;

use crate::stats::{mean, std_dev};

/// Number of attempts kept per session
pub const HISTORY_CAPACITY: usize = 10;

/// Newest-first log of the current session's reaction times (ms).
#[derive(Debug, Clone)]
pub struct AttemptHistory {
    attempts: VecDeque<f64>,
}

impl AttemptHistory {
    pub fn new() -> Self {
        Self {
            attempts: VecDeque::with_capacity(HISTORY_CAPACITY),
        }
    }

    /// Prepend an attempt, evicting the oldest once full.
    /// Returns false (and records nothing) for non-finite or non-positive values.
    pub fn record(&mut self, duration_ms: f64) -> bool {
        if !duration_ms.is_finite() || duration_ms <= 0.0 {
            return false;
        }
        self.attempts.push_front(duration_ms);
        self.attempts.truncate(HISTORY_CAPACITY);
        true
    }

    /// Start a new session. Best time lives elsewhere and is untouched.
    pub fn reset(&mut self) {
        self.attempts.clear();
    }

    pub fn snapshot(&self) -> Vec<f64> {
        self.attempts.iter().copied().collect()
    }

    pub fn average(&self) -> Option<f64> {
        mean(&self.snapshot())
    }

    pub fn most_recent(&self) -> Option<f64> {
        self.attempts.front().copied()
    }

    pub fn count(&self) -> usize {
        self.attempts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attempts.is_empty()
    }

    /// Spread of the session's reactions; lower is more consistent
    pub fn std_dev(&self) -> Option<f64> {
        std_dev(&self.snapshot())
    }

    /// Quickest reaction of the session, which may differ from the all-time best
    pub fn fastest(&self) -> Option<f64> {
        self.attempts.iter().copied().reduce(f64::min)
    }
}

impl Default for AttemptHistory {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_record_then_most_recent() {
        let mut history = AttemptHistory::new();
        for d in [0.5, 1.0, 220.0, 59_999.9, 60_000.0] {
            assert!(history.record(d));
            assert_eq!(history.most_recent(), Some(d));
        }
    }

    #[test]
    fn test_record_rejects_invalid() {
        let mut history = AttemptHistory::new();
        assert!(!history.record(0.0));
        assert!(!history.record(-3.0));
        assert!(!history.record(f64::NAN));
        assert!(!history.record(f64::INFINITY));
        assert_eq!(history.count(), 0);
    }

    #[test]
    fn test_newest_first_and_capped() {
        let mut history = AttemptHistory::new();
        for i in 1..=11 {
            history.record(i as f64 * 100.0);
        }

        let snapshot = history.snapshot();
        assert_eq!(history.count(), 10);
        assert_eq!(snapshot.len(), 10);
        assert_eq!(snapshot[0], 1100.0);
        assert_eq!(snapshot[9], 200.0);
        assert!(!snapshot.contains(&100.0));
    }

    #[test]
    fn test_average() {
        let mut history = AttemptHistory::new();
        assert_eq!(history.average(), None);

        history.record(100.0);
        history.record(200.0);
        history.record(300.0);
        assert_eq!(history.average(), Some(200.0));
    }

    #[test]
    fn test_average_after_wraparound() {
        let mut history = AttemptHistory::new();
        for _ in 0..25 {
            history.record(250.0);
        }
        assert_eq!(history.count(), 10);
        assert_eq!(history.average(), Some(250.0));
    }

    #[test]
    fn test_reset() {
        let mut history = AttemptHistory::new();
        history.record(180.0);
        history.reset();

        assert!(history.is_empty());
        assert_eq!(history.most_recent(), None);
        assert_eq!(history.average(), None);
        assert!(history.snapshot().is_empty());
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut history = AttemptHistory::new();
        history.record(300.0);
        let snapshot = history.snapshot();
        history.record(200.0);
        assert_eq!(snapshot, vec![300.0]);
    }

    #[test]
    fn test_fastest_and_std_dev() {
        let mut history = AttemptHistory::new();
        assert_eq!(history.fastest(), None);
        assert_eq!(history.std_dev(), None);

        history.record(300.0);
        history.record(200.0);
        history.record(250.0);
        assert_eq!(history.fastest(), Some(200.0));
        assert!(history.std_dev().unwrap() > 0.0);
    }
}

use serde::{Deserialize, Serialize};

/// A span of time in seconds on the canonical audio clock.
///
/// Both bounds are non-negative and `end >= start`. Bounds are treated as
/// closed on both ends: a segment whose boundary equals a turn's boundary
/// counts as contained.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TimeInterval {
    /// Start time in seconds
    pub start: f64,
    /// End time in seconds
    pub end: f64,
}

impl TimeInterval {
    pub fn new(start: f64, end: f64) -> Self {
        debug_assert!(start >= 0.0 && end >= start);
        Self { start, end }
    }

    /// Length of this interval in seconds
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }

    /// Whether `other` lies entirely within this interval
    pub fn contains(&self, other: &TimeInterval) -> bool {
        other.start >= self.start && other.end <= self.end
    }

    /// Length of the intersection with `other`, 0 when disjoint
    pub fn overlap_seconds(&self, other: &TimeInterval) -> f64 {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (end - start).max(0.0)
    }
}

/// Round a time or probability to 2 decimal places for emission
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

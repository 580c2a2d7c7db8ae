use super::TimePoint;

/// Define a time span with a start time and an end time.
///
/// `end >= start` is expected but not enforced.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct TimeSpan {
    /// Start time of the span
    pub start: TimePoint,
    /// End time of the span
    pub end: TimePoint,
}

impl TimeSpan {
    /// Create a new `TimeSpan` from a start and an end.
    #[must_use]
    pub const fn new(start: TimePoint, end: TimePoint) -> Self {
        Self { start, end }
    }

    /// Move both bounds by `msecs` milliseconds, which may be negative.
    /// No clamping is applied.
    pub fn shift(&mut self, msecs: i64) {
        self.start += msecs;
        self.end += msecs;
    }
}

//! Interval conflict checks.
//!
//! Intervals are half-open: a booking ending at 10:00 and one starting at
//! 10:00 do not conflict.

use crate::models::time_slot::Interval;

/// Returns the first interval in `existing` that overlaps `candidate`.
pub fn first_conflict<'a>(candidate: &Interval, existing: &'a [Interval]) -> Option<&'a Interval> {
    existing
        .iter()
        .find(|other| {
            candidate.start_minute() < other.end_minute() && candidate.end_minute() > other.start_minute()
        })
}

/// True if `candidate` overlaps any interval in `existing`.
pub fn overlaps(candidate: &Interval, existing: &[Interval]) -> bool {
    first_conflict(candidate, existing).is_some()
}

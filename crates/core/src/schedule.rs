//! Shift time ranges and conflict detection.
//!
//! Shifts are half-open intervals `[start, end)`. Two shifts of the same
//! employee conflict iff they strictly overlap, so a shift ending at 17:00
//! and another starting at 17:00 do not conflict.
//!
//! The check is advisory: callers run it before writing, and the write
//! path does not re-validate.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::types::{ShiftId, UserId};

/// A half-open time interval with `end > start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "RawTimeRange")]
pub struct TimeRange {
    #[serde(rename = "start_time")]
    start: DateTime<Utc>,
    #[serde(rename = "end_time")]
    end: DateTime<Utc>,
}

#[derive(Deserialize)]
struct RawTimeRange {
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl TryFrom<RawTimeRange> for TimeRange {
    type Error = ValidationError;

    fn try_from(raw: RawTimeRange) -> Result<Self, Self::Error> {
        Self::new(raw.start_time, raw.end_time)
    }
}

impl TimeRange {
    /// Create a range.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvertedTimeRange` unless `end > start`.
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, ValidationError> {
        if end <= start {
            return Err(ValidationError::InvertedTimeRange);
        }
        Ok(Self { start, end })
    }

    #[must_use]
    pub const fn start(&self) -> DateTime<Utc> {
        self.start
    }

    #[must_use]
    pub const fn end(&self) -> DateTime<Utc> {
        self.end
    }

    /// Strict overlap: `self.start < other.end && self.end > other.start`.
    #[must_use]
    pub fn overlaps(&self, other: &Self) -> bool {
        self.start < other.end && self.end > other.start
    }
}

/// A scheduled shift.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Shift {
    pub id: ShiftId,
    pub user_id: UserId,
    #[serde(flatten)]
    pub range: TimeRange,
}

/// Find an existing shift of `user_id` that overlaps `candidate`.
///
/// `exclude` skips one shift id, so an edited shift is not compared with
/// its own previous version. Returns the first overlapping shift in
/// `existing` order.
#[must_use]
pub fn find_conflict<'a>(
    existing: &'a [Shift],
    user_id: UserId,
    candidate: &TimeRange,
    exclude: Option<ShiftId>,
) -> Option<&'a Shift> {
    existing.iter().find(|shift| {
        shift.user_id == user_id
            && Some(shift.id) != exclude
            && shift.range.overlaps(candidate)
    })
}

/// Ids of every shift that overlaps another shift of the same employee.
///
/// Used to flag conflicts on a weekly schedule view.
#[must_use]
pub fn conflicting_shift_ids(shifts: &[Shift]) -> BTreeSet<ShiftId> {
    let mut conflicts = BTreeSet::new();
    for (i, first) in shifts.iter().enumerate() {
        for second in shifts.iter().skip(i + 1) {
            if first.user_id == second.user_id && first.range.overlaps(&second.range) {
                conflicts.insert(first.id);
                conflicts.insert(second.id);
            }
        }
    }
    conflicts
}

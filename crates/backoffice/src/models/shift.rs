//! Shift request and response types.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use madziarynka_core::{Shift, ShiftId, TimeRange, UserId};

/// Request body for creating or moving a shift.
#[derive(Debug, Clone, Deserialize)]
pub struct ShiftInput {
    pub user_id: UserId,
    #[serde(flatten)]
    pub range: TimeRange,
}

/// Request body for an advisory conflict check.
#[derive(Debug, Clone, Deserialize)]
pub struct ConflictCheckInput {
    pub user_id: UserId,
    #[serde(flatten)]
    pub range: TimeRange,
    /// Shift being edited, left out of the comparison.
    #[serde(default)]
    pub exclude_shift_id: Option<ShiftId>,
}

/// Result of a conflict check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConflictCheckResult {
    pub has_conflict: bool,
    pub conflicting_shift: Option<Shift>,
}

impl From<Option<Shift>> for ConflictCheckResult {
    fn from(conflict: Option<Shift>) -> Self {
        Self {
            has_conflict: conflict.is_some(),
            conflicting_shift: conflict,
        }
    }
}

/// Shifts in a schedule window. Ids of shifts that overlap another shift of
/// the same employee are flagged for the weekly view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScheduleOverview {
    pub shifts: Vec<Shift>,
    pub conflicting_shift_ids: BTreeSet<ShiftId>,
}

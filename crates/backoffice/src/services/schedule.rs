//! Staff shifts and the advisory conflict check.
//!
//! `has_conflict` is meant to be called before a write; the write paths
//! themselves do not re-check, so two concurrent edits can still produce
//! overlapping shifts.

use tracing::{info, instrument};

use madziarynka_core::{
    AuditAction, ShiftId, TimeRange, UserId, conflicting_shift_ids, find_conflict,
};

use super::{ServiceError, audit};
use crate::db::{Store, StoreTransaction};
use crate::models::{
    ConflictCheckInput, ConflictCheckResult, ScheduleOverview, Shift, ShiftInput,
};

/// Shift scheduling.
pub struct ScheduleService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> ScheduleService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Find a shift of the same employee that overlaps the candidate range.
    ///
    /// Shifts that merely touch (one ends when the other starts) do not
    /// conflict.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on storage failure.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn has_conflict(
        &self,
        input: ConflictCheckInput,
    ) -> Result<ConflictCheckResult, ServiceError> {
        let mut tx = self.store.begin().await?;
        let shifts = tx.shifts_for_user(input.user_id).await?;
        tx.rollback().await?;

        let conflict = find_conflict(
            &shifts,
            input.user_id,
            &input.range,
            input.exclude_shift_id,
        )
        .cloned();

        Ok(conflict.into())
    }

    /// Every shift overlapping `window`, with the double-booked ones flagged.
    ///
    /// The conflict check is advisory, so overlaps can still be written;
    /// this is where they show up afterwards.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` on storage failure.
    #[instrument(skip(self), fields(start = %window.start(), end = %window.end()))]
    pub async fn schedule_overview(
        &self,
        window: TimeRange,
    ) -> Result<ScheduleOverview, ServiceError> {
        let mut tx = self.store.begin().await?;
        let shifts = tx.shifts_in(&window).await?;
        tx.rollback().await?;

        Ok(ScheduleOverview {
            conflicting_shift_ids: conflicting_shift_ids(&shifts),
            shifts,
        })
    }

    /// Schedule a shift.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the employee does not exist or
    /// storage fails.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn create_shift(
        &self,
        input: ShiftInput,
        acting_user: Option<UserId>,
    ) -> Result<Shift, ServiceError> {
        let mut tx = self.store.begin().await?;
        let shift = tx.insert_shift(input.user_id, &input.range).await?;

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::CreateShift,
            describe(&shift),
        )
        .await;

        tx.commit().await?;

        info!(shift_id = %shift.id, "Shift created");
        Ok(shift)
    }

    /// Move or reassign a shift.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::ShiftNotFound` for an unknown shift.
    #[instrument(skip(self, input), fields(shift_id = %shift_id))]
    pub async fn update_shift(
        &self,
        shift_id: ShiftId,
        input: ShiftInput,
        acting_user: Option<UserId>,
    ) -> Result<Shift, ServiceError> {
        let mut tx = self.store.begin().await?;
        let shift = tx
            .update_shift(shift_id, input.user_id, &input.range)
            .await?
            .ok_or(ServiceError::ShiftNotFound(shift_id))?;

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::UpdateShift,
            describe(&shift),
        )
        .await;

        tx.commit().await?;

        info!(shift_id = %shift_id, "Shift updated");
        Ok(shift)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::ShiftNotFound` for an unknown shift.
    #[instrument(skip(self), fields(shift_id = %shift_id))]
    pub async fn delete_shift(
        &self,
        shift_id: ShiftId,
        acting_user: Option<UserId>,
    ) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;
        let shift = tx
            .shift(shift_id)
            .await?
            .ok_or(ServiceError::ShiftNotFound(shift_id))?;
        tx.delete_shift(shift_id).await?;

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::DeleteShift,
            describe(&shift),
        )
        .await;

        tx.commit().await?;

        info!(shift_id = %shift_id, "Shift deleted");
        Ok(())
    }
}

fn describe(shift: &Shift) -> String {
    format!(
        "shift #{} for user #{}: {} - {}",
        shift.id,
        shift.user_id,
        shift.range.start().format("%Y-%m-%d %H:%M"),
        shift.range.end().format("%Y-%m-%d %H:%M"),
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::{DateTime, TimeZone, Utc};

    use madziarynka_core::TimeRange;

    use super::*;
    use crate::db::MemoryStore;
    use crate::services::testing;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, hour, 0, 0).unwrap()
    }

    fn range(start: u32, end: u32) -> TimeRange {
        TimeRange::new(at(start), at(end)).unwrap()
    }

    fn check(user_id: UserId, start: u32, end: u32) -> ConflictCheckInput {
        ConflictCheckInput {
            user_id,
            range: range(start, end),
            exclude_shift_id: None,
        }
    }

    #[tokio::test]
    async fn test_schedule_overview_flags_double_booking() {
        let store = MemoryStore::new();
        let ola = testing::user(&store, "Ola").await;
        let kuba = testing::user(&store, "Kuba").await;
        let service = ScheduleService::new(&store);
        let mut ids = Vec::new();
        for (user_id, start, end) in [(ola, 9, 17), (ola, 16, 20), (kuba, 10, 18), (ola, 20, 22)] {
            let shift = service
                .create_shift(
                    ShiftInput {
                        user_id,
                        range: range(start, end),
                    },
                    None,
                )
                .await
                .unwrap();
            ids.push(shift.id);
        }

        let overview = service.schedule_overview(range(8, 21)).await.unwrap();

        assert_eq!(overview.shifts.len(), 4);
        let flagged: Vec<_> = overview.conflicting_shift_ids.into_iter().collect();
        let double_booked: Vec<_> = ids.iter().copied().take(2).collect();
        assert_eq!(flagged, double_booked);

        let morning = service.schedule_overview(range(6, 9)).await.unwrap();
        assert!(morning.shifts.is_empty());
    }

    #[tokio::test]
    async fn test_overlapping_shift_is_reported() {
        let store = MemoryStore::new();
        let ola = testing::user(&store, "Ola").await;
        let service = ScheduleService::new(&store);
        let existing = service
            .create_shift(
                ShiftInput {
                    user_id: ola,
                    range: range(9, 17),
                },
                Some(ola),
            )
            .await
            .unwrap();

        let result = service.has_conflict(check(ola, 16, 20)).await.unwrap();

        assert!(result.has_conflict);
        assert_eq!(result.conflicting_shift.unwrap().id, existing.id);
    }

    #[tokio::test]
    async fn test_adjacent_shift_does_not_conflict() {
        let store = MemoryStore::new();
        let ola = testing::user(&store, "Ola").await;
        let service = ScheduleService::new(&store);
        service
            .create_shift(
                ShiftInput {
                    user_id: ola,
                    range: range(9, 17),
                },
                None,
            )
            .await
            .unwrap();

        let result = service.has_conflict(check(ola, 17, 21)).await.unwrap();

        assert!(!result.has_conflict);
        assert!(result.conflicting_shift.is_none());
    }

    #[tokio::test]
    async fn test_other_employee_does_not_conflict() {
        let store = MemoryStore::new();
        let ola = testing::user(&store, "Ola").await;
        let kuba = testing::user(&store, "Kuba").await;
        let service = ScheduleService::new(&store);
        service
            .create_shift(
                ShiftInput {
                    user_id: ola,
                    range: range(9, 17),
                },
                None,
            )
            .await
            .unwrap();

        let result = service.has_conflict(check(kuba, 10, 12)).await.unwrap();

        assert!(!result.has_conflict);
    }

    #[tokio::test]
    async fn test_edited_shift_is_excluded() {
        let store = MemoryStore::new();
        let ola = testing::user(&store, "Ola").await;
        let service = ScheduleService::new(&store);
        let shift = service
            .create_shift(
                ShiftInput {
                    user_id: ola,
                    range: range(9, 17),
                },
                None,
            )
            .await
            .unwrap();

        let mut input = check(ola, 10, 18);
        input.exclude_shift_id = Some(shift.id);
        assert!(!service.has_conflict(input).await.unwrap().has_conflict);
    }

    #[tokio::test]
    async fn test_update_and_delete_shift() {
        let store = MemoryStore::new();
        let ola = testing::user(&store, "Ola").await;
        let service = ScheduleService::new(&store);
        let shift = service
            .create_shift(
                ShiftInput {
                    user_id: ola,
                    range: range(9, 17),
                },
                Some(ola),
            )
            .await
            .unwrap();

        let moved = service
            .update_shift(
                shift.id,
                ShiftInput {
                    user_id: ola,
                    range: range(12, 20),
                },
                Some(ola),
            )
            .await
            .unwrap();
        assert_eq!(moved.range.start(), at(12));

        service.delete_shift(shift.id, Some(ola)).await.unwrap();
        let err = service.delete_shift(shift.id, Some(ola)).await.unwrap_err();
        assert!(matches!(err, ServiceError::ShiftNotFound(_)));

        let actions: Vec<_> = store
            .logs()
            .await
            .into_iter()
            .map(|entry| entry.action)
            .collect();
        assert_eq!(actions, ["CREATE_SHIFT", "UPDATE_SHIFT", "DELETE_SHIFT"]);
    }

    #[tokio::test]
    async fn test_update_unknown_shift() {
        let store = MemoryStore::new();
        let ola = testing::user(&store, "Ola").await;

        let err = ScheduleService::new(&store)
            .update_shift(
                ShiftId::new(3),
                ShiftInput {
                    user_id: ola,
                    range: range(9, 10),
                },
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ShiftNotFound(_)));
    }
}

//! Schedule handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};

use madziarynka_core::{ShiftId, TimeRange};

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::ActingUser;
use crate::models::{
    ConflictCheckInput, ConflictCheckResult, ScheduleOverview, Shift, ShiftInput,
};
use crate::services::ScheduleService;
use crate::state::AppState;

/// # Errors
///
/// Returns 409 if the employee does not exist.
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Json(input): Json<ShiftInput>,
) -> Result<(StatusCode, Json<Shift>), AppError> {
    let shift = ScheduleService::new(state.store())
        .create_shift(input, user)
        .await?;
    Ok((StatusCode::CREATED, Json(shift)))
}

/// # Errors
///
/// Returns 404 for an unknown shift.
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<ShiftId>,
    Json(input): Json<ShiftInput>,
) -> Result<Json<Shift>, AppError> {
    let shift = ScheduleService::new(state.store())
        .update_shift(id, input, user)
        .await?;
    Ok(Json(shift))
}

/// # Errors
///
/// Returns 404 for an unknown shift.
pub async fn delete<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<ShiftId>,
) -> Result<StatusCode, AppError> {
    ScheduleService::new(state.store())
        .delete_shift(id, user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Advisory overlap check, run by the scheduler UI before saving.
///
/// # Errors
///
/// Returns 500 if storage fails.
pub async fn check_conflicts<S: Store>(
    State(state): State<AppState<S>>,
    Json(input): Json<ConflictCheckInput>,
) -> Result<Json<ConflictCheckResult>, AppError> {
    let result = ScheduleService::new(state.store())
        .has_conflict(input)
        .await?;
    Ok(Json(result))
}

/// Shifts in a window (`?start_time=…&end_time=…`), double bookings flagged.
///
/// # Errors
///
/// Returns 400 for a missing or inverted window.
pub async fn overview<S: Store>(
    State(state): State<AppState<S>>,
    Query(window): Query<TimeRange>,
) -> Result<Json<ScheduleOverview>, AppError> {
    let overview = ScheduleService::new(state.store())
        .schedule_overview(window)
        .await?;
    Ok(Json(overview))
}

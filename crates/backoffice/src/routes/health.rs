//! Health check handlers.

use axum::{extract::State, http::StatusCode};

use crate::db::Store;
use crate::error::AppError;
use crate::state::AppState;

/// Liveness health check endpoint.
///
/// Returns "ok" if the server is running. Does not check dependencies.
pub async fn health() -> &'static str {
    "ok"
}

/// Readiness health check endpoint.
///
/// # Errors
///
/// Returns 503 Service Unavailable if storage is not reachable.
pub async fn readiness<S: Store>(
    State(state): State<AppState<S>>,
) -> Result<StatusCode, AppError> {
    state.store().ping().await.map_err(|e| {
        tracing::warn!(error = %e, "Readiness check failed");
        AppError::Unavailable
    })?;
    Ok(StatusCode::OK)
}

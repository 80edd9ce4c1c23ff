//! Unified error handling for the back office.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

use madziarynka_core::UserId;

use crate::db::RepositoryError;
use crate::services::ServiceError;

/// Application-level error type for HTTP handlers.
#[derive(Debug, Error)]
pub enum AppError {
    /// A service operation failed.
    #[error(transparent)]
    Service(#[from] ServiceError),

    /// Request carried no acting user where one is required.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Storage is not reachable.
    #[error("Service unavailable")]
    Unavailable,
}

impl From<RepositoryError> for AppError {
    fn from(e: RepositoryError) -> Self {
        Self::Service(ServiceError::Repository(e))
    }
}

impl AppError {
    /// HTTP status for this error.
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        match self {
            Self::Service(e) => match e {
                ServiceError::Validation(_)
                | ServiceError::IngredientNotFound(_)
                | ServiceError::Repository(RepositoryError::OutOfRange(_))
                | ServiceError::CompletionFailed(RepositoryError::OutOfRange(_)) => {
                    StatusCode::BAD_REQUEST
                }
                ServiceError::OrderNotFoundOrEmpty(_)
                | ServiceError::OrderNotFound(_)
                | ServiceError::ProductNotFound(_)
                | ServiceError::ShiftNotFound(_)
                | ServiceError::Repository(RepositoryError::NotFound) => StatusCode::NOT_FOUND,
                ServiceError::OrderAlreadyCompleted(_)
                | ServiceError::OrderNotOpen { .. }
                | ServiceError::Repository(RepositoryError::Conflict(_)) => StatusCode::CONFLICT,
                ServiceError::CompletionFailed(_) | ServiceError::Repository(_) => {
                    StatusCode::INTERNAL_SERVER_ERROR
                }
            },
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Back-office request error"
            );
        }

        // Don't expose internal error details to clients
        let message = match &self {
            Self::Service(ServiceError::Repository(RepositoryError::Conflict(_))) => {
                "Referenced record does not exist".to_string()
            }
            _ if status == StatusCode::INTERNAL_SERVER_ERROR => {
                "Internal server error".to_string()
            }
            _ => self.to_string(),
        };

        (status, Json(json!({ "error": message }))).into_response()
    }
}

/// Set the Sentry user context from the acting user.
pub fn set_sentry_user(user_id: UserId) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            ..Default::default()
        }));
    });
}

//! Acting-user extractors.
//!
//! PIN verification happens in an external gateway, which forwards the
//! verified staff id in the `X-Acting-User` header. These extractors only
//! read that header; they never authenticate anyone themselves.

use axum::{extract::FromRequestParts, http::request::Parts};

use madziarynka_core::UserId;

use crate::error::{AppError, set_sentry_user};

/// Header carrying the verified staff id.
pub const ACTING_USER_HEADER: &str = "x-acting-user";

/// Extractor for the optional acting user.
///
/// A missing header yields `None` (the operation runs, its audit entry is
/// skipped). A present but malformed header is rejected with 400.
///
/// # Example
///
/// ```rust,ignore
/// async fn handler(ActingUser(user): ActingUser) -> impl IntoResponse {
///     match user {
///         Some(id) => format!("Hello, #{id}!"),
///         None => "Hello, anonymous!".to_string(),
///     }
/// }
/// ```
pub struct ActingUser(pub Option<UserId>);

impl<S> FromRequestParts<S> for ActingUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let Some(value) = parts.headers.get(ACTING_USER_HEADER) else {
            return Ok(Self(None));
        };

        let user_id = value
            .to_str()
            .ok()
            .and_then(|raw| raw.trim().parse::<i32>().ok())
            .filter(|id| *id > 0)
            .map(UserId::new)
            .ok_or_else(|| {
                AppError::BadRequest(format!("{ACTING_USER_HEADER} must be a positive integer"))
            })?;

        set_sentry_user(user_id);
        Ok(Self(Some(user_id)))
    }
}

/// Extractor that requires an acting user.
///
/// Used where the user id is part of the data, not just the audit trail
/// (an order records who took it).
pub struct RequireUser(pub UserId);

impl<S> FromRequestParts<S> for RequireUser
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let ActingUser(user) = ActingUser::from_request_parts(parts, state).await?;
        user.map(Self).ok_or_else(|| {
            AppError::Unauthorized(format!("missing {ACTING_USER_HEADER} header"))
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::http::{Request, StatusCode};
    use axum::response::IntoResponse;

    use super::*;

    async fn extract(header: Option<&str>) -> Result<ActingUser, AppError> {
        let mut builder = Request::builder().uri("/api/orders");
        if let Some(value) = header {
            builder = builder.header(ACTING_USER_HEADER, value);
        }
        let (mut parts, ()) = builder.body(()).unwrap().into_parts();
        ActingUser::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_missing_header_is_anonymous() {
        let ActingUser(user) = extract(None).await.unwrap();
        assert!(user.is_none());
    }

    #[tokio::test]
    async fn test_header_is_parsed() {
        let ActingUser(user) = extract(Some(" 12 ")).await.unwrap();
        assert_eq!(user, Some(UserId::new(12)));
    }

    #[tokio::test]
    async fn test_malformed_header_is_rejected() {
        for raw in ["abc", "0", "-4", ""] {
            let err = extract(Some(raw)).await.err().unwrap();
            assert_eq!(err.into_response().status(), StatusCode::BAD_REQUEST);
        }
    }

    #[tokio::test]
    async fn test_require_user_without_header() {
        let (mut parts, ()) = Request::builder()
            .uri("/api/orders")
            .body(())
            .unwrap()
            .into_parts();
        let err = RequireUser::from_request_parts(&mut parts, &())
            .await
            .err()
            .unwrap();
        assert_eq!(err.into_response().status(), StatusCode::UNAUTHORIZED);
    }
}

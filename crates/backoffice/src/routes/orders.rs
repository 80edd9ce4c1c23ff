//! Order handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use madziarynka_core::OrderId;

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::{ActingUser, RequireUser};
use crate::models::{CreateOrderInput, Order, OrderDetails, UpdateOrderInput};
use crate::services::OrderService;
use crate::state::AppState;

/// Place an order for the acting user.
///
/// # Errors
///
/// Returns 401 without an acting user, 400 for an empty or invalid line
/// list, 404 for an unknown product.
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    RequireUser(user_id): RequireUser,
    Json(input): Json<CreateOrderInput>,
) -> Result<(StatusCode, Json<OrderDetails>), AppError> {
    let details = OrderService::new(state.store())
        .create_order(user_id, input)
        .await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// # Errors
///
/// Returns 404 if the order does not exist.
pub async fn show<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<OrderId>,
) -> Result<Json<OrderDetails>, AppError> {
    let details = OrderService::new(state.store()).order_details(id).await?;
    Ok(Json(details))
}

/// Replace the lines of an open order.
///
/// # Errors
///
/// Returns 404 for an unknown order, 409 once it is no longer open.
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<OrderId>,
    Json(input): Json<UpdateOrderInput>,
) -> Result<Json<OrderDetails>, AppError> {
    let details = OrderService::new(state.store())
        .update_order(id, input, user)
        .await?;
    Ok(Json(details))
}

/// Fulfill an order.
///
/// # Errors
///
/// Returns 404 for a missing or empty order, 409 if it is already
/// completed or cancelled, 400 if a recipe references a missing
/// ingredient, 500 if storage fails (nothing is changed).
pub async fn complete<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = OrderService::new(state.store())
        .complete_order(id, user)
        .await?;
    Ok(Json(order))
}

/// # Errors
///
/// Returns 404 for an unknown order, 409 once it is no longer open.
pub async fn cancel<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<OrderId>,
) -> Result<Json<Order>, AppError> {
    let order = OrderService::new(state.store())
        .cancel_order(id, user)
        .await?;
    Ok(Json(order))
}

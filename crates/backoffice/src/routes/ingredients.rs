//! Warehouse handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use madziarynka_core::IngredientId;

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::ActingUser;
use crate::models::{
    CreateIngredientInput, IngredientView, RestockInput, UpdateIngredientInput,
};
use crate::services::CatalogService;
use crate::state::AppState;

/// # Errors
///
/// Returns 400 for blank names or a negative nominal stock.
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Json(input): Json<CreateIngredientInput>,
) -> Result<(StatusCode, Json<IngredientView>), AppError> {
    let ingredient = CatalogService::new(state.store())
        .create_ingredient(input, user)
        .await?;
    Ok((StatusCode::CREATED, Json(ingredient.into())))
}

/// # Errors
///
/// Returns 400 for a missing or deactivated ingredient or invalid input.
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<IngredientId>,
    Json(input): Json<UpdateIngredientInput>,
) -> Result<Json<IngredientView>, AppError> {
    let ingredient = CatalogService::new(state.store())
        .update_ingredient(id, input, user)
        .await?;
    Ok(Json(ingredient.into()))
}

/// # Errors
///
/// Returns 400 for an unknown ingredient.
pub async fn deactivate<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<IngredientId>,
) -> Result<StatusCode, AppError> {
    CatalogService::new(state.store())
        .deactivate_ingredient(id, user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Apply a signed stock correction.
///
/// # Errors
///
/// Returns 400 for a missing or deactivated ingredient.
pub async fn restock<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<IngredientId>,
    Json(input): Json<RestockInput>,
) -> Result<Json<IngredientView>, AppError> {
    let ingredient = CatalogService::new(state.store())
        .restock(id, input, user)
        .await?;
    Ok(Json(ingredient.into()))
}

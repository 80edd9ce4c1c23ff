//! Menu handlers.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};

use madziarynka_core::ProductId;

use crate::db::Store;
use crate::error::AppError;
use crate::middleware::ActingUser;
use crate::models::{ProductBomEntry, ProductDetails, ProductInput};
use crate::services::CatalogService;
use crate::state::AppState;

/// # Errors
///
/// Returns 400 for invalid fields, an invalid recipe, or a missing
/// ingredient.
pub async fn create<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Json(input): Json<ProductInput>,
) -> Result<(StatusCode, Json<ProductDetails>), AppError> {
    let details = CatalogService::new(state.store())
        .create_product(input, user)
        .await?;
    Ok((StatusCode::CREATED, Json(details)))
}

/// Update a product and replace its whole recipe.
///
/// # Errors
///
/// Returns 404 for an unknown product, 400 for invalid input. Nothing is
/// saved on error.
pub async fn update<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<ProductId>,
    Json(input): Json<ProductInput>,
) -> Result<Json<ProductDetails>, AppError> {
    let details = CatalogService::new(state.store())
        .update_product(id, input, user)
        .await?;
    Ok(Json(details))
}

/// # Errors
///
/// Returns 404 for an unknown product.
pub async fn hide<S: Store>(
    State(state): State<AppState<S>>,
    ActingUser(user): ActingUser,
    Path(id): Path<ProductId>,
) -> Result<StatusCode, AppError> {
    CatalogService::new(state.store())
        .hide_product(id, user)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

/// # Errors
///
/// Returns 404 for an unknown product.
pub async fn ingredients<S: Store>(
    State(state): State<AppState<S>>,
    Path(id): Path<ProductId>,
) -> Result<Json<Vec<ProductBomEntry>>, AppError> {
    let entries = CatalogService::new(state.store()).product_bom(id).await?;
    Ok(Json(entries))
}

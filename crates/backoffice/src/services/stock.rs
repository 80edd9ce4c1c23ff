//! The stock ledger.
//!
//! `adjust_stock` is the only path that changes an ingredient's on-hand
//! quantity. It runs inside a caller-managed transaction and never
//! commits; fulfillment and warehouse corrections both go through it.

use rust_decimal::Decimal;
use tracing::{debug, warn};

use madziarynka_core::IngredientId;

use super::ServiceError;
use crate::db::StoreTransaction;

/// Add `delta` to an ingredient's stock and return the new quantity.
///
/// There is no lower bound: overselling drives stock negative and is
/// reported, not refused.
///
/// # Errors
///
/// Returns `ServiceError::IngredientNotFound` if the ingredient is missing
/// or deactivated, `ServiceError::Repository` on storage failure.
pub async fn adjust_stock<T: StoreTransaction>(
    tx: &mut T,
    ingredient_id: IngredientId,
    delta: Decimal,
) -> Result<Decimal, ServiceError> {
    let remaining = tx
        .adjust_stock(ingredient_id, delta)
        .await?
        .ok_or(ServiceError::IngredientNotFound(ingredient_id))?;

    debug!(ingredient_id = %ingredient_id, delta = %delta, remaining = %remaining, "Stock adjusted");
    if remaining < Decimal::ZERO {
        warn!(ingredient_id = %ingredient_id, remaining = %remaining, "Ingredient stock is negative");
    }

    Ok(remaining)
}

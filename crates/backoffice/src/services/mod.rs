//! Business logic services for the back office.
//!
//! # Services
//!
//! - `orders` - Order lifecycle and fulfillment (BOM-driven stock deduction)
//! - `catalog` - Menu products, recipes and warehouse ingredients
//! - `stock` - The stock ledger mutator
//! - `schedule` - Shifts and the advisory conflict check
//! - `audit` - Failure-isolated audit log writes
//!
//! Every service borrows a [`Store`](crate::db::Store) and runs each
//! operation in its own transaction.

pub mod audit;
pub mod catalog;
pub mod orders;
pub mod schedule;
pub mod stock;

use thiserror::Error;

use madziarynka_core::{
    IngredientId, OrderId, OrderStatus, ProductId, ShiftId, ValidationError,
};

use crate::db::RepositoryError;

pub use catalog::CatalogService;
pub use orders::OrderService;
pub use schedule::ScheduleService;

/// Errors returned by service operations.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Input was rejected before touching storage.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The order does not exist or has no lines.
    #[error("order {0} not found or has no items")]
    OrderNotFoundOrEmpty(OrderId),

    #[error("order {0} not found")]
    OrderNotFound(OrderId),

    #[error("order {0} is already completed")]
    OrderAlreadyCompleted(OrderId),

    /// The order left the `open` state and can no longer change.
    #[error("order {id} is {status}, not open")]
    OrderNotOpen { id: OrderId, status: OrderStatus },

    /// Missing or deactivated ingredient.
    #[error("ingredient {0} not found")]
    IngredientNotFound(IngredientId),

    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    #[error("shift {0} not found")]
    ShiftNotFound(ShiftId),

    /// Fulfillment failed in storage and was rolled back.
    #[error("order completion failed: {0}")]
    CompletionFailed(#[source] RepositoryError),

    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

impl ServiceError {
    /// Reclassify storage failures raised during fulfillment.
    #[must_use]
    pub fn into_completion_failure(self) -> Self {
        match self {
            Self::Repository(e) => Self::CompletionFailed(e),
            other => other,
        }
    }
}

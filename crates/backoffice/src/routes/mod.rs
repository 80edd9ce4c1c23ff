//! HTTP route handlers for the back office.
//!
//! # Route Structure
//!
//! ```text
//! GET    /health                        - Liveness check
//! GET    /health/ready                  - Storage readiness check
//!
//! # Orders
//! POST   /api/orders                    - Place an order (requires X-Acting-User)
//! GET    /api/orders/{id}               - Order with lines
//! PUT    /api/orders/{id}               - Replace lines of an open order
//! POST   /api/orders/{id}/complete      - Fulfill: deduct stock, mark completed
//! POST   /api/orders/{id}/cancel        - Cancel an open order
//!
//! # Menu
//! POST   /api/menu                      - Create product with recipe
//! PUT    /api/menu/{id}                 - Update product and replace recipe
//! DELETE /api/menu/{id}                 - Hide product
//! GET    /api/menu/{id}/ingredients     - Recipe with ingredient names
//!
//! # Warehouse
//! POST   /api/ingredients               - Create ingredient
//! PUT    /api/ingredients/{id}          - Edit ingredient (not its stock)
//! DELETE /api/ingredients/{id}          - Deactivate ingredient
//! POST   /api/ingredients/{id}/restock  - Stock correction
//!
//! # Schedule
//! POST   /api/shifts                    - Create shift
//! PUT    /api/shifts/{id}               - Move or reassign shift
//! DELETE /api/shifts/{id}               - Delete shift
//! POST   /api/shifts/check-conflicts    - Advisory overlap check
//! GET    /api/shifts/overview           - Shifts in a window, overlaps flagged
//! ```
//!
//! Every handler is generic over the [`Store`] so the router can be
//! exercised against the in-memory store.

pub mod health;
pub mod ingredients;
pub mod menu;
pub mod orders;
pub mod shifts;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::db::Store;
use crate::state::AppState;

/// Create the order routes router.
pub fn order_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(orders::create::<S>))
        .route("/{id}", get(orders::show::<S>).put(orders::update::<S>))
        .route("/{id}/complete", post(orders::complete::<S>))
        .route("/{id}/cancel", post(orders::cancel::<S>))
}

/// Create the menu routes router.
pub fn menu_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(menu::create::<S>))
        .route("/{id}", put(menu::update::<S>).delete(menu::hide::<S>))
        .route("/{id}/ingredients", get(menu::ingredients::<S>))
}

/// Create the warehouse routes router.
pub fn ingredient_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(ingredients::create::<S>))
        .route(
            "/{id}",
            put(ingredients::update::<S>).delete(ingredients::deactivate::<S>),
        )
        .route("/{id}/restock", post(ingredients::restock::<S>))
}

/// Create the schedule routes router.
pub fn shift_routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/", post(shifts::create::<S>))
        .route("/check-conflicts", post(shifts::check_conflicts::<S>))
        .route("/overview", get(shifts::overview::<S>))
        .route("/{id}", put(shifts::update::<S>).delete(shifts::delete::<S>))
}

/// Create all routes for the back office.
pub fn routes<S: Store>() -> Router<AppState<S>> {
    Router::new()
        .route("/health", get(health::health))
        .route("/health/ready", get(health::readiness::<S>))
        .nest("/api/orders", order_routes())
        .nest("/api/menu", menu_routes())
        .nest("/api/ingredients", ingredient_routes())
        .nest("/api/shifts", shift_routes())
}

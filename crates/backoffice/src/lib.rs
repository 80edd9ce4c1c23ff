//! Madziarynka back office library.
//!
//! Order fulfillment, menu and warehouse maintenance, and shift scheduling
//! for the café, exposed as a library so the HTTP layer and the services
//! can be tested against the in-memory store.
//!
//! # Layers
//!
//! - [`routes`] - axum JSON handlers, thin translation to services
//! - [`services`] - business operations, one transaction each
//! - [`db`] - the [`db::Store`] seam with `PostgreSQL` and in-memory backends
//! - [`models`] - rows and validated request bodies

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::Router;

use crate::db::Store;
use crate::state::AppState;

/// Build the application router with state attached.
pub fn app<S: Store>(state: AppState<S>) -> Router {
    routes::routes().with_state(state)
}

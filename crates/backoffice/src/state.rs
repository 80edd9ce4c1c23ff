//! Application state shared across handlers.

use std::sync::Arc;

use crate::db::{PgStore, Store};

/// Application state shared across all handlers.
///
/// Cheaply cloneable via `Arc`. Generic over the store so the same router
/// runs against `PostgreSQL` in production and the in-memory store in tests.
pub struct AppState<S = PgStore> {
    inner: Arc<AppStateInner<S>>,
}

struct AppStateInner<S> {
    store: S,
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<S: Store> AppState<S> {
    /// Create a new application state.
    #[must_use]
    pub fn new(store: S) -> Self {
        Self {
            inner: Arc::new(AppStateInner { store }),
        }
    }

    /// Get a reference to the store.
    #[must_use]
    pub fn store(&self) -> &S {
        &self.inner.store
    }
}

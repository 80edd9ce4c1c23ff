//! Integration tests for the Madziarynka back office.
//!
//! # Running Tests
//!
//! ```bash
//! # In-memory store and HTTP tests
//! cargo test -p madziarynka-integration-tests
//!
//! # Including PostgreSQL tests (needs a server the user can create databases on)
//! DATABASE_URL=postgres://localhost/madziarynka_test \
//!     cargo test -p madziarynka-integration-tests -- --include-ignored
//! ```
//!
//! # Test Categories
//!
//! - `fulfillment` - Order lifecycle and stock properties on the in-memory store
//! - `api` - HTTP routing, extractors and status mapping
//! - `postgres` - The same properties against `PostgreSQL` (`#[ignore]`d)

#![allow(clippy::missing_panics_doc)]

use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use rust_decimal::Decimal;
use serde_json::Value;
use tower::ServiceExt;

use madziarynka_backoffice::db::{MemoryStore, Store, StoreTransaction};
use madziarynka_backoffice::middleware::ACTING_USER_HEADER;
use madziarynka_backoffice::models::{IngredientFields, NewUser, ProductDraft};
use madziarynka_backoffice::state::AppState;
use madziarynka_core::{BomLine, BomLines, IngredientId, ProductId, UserId, UserRole};

/// The router wired to a fresh in-memory store.
pub struct TestApp {
    pub store: MemoryStore,
    router: Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    #[must_use]
    pub fn new() -> Self {
        let store = MemoryStore::new();
        let router = madziarynka_backoffice::app(AppState::new(store.clone()));
        Self { store, router }
    }

    /// Send one request and return the status with the decoded body.
    ///
    /// Non-JSON bodies come back as `Value::String`, empty ones as
    /// `Value::Null`.
    pub async fn send(
        &self,
        method: Method,
        uri: &str,
        acting_user: Option<UserId>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(user) = acting_user {
            builder = builder.header(ACTING_USER_HEADER, user.to_string());
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .expect("valid request");

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("router is infallible");
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .expect("readable body");

        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }
}

// =============================================================================
// Seeding
// =============================================================================
//
// Generic over the store so the PostgreSQL tests share them.

pub async fn seed_user<S: Store>(store: &S, name: &str) -> UserId {
    let mut tx = store.begin().await.expect("begin");
    let user = tx
        .insert_user(&NewUser {
            name: name.to_owned(),
            role: UserRole::Employee,
        })
        .await
        .expect("insert user");
    tx.commit().await.expect("commit");
    user.id
}

pub async fn seed_ingredient<S: Store>(store: &S, name: &str, stock: i64) -> IngredientId {
    let mut tx = store.begin().await.expect("begin");
    let fields = IngredientFields {
        name: name.to_owned(),
        unit: "g".to_owned(),
        nominal_stock: Decimal::from(1000),
    };
    let ingredient = tx
        .insert_ingredient(&fields, Decimal::from(stock))
        .await
        .expect("insert ingredient");
    tx.commit().await.expect("commit");
    ingredient.id
}

pub async fn seed_product<S: Store>(
    store: &S,
    name: &str,
    price: i64,
    recipe: &[(IngredientId, i64)],
) -> ProductId {
    let bom = BomLines::parse(
        recipe
            .iter()
            .map(|&(ingredient_id, quantity)| BomLine {
                ingredient_id,
                quantity_needed: Decimal::from(quantity),
            })
            .collect(),
    )
    .expect("valid recipe");
    let draft = ProductDraft {
        name: name.to_owned(),
        price: Decimal::from(price),
        group: String::new(),
        bom,
    };

    let mut tx = store.begin().await.expect("begin");
    let product = tx.insert_product(&draft).await.expect("insert product");
    tx.replace_product_bom(product.id, &draft.bom)
        .await
        .expect("insert recipe");
    tx.commit().await.expect("commit");
    product.id
}

/// Committed stock of an ingredient.
pub async fn stock_of<S: Store>(store: &S, id: IngredientId) -> Decimal {
    let mut tx = store.begin().await.expect("begin");
    let ingredient = tx
        .ingredient(id)
        .await
        .expect("read ingredient")
        .expect("ingredient exists");
    tx.rollback().await.expect("rollback");
    ingredient.stock_quantity
}

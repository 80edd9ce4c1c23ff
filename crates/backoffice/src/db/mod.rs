//! Storage for the back office.
//!
//! # Tables
//!
//! - `users` - Staff accounts (foreign-key anchor only)
//! - `ingredients` - Warehouse stock ledger
//! - `products` - Menu
//! - `product_ingredients` - Recipes (bill of materials)
//! - `orders`, `order_items` - Orders and their lines
//! - `shifts` - Staff schedule
//! - `logs` - Append-only audit log
//!
//! # Transactions
//!
//! Services never reach for a global pool. They receive a [`Store`] and
//! open a [`StoreTransaction`] per operation; every read and write of that
//! operation goes through the transaction handle, and nothing is visible to
//! other callers until [`StoreTransaction::commit`]. Dropping a transaction
//! without committing rolls it back.
//!
//! Two implementations exist:
//! - [`PgStore`] - `PostgreSQL` via sqlx
//! - `MemoryStore` - in-process snapshot store (feature `test-store`)
//!
//! # Migrations
//!
//! Migrations are stored in `crates/backoffice/migrations/` and run via:
//! ```bash
//! cargo run -p madziarynka-cli -- migrate
//! ```

#[cfg(any(test, feature = "test-store"))]
pub mod memory;
pub mod postgres;

use std::time::Duration;

use async_trait::async_trait;
use rust_decimal::Decimal;
use secrecy::ExposeSecret;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use thiserror::Error;

use madziarynka_core::{
    BomLine, BomLines, IngredientId, OrderId, OrderLines, OrderStatus, ProductId, Shift, ShiftId,
    TimeRange, UserId,
};

use crate::models::{
    Ingredient, IngredientFields, LogEntry, NewLogEntry, NewUser, Order, OrderItem, Product,
    ProductBomEntry, ProductDraft, User,
};

#[cfg(any(test, feature = "test-store"))]
pub use memory::{Fault, MemoryStore};
pub use postgres::PgStore;

/// Errors that can occur during repository operations.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// Database error from sqlx.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Data in the database is corrupted or invalid.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Requested entity was not found.
    #[error("not found")]
    NotFound,

    /// Constraint violation (e.g., dangling foreign key).
    #[error("constraint violation: {0}")]
    Conflict(String),

    /// A stored amount would exceed its column.
    #[error("value out of range: {0}")]
    OutOfRange(String),

    /// The backend refused the operation (injected failure in tests).
    #[error("storage unavailable: {0}")]
    Unavailable(String),
}

/// A handle that can start transactions.
#[async_trait]
pub trait Store: Send + Sync + 'static {
    /// Transaction type produced by [`Store::begin`].
    type Tx: StoreTransaction;

    /// Start a transaction.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if no connection can be acquired.
    async fn begin(&self) -> Result<Self::Tx, RepositoryError>;

    /// Check that the backend is reachable.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError` if the backend does not answer.
    async fn ping(&self) -> Result<(), RepositoryError>;
}

/// All reads and writes of one unit of work.
///
/// Methods that look up a row by id return `Ok(None)` / `Ok(false)` when
/// the row does not exist; `Err` is reserved for backend failures.
#[async_trait]
pub trait StoreTransaction: Send {
    // =========================================================================
    // Users
    // =========================================================================

    /// Insert a staff member.
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError>;

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Get an ingredient by ID, active or not.
    async fn ingredient(&mut self, id: IngredientId)
    -> Result<Option<Ingredient>, RepositoryError>;

    /// Insert an ingredient with its opening stock.
    async fn insert_ingredient(
        &mut self,
        fields: &IngredientFields,
        opening_stock: Decimal,
    ) -> Result<Ingredient, RepositoryError>;

    /// Overwrite name, unit and nominal stock of an active ingredient.
    async fn update_ingredient(
        &mut self,
        id: IngredientId,
        fields: &IngredientFields,
    ) -> Result<Option<Ingredient>, RepositoryError>;

    /// Flip the soft-delete flag. Returns `false` if the row does not exist.
    async fn set_ingredient_active(
        &mut self,
        id: IngredientId,
        active: bool,
    ) -> Result<bool, RepositoryError>;

    /// Get a product by ID, visible or not.
    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError>;

    /// Insert a product (recipe not included).
    async fn insert_product(&mut self, draft: &ProductDraft) -> Result<Product, RepositoryError>;

    /// Overwrite a product's fields (recipe not included).
    async fn update_product(
        &mut self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, RepositoryError>;

    /// Flip the visibility flag. Returns `false` if the row does not exist.
    async fn set_product_visible(
        &mut self,
        id: ProductId,
        visible: bool,
    ) -> Result<bool, RepositoryError>;

    /// Recipe rows of a product, ordered by ingredient id.
    async fn product_bom(&mut self, id: ProductId) -> Result<Vec<BomLine>, RepositoryError>;

    /// Recipe rows joined with ingredient name and unit.
    async fn product_bom_entries(
        &mut self,
        id: ProductId,
    ) -> Result<Vec<ProductBomEntry>, RepositoryError>;

    /// Delete every recipe row of the product, then insert `bom`.
    async fn replace_product_bom(
        &mut self,
        id: ProductId,
        bom: &BomLines,
    ) -> Result<(), RepositoryError>;

    // =========================================================================
    // Stock ledger
    // =========================================================================

    /// Atomically add `delta` to an active ingredient's stock.
    ///
    /// Returns the new quantity, or `None` if the ingredient does not exist
    /// or is inactive. No lower bound is enforced.
    async fn adjust_stock(
        &mut self,
        id: IngredientId,
        delta: Decimal,
    ) -> Result<Option<Decimal>, RepositoryError>;

    // =========================================================================
    // Orders
    // =========================================================================

    /// Get an order by ID without locking it.
    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Load an order and lock its row until the transaction ends.
    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError>;

    /// Lines of an order, in insertion order.
    async fn order_items(&mut self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError>;

    /// Insert an open order header.
    async fn insert_order(
        &mut self,
        user_id: UserId,
        total_price: Decimal,
    ) -> Result<Order, RepositoryError>;

    /// Insert lines for an order.
    async fn insert_order_items(
        &mut self,
        order_id: OrderId,
        lines: &OrderLines,
    ) -> Result<Vec<OrderItem>, RepositoryError>;

    /// Delete every line of an order, returning how many were removed.
    async fn delete_order_items(&mut self, order_id: OrderId) -> Result<u64, RepositoryError>;

    /// Overwrite the stored total.
    async fn set_order_total(
        &mut self,
        order_id: OrderId,
        total_price: Decimal,
    ) -> Result<(), RepositoryError>;

    /// Conditional status update: `SET status = to WHERE status = from`.
    ///
    /// Returns `false` when no row matched.
    async fn transition_order(
        &mut self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError>;

    // =========================================================================
    // Shifts
    // =========================================================================

    /// Get a shift by ID.
    async fn shift(&mut self, id: ShiftId) -> Result<Option<Shift>, RepositoryError>;

    /// Every shift of one employee, ordered by start time.
    async fn shifts_for_user(&mut self, user_id: UserId) -> Result<Vec<Shift>, RepositoryError>;

    /// Every shift of any employee that overlaps `window`, ordered by start
    /// time.
    async fn shifts_in(&mut self, window: &TimeRange) -> Result<Vec<Shift>, RepositoryError>;

    /// Insert a shift. Overlaps are not checked here.
    async fn insert_shift(
        &mut self,
        user_id: UserId,
        range: &TimeRange,
    ) -> Result<Shift, RepositoryError>;

    /// Move or reassign a shift.
    async fn update_shift(
        &mut self,
        id: ShiftId,
        user_id: UserId,
        range: &TimeRange,
    ) -> Result<Option<Shift>, RepositoryError>;

    /// Delete a shift. Returns `false` if it did not exist.
    async fn delete_shift(&mut self, id: ShiftId) -> Result<bool, RepositoryError>;

    // =========================================================================
    // Audit log
    // =========================================================================

    /// Append an audit entry.
    ///
    /// A failure here leaves the rest of the transaction usable: whatever
    /// the append wrote is undone, nothing else is.
    async fn append_log(&mut self, entry: &NewLogEntry) -> Result<LogEntry, RepositoryError>;

    // =========================================================================
    // Completion
    // =========================================================================

    /// Make every write of this transaction visible.
    async fn commit(self) -> Result<(), RepositoryError>
    where
        Self: Sized;

    /// Discard every write of this transaction.
    async fn rollback(self) -> Result<(), RepositoryError>
    where
        Self: Sized;
}

/// Create a `PostgreSQL` connection pool with sensible defaults.
///
/// # Arguments
///
/// * `database_url` - `PostgreSQL` connection string (wrapped in `SecretString`)
/// * `max_connections` - Upper bound on pooled connections
///
/// # Errors
///
/// Returns `sqlx::Error` if the connection cannot be established.
pub async fn create_pool(
    database_url: &secrecy::SecretString,
    max_connections: u32,
) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .min_connections(1)
        .acquire_timeout(Duration::from_secs(10))
        .connect(database_url.expose_secret())
        .await
}

//! `PostgreSQL` implementation of the storage traits.
//!
//! Queries are built at runtime with `sqlx::query_as::<_, T>` so the crate
//! compiles without a live database.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{Connection, PgPool, Postgres, Transaction};

use madziarynka_core::{
    BomLine, BomLines, IngredientId, OrderId, OrderLines, OrderStatus, ProductId, Shift, ShiftId,
    TimeRange, UserId,
};

use super::{RepositoryError, Store, StoreTransaction};
use crate::models::{
    Ingredient, IngredientFields, LogEntry, NewLogEntry, NewUser, Order, OrderItem, Product,
    ProductBomEntry, ProductDraft, User,
};

/// Store backed by a `PostgreSQL` pool.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    /// Wrap an existing pool.
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// The underlying pool, for migrations and health checks.
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl Store for PgStore {
    type Tx = PgStoreTransaction;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        let tx = self.pool.begin().await?;
        Ok(PgStoreTransaction { tx })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// An open `PostgreSQL` transaction.
#[derive(Debug)]
pub struct PgStoreTransaction {
    tx: Transaction<'static, Postgres>,
}

// =============================================================================
// Internal Row Types
// =============================================================================

#[derive(Debug, sqlx::FromRow)]
struct ShiftRow {
    id: ShiftId,
    user_id: UserId,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
}

impl TryFrom<ShiftRow> for Shift {
    type Error = RepositoryError;

    fn try_from(row: ShiftRow) -> Result<Self, Self::Error> {
        let range = TimeRange::new(row.start_time, row.end_time).map_err(|e| {
            RepositoryError::DataCorruption(format!("shift {}: {e}", row.id))
        })?;
        Ok(Self {
            id: row.id,
            user_id: row.user_id,
            range,
        })
    }
}

/// SQLSTATE `numeric_value_out_of_range`.
const NUMERIC_OUT_OF_RANGE: &str = "22003";

/// Map foreign-key violations to `Conflict`, numeric overflow to
/// `OutOfRange`, everything else to `Database`.
fn map_constraint_error(e: sqlx::Error) -> RepositoryError {
    match e {
        sqlx::Error::Database(ref db_err) if db_err.is_foreign_key_violation() => {
            RepositoryError::Conflict(db_err.constraint().unwrap_or("foreign key").to_owned())
        }
        sqlx::Error::Database(ref db_err)
            if db_err.code().as_deref() == Some(NUMERIC_OUT_OF_RANGE) =>
        {
            RepositoryError::OutOfRange(db_err.message().to_owned())
        }
        other => RepositoryError::Database(other),
    }
}

const INGREDIENT_COLUMNS: &str = "id, name, unit, stock_quantity, nominal_stock, is_active";
const PRODUCT_COLUMNS: &str = r#"id, name, price, "group", is_visible"#;
const ORDER_COLUMNS: &str = "id, user_id, status, total_price, created_at";
const ORDER_ITEM_COLUMNS: &str = "id, order_id, product_id, quantity, price_per_item";
const SHIFT_COLUMNS: &str = "id, user_id, start_time, end_time";

#[async_trait]
impl StoreTransaction for PgStoreTransaction {
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        let row = sqlx::query_as::<_, User>(
            r"
            INSERT INTO users (name, role)
            VALUES ($1, $2)
            RETURNING id, name, role, is_active
            ",
        )
        .bind(&user.name)
        .bind(user.role)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn ingredient(
        &mut self,
        id: IngredientId,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        let row = sqlx::query_as::<_, Ingredient>(&format!(
            "SELECT {INGREDIENT_COLUMNS} FROM ingredients WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn insert_ingredient(
        &mut self,
        fields: &IngredientFields,
        opening_stock: Decimal,
    ) -> Result<Ingredient, RepositoryError> {
        let row = sqlx::query_as::<_, Ingredient>(&format!(
            r"
            INSERT INTO ingredients (name, unit, nominal_stock, stock_quantity)
            VALUES ($1, $2, $3, $4)
            RETURNING {INGREDIENT_COLUMNS}
            "
        ))
        .bind(&fields.name)
        .bind(&fields.unit)
        .bind(fields.nominal_stock)
        .bind(opening_stock)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn update_ingredient(
        &mut self,
        id: IngredientId,
        fields: &IngredientFields,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        let row = sqlx::query_as::<_, Ingredient>(&format!(
            r"
            UPDATE ingredients
            SET name = $2, unit = $3, nominal_stock = $4
            WHERE id = $1 AND is_active
            RETURNING {INGREDIENT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.unit)
        .bind(fields.nominal_stock)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn set_ingredient_active(
        &mut self,
        id: IngredientId,
        active: bool,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE ingredients SET is_active = $2 WHERE id = $1")
            .bind(id)
            .bind(active)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn insert_product(&mut self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r#"
            INSERT INTO products (name, price, "group")
            VALUES ($1, $2, $3)
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(&draft.name)
        .bind(draft.price)
        .bind(&draft.group)
        .fetch_one(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, RepositoryError> {
        let row = sqlx::query_as::<_, Product>(&format!(
            r#"
            UPDATE products
            SET name = $2, price = $3, "group" = $4
            WHERE id = $1
            RETURNING {PRODUCT_COLUMNS}
            "#
        ))
        .bind(id)
        .bind(&draft.name)
        .bind(draft.price)
        .bind(&draft.group)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn set_product_visible(
        &mut self,
        id: ProductId,
        visible: bool,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE products SET is_visible = $2 WHERE id = $1")
            .bind(id)
            .bind(visible)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn product_bom(&mut self, id: ProductId) -> Result<Vec<BomLine>, RepositoryError> {
        let rows = sqlx::query_as::<_, (IngredientId, Decimal)>(
            r"
            SELECT ingredient_id, quantity_needed
            FROM product_ingredients
            WHERE product_id = $1
            ORDER BY ingredient_id
            ",
        )
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(ingredient_id, quantity_needed)| BomLine {
                ingredient_id,
                quantity_needed,
            })
            .collect())
    }

    async fn product_bom_entries(
        &mut self,
        id: ProductId,
    ) -> Result<Vec<ProductBomEntry>, RepositoryError> {
        let rows = sqlx::query_as::<_, ProductBomEntry>(
            r"
            SELECT pi.ingredient_id, pi.quantity_needed,
                   i.name AS ingredient_name, i.unit
            FROM product_ingredients pi
            JOIN ingredients i ON i.id = pi.ingredient_id
            WHERE pi.product_id = $1
            ORDER BY i.name
            ",
        )
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn replace_product_bom(
        &mut self,
        id: ProductId,
        bom: &BomLines,
    ) -> Result<(), RepositoryError> {
        sqlx::query("DELETE FROM product_ingredients WHERE product_id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        for line in bom.as_slice() {
            sqlx::query(
                r"
                INSERT INTO product_ingredients (product_id, ingredient_id, quantity_needed)
                VALUES ($1, $2, $3)
                ",
            )
            .bind(id)
            .bind(line.ingredient_id)
            .bind(line.quantity_needed)
            .execute(&mut *self.tx)
            .await
            .map_err(map_constraint_error)?;
        }

        Ok(())
    }

    async fn adjust_stock(
        &mut self,
        id: IngredientId,
        delta: Decimal,
    ) -> Result<Option<Decimal>, RepositoryError> {
        // Single-statement read-modify-write: the row lock taken here holds
        // until commit, so concurrent deductions serialize instead of racing.
        let quantity = sqlx::query_scalar::<_, Decimal>(
            r"
            UPDATE ingredients
            SET stock_quantity = stock_quantity + $2
            WHERE id = $1 AND is_active
            RETURNING stock_quantity
            ",
        )
        .bind(id)
        .bind(delta)
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_constraint_error)?;

        Ok(quantity)
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(&format!(
            "SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1 FOR UPDATE"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        Ok(row)
    }

    async fn order_items(&mut self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        let rows = sqlx::query_as::<_, OrderItem>(&format!(
            "SELECT {ORDER_ITEM_COLUMNS} FROM order_items WHERE order_id = $1 ORDER BY id"
        ))
        .bind(id)
        .fetch_all(&mut *self.tx)
        .await?;

        Ok(rows)
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        total_price: Decimal,
    ) -> Result<Order, RepositoryError> {
        let row = sqlx::query_as::<_, Order>(&format!(
            r"
            INSERT INTO orders (user_id, status, total_price)
            VALUES ($1, 'open', $2)
            RETURNING {ORDER_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(total_price)
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_constraint_error)?;

        Ok(row)
    }

    async fn insert_order_items(
        &mut self,
        order_id: OrderId,
        lines: &OrderLines,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let item = sqlx::query_as::<_, OrderItem>(&format!(
                r"
                INSERT INTO order_items (order_id, product_id, quantity, price_per_item)
                VALUES ($1, $2, $3, $4)
                RETURNING {ORDER_ITEM_COLUMNS}
                "
            ))
            .bind(order_id)
            .bind(line.product_id)
            .bind(line.quantity)
            .bind(line.unit_price)
            .fetch_one(&mut *self.tx)
            .await
            .map_err(map_constraint_error)?;
            items.push(item);
        }

        Ok(items)
    }

    async fn delete_order_items(&mut self, order_id: OrderId) -> Result<u64, RepositoryError> {
        let result = sqlx::query("DELETE FROM order_items WHERE order_id = $1")
            .bind(order_id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected())
    }

    async fn set_order_total(
        &mut self,
        order_id: OrderId,
        total_price: Decimal,
    ) -> Result<(), RepositoryError> {
        let result = sqlx::query("UPDATE orders SET total_price = $2 WHERE id = $1")
            .bind(order_id)
            .bind(total_price)
            .execute(&mut *self.tx)
            .await?;

        if result.rows_affected() == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    async fn transition_order(
        &mut self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query("UPDATE orders SET status = $3 WHERE id = $1 AND status = $2")
            .bind(id)
            .bind(from)
            .bind(to)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn shift(&mut self, id: ShiftId) -> Result<Option<Shift>, RepositoryError> {
        let row = sqlx::query_as::<_, ShiftRow>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&mut *self.tx)
        .await?;

        row.map(Shift::try_from).transpose()
    }

    async fn shifts_for_user(&mut self, user_id: UserId) -> Result<Vec<Shift>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            "SELECT {SHIFT_COLUMNS} FROM shifts WHERE user_id = $1 ORDER BY start_time"
        ))
        .bind(user_id)
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Shift::try_from).collect()
    }

    async fn shifts_in(&mut self, window: &TimeRange) -> Result<Vec<Shift>, RepositoryError> {
        let rows = sqlx::query_as::<_, ShiftRow>(&format!(
            r"
            SELECT {SHIFT_COLUMNS} FROM shifts
            WHERE start_time < $2 AND end_time > $1
            ORDER BY start_time, id
            "
        ))
        .bind(window.start())
        .bind(window.end())
        .fetch_all(&mut *self.tx)
        .await?;

        rows.into_iter().map(Shift::try_from).collect()
    }

    async fn insert_shift(
        &mut self,
        user_id: UserId,
        range: &TimeRange,
    ) -> Result<Shift, RepositoryError> {
        let row = sqlx::query_as::<_, ShiftRow>(&format!(
            r"
            INSERT INTO shifts (user_id, start_time, end_time)
            VALUES ($1, $2, $3)
            RETURNING {SHIFT_COLUMNS}
            "
        ))
        .bind(user_id)
        .bind(range.start())
        .bind(range.end())
        .fetch_one(&mut *self.tx)
        .await
        .map_err(map_constraint_error)?;

        Shift::try_from(row)
    }

    async fn update_shift(
        &mut self,
        id: ShiftId,
        user_id: UserId,
        range: &TimeRange,
    ) -> Result<Option<Shift>, RepositoryError> {
        let row = sqlx::query_as::<_, ShiftRow>(&format!(
            r"
            UPDATE shifts
            SET user_id = $2, start_time = $3, end_time = $4
            WHERE id = $1
            RETURNING {SHIFT_COLUMNS}
            "
        ))
        .bind(id)
        .bind(user_id)
        .bind(range.start())
        .bind(range.end())
        .fetch_optional(&mut *self.tx)
        .await
        .map_err(map_constraint_error)?;

        row.map(Shift::try_from).transpose()
    }

    async fn delete_shift(&mut self, id: ShiftId) -> Result<bool, RepositoryError> {
        let result = sqlx::query("DELETE FROM shifts WHERE id = $1")
            .bind(id)
            .execute(&mut *self.tx)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn append_log(&mut self, entry: &NewLogEntry) -> Result<LogEntry, RepositoryError> {
        // A failed statement poisons the whole Postgres transaction, so the
        // insert runs behind a savepoint that can be rolled back on its own.
        let mut savepoint = Connection::begin(&mut *self.tx).await?;

        let inserted = sqlx::query_as::<_, LogEntry>(
            r"
            INSERT INTO logs (user_id, action, module, details)
            VALUES ($1, $2, $3, $4)
            RETURNING id, user_id, action, module, details, created_at
            ",
        )
        .bind(entry.user_id)
        .bind(entry.action.as_str())
        .bind(entry.action.module().as_str())
        .bind(&entry.details)
        .fetch_one(&mut *savepoint)
        .await;

        match inserted {
            Ok(row) => {
                savepoint.commit().await?;
                Ok(row)
            }
            Err(e) => {
                savepoint.rollback().await?;
                Err(map_constraint_error(e))
            }
        }
    }

    async fn commit(self) -> Result<(), RepositoryError> {
        self.tx.commit().await?;
        Ok(())
    }

    async fn rollback(self) -> Result<(), RepositoryError> {
        self.tx.rollback().await?;
        Ok(())
    }
}

//! In-process transactional store.
//!
//! Each transaction takes the store lock for its whole lifetime and works
//! on a private copy of the tables, so transactions are fully serialized
//! and a dropped or rolled-back transaction leaves no trace. Foreign keys
//! are checked the way the `PostgreSQL` schema checks them.
//!
//! Failures can be injected per operation with [`Fault`] to exercise the
//! rollback paths.

use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use rust_decimal::Decimal;
use tokio::sync::{Mutex, OwnedMutexGuard};

use madziarynka_core::error::MAX_QUANTITY;
use madziarynka_core::{
    BomLine, BomLines, IngredientId, LogEntryId, OrderId, OrderItemId, OrderLines, OrderStatus,
    ProductId, Shift, ShiftId, TimeRange, UserId,
};

use super::{RepositoryError, Store, StoreTransaction};
use crate::models::{
    Ingredient, IngredientFields, LogEntry, NewLogEntry, NewUser, Order, OrderItem, Product,
    ProductBomEntry, ProductDraft, User,
};

/// An operation that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Fault {
    /// `append_log` fails.
    AuditWrite,
    /// `adjust_stock` fails.
    StockWrite,
    /// `transition_order` fails.
    StatusWrite,
    /// `ping` fails.
    Ping,
}

#[derive(Debug, Clone, Default)]
struct Sequences {
    user: i32,
    ingredient: i32,
    product: i32,
    order: i32,
    order_item: i32,
    shift: i32,
    log: i32,
}

fn next(counter: &mut i32) -> i32 {
    *counter += 1;
    *counter
}

#[derive(Debug, Clone, Default)]
struct Tables {
    users: BTreeMap<UserId, User>,
    ingredients: BTreeMap<IngredientId, Ingredient>,
    products: BTreeMap<ProductId, Product>,
    recipes: BTreeMap<(ProductId, IngredientId), Decimal>,
    orders: BTreeMap<OrderId, Order>,
    order_items: BTreeMap<OrderItemId, OrderItem>,
    shifts: BTreeMap<ShiftId, Shift>,
    logs: Vec<LogEntry>,
    sequences: Sequences,
}

#[derive(Debug, Default)]
struct Inner {
    tables: Tables,
    faults: BTreeSet<Fault>,
}

/// Store holding every table in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Inner>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Make `fault` fail until [`MemoryStore::clear_faults`] is called.
    pub async fn inject(&self, fault: Fault) {
        self.inner.lock().await.faults.insert(fault);
    }

    pub async fn clear_faults(&self) {
        self.inner.lock().await.faults.clear();
    }

    /// Committed state of an ingredient.
    pub async fn ingredient(&self, id: IngredientId) -> Option<Ingredient> {
        self.inner.lock().await.tables.ingredients.get(&id).cloned()
    }

    /// Committed state of an order.
    pub async fn order(&self, id: OrderId) -> Option<Order> {
        self.inner.lock().await.tables.orders.get(&id).cloned()
    }

    /// Committed lines of an order.
    pub async fn order_items(&self, id: OrderId) -> Vec<OrderItem> {
        self.inner
            .lock()
            .await
            .tables
            .order_items
            .values()
            .filter(|item| item.order_id == id)
            .cloned()
            .collect()
    }

    /// Committed recipe of a product, ordered by ingredient id.
    pub async fn recipe(&self, id: ProductId) -> Vec<BomLine> {
        recipe_of(&self.inner.lock().await.tables, id)
    }

    /// Committed audit log, oldest first.
    pub async fn logs(&self) -> Vec<LogEntry> {
        self.inner.lock().await.tables.logs.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    type Tx = MemoryTransaction;

    async fn begin(&self) -> Result<Self::Tx, RepositoryError> {
        let guard = Arc::clone(&self.inner).lock_owned().await;
        let tables = guard.tables.clone();
        Ok(MemoryTransaction { guard, tables })
    }

    async fn ping(&self) -> Result<(), RepositoryError> {
        if self.inner.lock().await.faults.contains(&Fault::Ping) {
            return Err(RepositoryError::Unavailable("ping".to_owned()));
        }
        Ok(())
    }
}

/// A serialized transaction over a private copy of the tables.
#[derive(Debug)]
pub struct MemoryTransaction {
    guard: OwnedMutexGuard<Inner>,
    tables: Tables,
}

impl MemoryTransaction {
    fn check(&self, fault: Fault, operation: &str) -> Result<(), RepositoryError> {
        if self.guard.faults.contains(&fault) {
            return Err(RepositoryError::Unavailable(operation.to_owned()));
        }
        Ok(())
    }

    fn require_user(&self, id: UserId, constraint: &str) -> Result<(), RepositoryError> {
        if self.tables.users.contains_key(&id) {
            Ok(())
        } else {
            Err(RepositoryError::Conflict(constraint.to_owned()))
        }
    }
}

fn recipe_of(tables: &Tables, id: ProductId) -> Vec<BomLine> {
    tables
        .recipes
        .range((id, IngredientId::new(i32::MIN))..=(id, IngredientId::new(i32::MAX)))
        .map(|(&(_, ingredient_id), &quantity_needed)| BomLine {
            ingredient_id,
            quantity_needed,
        })
        .collect()
}

#[async_trait]
impl StoreTransaction for MemoryTransaction {
    async fn insert_user(&mut self, user: &NewUser) -> Result<User, RepositoryError> {
        let id = UserId::new(next(&mut self.tables.sequences.user));
        let row = User {
            id,
            name: user.name.clone(),
            role: user.role,
            is_active: true,
        };
        self.tables.users.insert(id, row.clone());
        Ok(row)
    }

    async fn ingredient(
        &mut self,
        id: IngredientId,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        Ok(self.tables.ingredients.get(&id).cloned())
    }

    async fn insert_ingredient(
        &mut self,
        fields: &IngredientFields,
        opening_stock: Decimal,
    ) -> Result<Ingredient, RepositoryError> {
        let id = IngredientId::new(next(&mut self.tables.sequences.ingredient));
        let row = Ingredient {
            id,
            name: fields.name.clone(),
            unit: fields.unit.clone(),
            stock_quantity: opening_stock,
            nominal_stock: fields.nominal_stock,
            is_active: true,
        };
        self.tables.ingredients.insert(id, row.clone());
        Ok(row)
    }

    async fn update_ingredient(
        &mut self,
        id: IngredientId,
        fields: &IngredientFields,
    ) -> Result<Option<Ingredient>, RepositoryError> {
        Ok(self
            .tables
            .ingredients
            .get_mut(&id)
            .filter(|row| row.is_active)
            .map(|row| {
                row.name.clone_from(&fields.name);
                row.unit.clone_from(&fields.unit);
                row.nominal_stock = fields.nominal_stock;
                row.clone()
            }))
    }

    async fn set_ingredient_active(
        &mut self,
        id: IngredientId,
        active: bool,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .tables
            .ingredients
            .get_mut(&id)
            .map(|row| row.is_active = active)
            .is_some())
    }

    async fn product(&mut self, id: ProductId) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.products.get(&id).cloned())
    }

    async fn insert_product(&mut self, draft: &ProductDraft) -> Result<Product, RepositoryError> {
        let id = ProductId::new(next(&mut self.tables.sequences.product));
        let row = Product {
            id,
            name: draft.name.clone(),
            price: draft.price,
            group: draft.group.clone(),
            is_visible: true,
        };
        self.tables.products.insert(id, row.clone());
        Ok(row)
    }

    async fn update_product(
        &mut self,
        id: ProductId,
        draft: &ProductDraft,
    ) -> Result<Option<Product>, RepositoryError> {
        Ok(self.tables.products.get_mut(&id).map(|row| {
            row.name.clone_from(&draft.name);
            row.price = draft.price;
            row.group.clone_from(&draft.group);
            row.clone()
        }))
    }

    async fn set_product_visible(
        &mut self,
        id: ProductId,
        visible: bool,
    ) -> Result<bool, RepositoryError> {
        Ok(self
            .tables
            .products
            .get_mut(&id)
            .map(|row| row.is_visible = visible)
            .is_some())
    }

    async fn product_bom(&mut self, id: ProductId) -> Result<Vec<BomLine>, RepositoryError> {
        Ok(recipe_of(&self.tables, id))
    }

    async fn product_bom_entries(
        &mut self,
        id: ProductId,
    ) -> Result<Vec<ProductBomEntry>, RepositoryError> {
        let mut entries = recipe_of(&self.tables, id)
            .into_iter()
            .filter_map(|line| {
                self.tables
                    .ingredients
                    .get(&line.ingredient_id)
                    .map(|ingredient| ProductBomEntry {
                        ingredient_id: line.ingredient_id,
                        quantity_needed: line.quantity_needed,
                        ingredient_name: ingredient.name.clone(),
                        unit: ingredient.unit.clone(),
                    })
            })
            .collect::<Vec<_>>();
        entries.sort_by(|a, b| a.ingredient_name.cmp(&b.ingredient_name));
        Ok(entries)
    }

    async fn replace_product_bom(
        &mut self,
        id: ProductId,
        bom: &BomLines,
    ) -> Result<(), RepositoryError> {
        self.tables.recipes.retain(|&(product_id, _), _| product_id != id);

        for line in bom.as_slice() {
            if !self.tables.ingredients.contains_key(&line.ingredient_id) {
                return Err(RepositoryError::Conflict(
                    "product_ingredients_ingredient_id_fkey".to_owned(),
                ));
            }
            self.tables
                .recipes
                .insert((id, line.ingredient_id), line.quantity_needed);
        }

        Ok(())
    }

    async fn adjust_stock(
        &mut self,
        id: IngredientId,
        delta: Decimal,
    ) -> Result<Option<Decimal>, RepositoryError> {
        self.check(Fault::StockWrite, "adjust_stock")?;

        let Some(row) = self
            .tables
            .ingredients
            .get_mut(&id)
            .filter(|row| row.is_active)
        else {
            return Ok(None);
        };

        // Same bound as the NUMERIC(12, 3) column.
        let updated = row
            .stock_quantity
            .checked_add(delta)
            .filter(|quantity| quantity.abs() <= MAX_QUANTITY)
            .ok_or_else(|| RepositoryError::OutOfRange("ingredients.stock_quantity".to_owned()))?;
        row.stock_quantity = updated;
        Ok(Some(updated))
    }

    async fn order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.orders.get(&id).cloned())
    }

    // The whole store is already locked by this transaction.
    async fn lock_order(&mut self, id: OrderId) -> Result<Option<Order>, RepositoryError> {
        Ok(self.tables.orders.get(&id).cloned())
    }

    async fn order_items(&mut self, id: OrderId) -> Result<Vec<OrderItem>, RepositoryError> {
        Ok(self
            .tables
            .order_items
            .values()
            .filter(|item| item.order_id == id)
            .cloned()
            .collect())
    }

    async fn insert_order(
        &mut self,
        user_id: UserId,
        total_price: Decimal,
    ) -> Result<Order, RepositoryError> {
        self.require_user(user_id, "orders_user_id_fkey")?;

        let id = OrderId::new(next(&mut self.tables.sequences.order));
        let row = Order {
            id,
            user_id,
            status: OrderStatus::Open,
            total_price,
            created_at: Utc::now(),
        };
        self.tables.orders.insert(id, row.clone());
        Ok(row)
    }

    async fn insert_order_items(
        &mut self,
        order_id: OrderId,
        lines: &OrderLines,
    ) -> Result<Vec<OrderItem>, RepositoryError> {
        if !self.tables.orders.contains_key(&order_id) {
            return Err(RepositoryError::Conflict(
                "order_items_order_id_fkey".to_owned(),
            ));
        }

        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            if !self.tables.products.contains_key(&line.product_id) {
                return Err(RepositoryError::Conflict(
                    "order_items_product_id_fkey".to_owned(),
                ));
            }
            let id = OrderItemId::new(next(&mut self.tables.sequences.order_item));
            let item = OrderItem {
                id,
                order_id,
                product_id: line.product_id,
                quantity: line.quantity,
                price_per_item: line.unit_price,
            };
            self.tables.order_items.insert(id, item.clone());
            items.push(item);
        }

        Ok(items)
    }

    async fn delete_order_items(&mut self, order_id: OrderId) -> Result<u64, RepositoryError> {
        let before = self.tables.order_items.len();
        self.tables
            .order_items
            .retain(|_, item| item.order_id != order_id);
        Ok(u64::try_from(before - self.tables.order_items.len()).unwrap_or(u64::MAX))
    }

    async fn set_order_total(
        &mut self,
        order_id: OrderId,
        total_price: Decimal,
    ) -> Result<(), RepositoryError> {
        let order = self
            .tables
            .orders
            .get_mut(&order_id)
            .ok_or(RepositoryError::NotFound)?;
        order.total_price = total_price;
        Ok(())
    }

    async fn transition_order(
        &mut self,
        id: OrderId,
        from: OrderStatus,
        to: OrderStatus,
    ) -> Result<bool, RepositoryError> {
        self.check(Fault::StatusWrite, "transition_order")?;

        Ok(self
            .tables
            .orders
            .get_mut(&id)
            .filter(|order| order.status == from)
            .map(|order| order.status = to)
            .is_some())
    }

    async fn shift(&mut self, id: ShiftId) -> Result<Option<Shift>, RepositoryError> {
        Ok(self.tables.shifts.get(&id).cloned())
    }

    async fn shifts_for_user(&mut self, user_id: UserId) -> Result<Vec<Shift>, RepositoryError> {
        let mut shifts = self
            .tables
            .shifts
            .values()
            .filter(|shift| shift.user_id == user_id)
            .cloned()
            .collect::<Vec<_>>();
        shifts.sort_by_key(|shift| shift.range.start());
        Ok(shifts)
    }

    async fn shifts_in(&mut self, window: &TimeRange) -> Result<Vec<Shift>, RepositoryError> {
        let mut shifts = self
            .tables
            .shifts
            .values()
            .filter(|shift| shift.range.overlaps(window))
            .cloned()
            .collect::<Vec<_>>();
        shifts.sort_by_key(|shift| (shift.range.start(), shift.id));
        Ok(shifts)
    }

    async fn insert_shift(
        &mut self,
        user_id: UserId,
        range: &TimeRange,
    ) -> Result<Shift, RepositoryError> {
        self.require_user(user_id, "shifts_user_id_fkey")?;

        let id = ShiftId::new(next(&mut self.tables.sequences.shift));
        let shift = Shift {
            id,
            user_id,
            range: *range,
        };
        self.tables.shifts.insert(id, shift.clone());
        Ok(shift)
    }

    async fn update_shift(
        &mut self,
        id: ShiftId,
        user_id: UserId,
        range: &TimeRange,
    ) -> Result<Option<Shift>, RepositoryError> {
        if !self.tables.shifts.contains_key(&id) {
            return Ok(None);
        }
        self.require_user(user_id, "shifts_user_id_fkey")?;

        Ok(self.tables.shifts.get_mut(&id).map(|shift| {
            shift.user_id = user_id;
            shift.range = *range;
            shift.clone()
        }))
    }

    async fn delete_shift(&mut self, id: ShiftId) -> Result<bool, RepositoryError> {
        Ok(self.tables.shifts.remove(&id).is_some())
    }

    async fn append_log(&mut self, entry: &NewLogEntry) -> Result<LogEntry, RepositoryError> {
        self.check(Fault::AuditWrite, "append_log")?;
        self.require_user(entry.user_id, "logs_user_id_fkey")?;

        let row = LogEntry {
            id: LogEntryId::new(next(&mut self.tables.sequences.log)),
            user_id: Some(entry.user_id),
            action: entry.action.as_str().to_owned(),
            module: entry.action.module().as_str().to_owned(),
            details: entry.details.clone(),
            created_at: Utc::now(),
        };
        self.tables.logs.push(row.clone());
        Ok(row)
    }

    async fn commit(mut self) -> Result<(), RepositoryError> {
        self.guard.tables = self.tables;
        Ok(())
    }

    async fn rollback(self) -> Result<(), RepositoryError> {
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use madziarynka_core::UserRole;

    use super::*;

    fn fields(name: &str) -> IngredientFields {
        IngredientFields {
            name: name.to_owned(),
            unit: "g".to_owned(),
            nominal_stock: Decimal::from(100),
        }
    }

    #[tokio::test]
    async fn test_dropped_transaction_leaves_no_trace() {
        let store = MemoryStore::new();
        {
            let mut tx = store.begin().await.unwrap();
            tx.insert_ingredient(&fields("Kawa"), Decimal::from(10))
                .await
                .unwrap();
        }
        assert!(store.ingredient(IngredientId::new(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_stock_cannot_leave_column_range() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let row = tx
            .insert_ingredient(&fields("Kawa"), MAX_QUANTITY)
            .await
            .unwrap();

        let err = tx.adjust_stock(row.id, Decimal::ONE).await.unwrap_err();
        assert!(matches!(err, RepositoryError::OutOfRange(_)));

        let err = tx.adjust_stock(row.id, Decimal::MAX).await.unwrap_err();
        assert!(matches!(err, RepositoryError::OutOfRange(_)));
        assert_eq!(
            tx.adjust_stock(row.id, Decimal::NEGATIVE_ONE).await.unwrap(),
            Some(MAX_QUANTITY - Decimal::ONE)
        );
    }

    #[tokio::test]
    async fn test_commit_publishes_writes() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let row = tx
            .insert_ingredient(&fields("Kawa"), Decimal::from(10))
            .await
            .unwrap();
        tx.adjust_stock(row.id, Decimal::from(-12)).await.unwrap();
        tx.commit().await.unwrap();

        let stored = store.ingredient(row.id).await.unwrap();
        assert_eq!(stored.stock_quantity, Decimal::from(-2));
    }

    #[tokio::test]
    async fn test_adjust_stock_skips_inactive_ingredient() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let row = tx
            .insert_ingredient(&fields("Kawa"), Decimal::from(10))
            .await
            .unwrap();
        tx.set_ingredient_active(row.id, false).await.unwrap();
        assert_eq!(tx.adjust_stock(row.id, Decimal::ONE).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_order_requires_existing_user() {
        let store = MemoryStore::new();
        let mut tx = store.begin().await.unwrap();
        let err = tx
            .insert_order(UserId::new(42), Decimal::ZERO)
            .await
            .unwrap_err();
        assert!(matches!(err, RepositoryError::Conflict(_)));

        let user = tx
            .insert_user(&NewUser {
                name: "Ola".to_owned(),
                role: UserRole::Employee,
            })
            .await
            .unwrap();
        assert!(tx.insert_order(user.id, Decimal::ZERO).await.is_ok());
    }

    #[tokio::test]
    async fn test_injected_fault_fails_operation() {
        let store = MemoryStore::new();
        store.inject(Fault::Ping).await;
        assert!(store.ping().await.is_err());
        store.clear_faults().await;
        assert!(store.ping().await.is_ok());
    }
}

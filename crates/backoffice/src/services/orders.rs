//! Order lifecycle and fulfillment.
//!
//! Orders move `open → completed` or `open → cancelled` and never back.
//! Completion expands every line through its product's recipe, deducts the
//! aggregated consumption from the stock ledger and flips the status, all
//! in one transaction: either every deduction and the status change land,
//! or none of them do.

use tracing::{info, instrument, warn};

use madziarynka_core::error::money;
use madziarynka_core::{AuditAction, OrderId, OrderLines, OrderStatus, UserId, consumption};

use super::{ServiceError, audit, stock};
use crate::db::{Store, StoreTransaction};
use crate::models::{CreateOrderInput, Order, OrderDetails, UpdateOrderInput};

/// Order taking and fulfillment.
pub struct OrderService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> OrderService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    /// Place an open order on behalf of `user_id`.
    ///
    /// The total is the sum of the caller-supplied line prices.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for an empty or malformed line
    /// list and `ServiceError::ProductNotFound` for an unknown product.
    /// Nothing is written in either case.
    #[instrument(skip(self, input), fields(user_id = %user_id, lines = input.items.len()))]
    pub async fn create_order(
        &self,
        user_id: UserId,
        input: CreateOrderInput,
    ) -> Result<OrderDetails, ServiceError> {
        let lines = OrderLines::parse(input.items)?;

        let mut tx = self.store.begin().await?;
        ensure_products_exist(&mut tx, &lines).await?;

        let order = tx.insert_order(user_id, lines.total()).await?;
        let items = tx.insert_order_items(order.id, &lines).await?;

        audit::record(
            &mut tx,
            Some(user_id),
            AuditAction::CreateOrder,
            format!(
                "order #{}: {} line(s), total {}",
                order.id,
                items.len(),
                order.total_price
            ),
        )
        .await;

        tx.commit().await?;

        info!(order_id = %order.id, total = %order.total_price, "Order created");
        Ok(OrderDetails { order, items })
    }

    /// Replace every line of an open order and overwrite its total.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::OrderNotFound` for a missing order,
    /// `ServiceError::OrderNotOpen` once it is completed or cancelled, and
    /// `ServiceError::Validation` for an empty line list.
    #[instrument(skip(self, input), fields(order_id = %order_id))]
    pub async fn update_order(
        &self,
        order_id: OrderId,
        input: UpdateOrderInput,
        acting_user: Option<UserId>,
    ) -> Result<OrderDetails, ServiceError> {
        let lines = OrderLines::parse(input.items)?;
        let total_price = money(input.total_price, "total_price")?;

        let mut tx = self.store.begin().await?;

        let mut order = tx
            .lock_order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;
        if !order.status.is_open() {
            return Err(ServiceError::OrderNotOpen {
                id: order_id,
                status: order.status,
            });
        }
        ensure_products_exist(&mut tx, &lines).await?;

        let removed = tx.delete_order_items(order_id).await?;
        let items = tx.insert_order_items(order_id, &lines).await?;
        tx.set_order_total(order_id, total_price).await?;
        order.total_price = total_price;

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::UpdateOrder,
            format!(
                "order #{order_id}: {removed} → {} line(s), total {total_price}",
                items.len()
            ),
        )
        .await;

        tx.commit().await?;

        info!(order_id = %order_id, lines = items.len(), "Order updated");
        Ok(OrderDetails { order, items })
    }

    /// Complete an open order and deduct its ingredients from stock.
    ///
    /// Ingredients are decremented in ascending id order. Stock may go
    /// negative. On any error the transaction is rolled back and the order
    /// stays open.
    ///
    /// # Errors
    ///
    /// - `OrderNotFoundOrEmpty` - missing order, or an order without lines
    /// - `OrderAlreadyCompleted` - already completed, including by a
    ///   concurrent completion that won the race
    /// - `OrderNotOpen` - the order was cancelled
    /// - `IngredientNotFound` - a recipe references a missing or
    ///   deactivated ingredient
    /// - `Validation` - the expanded consumption overflows
    /// - `CompletionFailed` - any storage failure
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn complete_order(
        &self,
        order_id: OrderId,
        acting_user: Option<UserId>,
    ) -> Result<Order, ServiceError> {
        let mut tx = self
            .store
            .begin()
            .await
            .map_err(ServiceError::CompletionFailed)?;

        match fulfill(&mut tx, order_id, acting_user).await {
            Ok(order) => {
                tx.commit().await.map_err(ServiceError::CompletionFailed)?;
                info!(order_id = %order_id, "Order completed");
                Ok(order)
            }
            Err(e) => {
                if let Err(rollback_err) = tx.rollback().await {
                    warn!(error = %rollback_err, "Rollback after failed completion failed");
                }
                warn!(order_id = %order_id, error = %e, "Order completion rolled back");
                Err(e.into_completion_failure())
            }
        }
    }

    /// Cancel an open order. Stock is not touched.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::OrderNotFound` or `ServiceError::OrderNotOpen`.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn cancel_order(
        &self,
        order_id: OrderId,
        acting_user: Option<UserId>,
    ) -> Result<Order, ServiceError> {
        let mut tx = self.store.begin().await?;

        let order = tx
            .lock_order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;

        let cancelled = order.status.is_open()
            && tx
                .transition_order(order_id, OrderStatus::Open, OrderStatus::Cancelled)
                .await?;
        if !cancelled {
            return Err(ServiceError::OrderNotOpen {
                id: order_id,
                status: order.status,
            });
        }

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::CancelOrder,
            format!("order #{order_id}"),
        )
        .await;

        tx.commit().await?;

        info!(order_id = %order_id, "Order cancelled");
        Ok(Order {
            status: OrderStatus::Cancelled,
            ..order
        })
    }

    /// An order with its lines.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::OrderNotFound` if the order does not exist.
    #[instrument(skip(self), fields(order_id = %order_id))]
    pub async fn order_details(&self, order_id: OrderId) -> Result<OrderDetails, ServiceError> {
        let mut tx = self.store.begin().await?;

        let order = tx
            .order(order_id)
            .await?
            .ok_or(ServiceError::OrderNotFound(order_id))?;
        let items = tx.order_items(order_id).await?;

        tx.rollback().await?;
        Ok(OrderDetails { order, items })
    }
}

/// The body of `complete_order`, run inside its transaction.
async fn fulfill<T: StoreTransaction>(
    tx: &mut T,
    order_id: OrderId,
    acting_user: Option<UserId>,
) -> Result<Order, ServiceError> {
    let order = tx
        .lock_order(order_id)
        .await?
        .ok_or(ServiceError::OrderNotFoundOrEmpty(order_id))?;

    match order.status {
        OrderStatus::Open => {}
        OrderStatus::Completed => return Err(ServiceError::OrderAlreadyCompleted(order_id)),
        status @ OrderStatus::Cancelled => {
            return Err(ServiceError::OrderNotOpen {
                id: order_id,
                status,
            });
        }
    }

    let items = tx.order_items(order_id).await?;
    if items.is_empty() {
        return Err(ServiceError::OrderNotFoundOrEmpty(order_id));
    }

    let mut recipes = Vec::with_capacity(items.len());
    for item in &items {
        recipes.push((item.quantity, tx.product_bom(item.product_id).await?));
    }
    let totals = consumption(
        recipes
            .iter()
            .map(|(quantity, bom)| (*quantity, bom.as_slice())),
    )?;

    // BTreeMap iteration is ascending by ingredient id, which keeps row
    // locks in a consistent order across concurrent completions.
    for (&ingredient_id, &needed) in &totals {
        stock::adjust_stock(tx, ingredient_id, -needed).await?;
    }

    if !tx
        .transition_order(order_id, OrderStatus::Open, OrderStatus::Completed)
        .await?
    {
        return Err(ServiceError::OrderAlreadyCompleted(order_id));
    }

    audit::record(
        tx,
        acting_user,
        AuditAction::CompleteOrder,
        format!(
            "order #{order_id}: {} line(s), {} ingredient(s) deducted",
            items.len(),
            totals.len()
        ),
    )
    .await;

    Ok(Order {
        status: OrderStatus::Completed,
        ..order
    })
}

async fn ensure_products_exist<T: StoreTransaction>(
    tx: &mut T,
    lines: &OrderLines,
) -> Result<(), ServiceError> {
    for line in lines {
        if tx.product(line.product_id).await?.is_none() {
            return Err(ServiceError::ProductNotFound(line.product_id));
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use rust_decimal::Decimal;

    use madziarynka_core::{IngredientId, OrderLineInput, ProductId, ValidationError};

    use super::*;
    use crate::db::{Fault, MemoryStore};
    use crate::services::testing;

    fn line(product_id: ProductId, quantity: i32, price: i64) -> OrderLineInput {
        OrderLineInput {
            product_id,
            quantity,
            unit_price: Decimal::from(price),
        }
    }

    struct Cafe {
        store: MemoryStore,
        barista: UserId,
        beans: IngredientId,
        milk: IngredientId,
        latte: ProductId,
    }

    /// Latte: 18 g beans + 200 ml milk.
    async fn cafe() -> Cafe {
        let store = MemoryStore::new();
        let barista = testing::user(&store, "Ola").await;
        let beans = testing::ingredient(&store, "Kawa ziarnista", 1000).await;
        let milk = testing::ingredient(&store, "Mleko", 5000).await;
        let latte = testing::product(
            &store,
            "Latte",
            14,
            &[(beans, Decimal::from(18)), (milk, Decimal::from(200))],
        )
        .await;
        Cafe {
            store,
            barista,
            beans,
            milk,
            latte,
        }
    }

    async fn open_order(cafe: &Cafe, lines: Vec<OrderLineInput>) -> OrderId {
        OrderService::new(&cafe.store)
            .create_order(cafe.barista, CreateOrderInput { items: lines })
            .await
            .unwrap()
            .order
            .id
    }

    async fn stock_of(store: &MemoryStore, id: IngredientId) -> Decimal {
        store.ingredient(id).await.unwrap().stock_quantity
    }

    #[tokio::test]
    async fn test_create_order_computes_total() {
        let cafe = cafe().await;
        let details = OrderService::new(&cafe.store)
            .create_order(
                cafe.barista,
                CreateOrderInput {
                    items: vec![line(cafe.latte, 2, 14), line(cafe.latte, 1, 12)],
                },
            )
            .await
            .unwrap();

        assert_eq!(details.order.status, OrderStatus::Open);
        assert_eq!(details.order.total_price, Decimal::from(40));
        assert_eq!(details.items.len(), 2);

        let logs = cafe.store.logs().await;
        assert_eq!(logs.len(), 1);
        assert_eq!(logs.first().unwrap().action, "CREATE_ORDER");
    }

    #[tokio::test]
    async fn test_create_empty_order_writes_nothing() {
        let cafe = cafe().await;
        let err = OrderService::new(&cafe.store)
            .create_order(cafe.barista, CreateOrderInput { items: vec![] })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::Validation(ValidationError::EmptyOrder)
        ));
        assert!(cafe.store.order(OrderId::new(1)).await.is_none());
        assert!(cafe.store.logs().await.is_empty());
    }

    #[tokio::test]
    async fn test_create_order_unknown_product() {
        let cafe = cafe().await;
        let err = OrderService::new(&cafe.store)
            .create_order(
                cafe.barista,
                CreateOrderInput {
                    items: vec![line(ProductId::new(99), 1, 10)],
                },
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::ProductNotFound(id) if id == ProductId::new(99)));
        assert!(cafe.store.order(OrderId::new(1)).await.is_none());
    }

    #[tokio::test]
    async fn test_complete_order_deducts_recipe() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 2, 14)]).await;

        let order = OrderService::new(&cafe.store)
            .complete_order(order_id, Some(cafe.barista))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Completed);
        assert_eq!(stock_of(&cafe.store, cafe.beans).await, Decimal::from(964));
        assert_eq!(stock_of(&cafe.store, cafe.milk).await, Decimal::from(4600));

        let actions: Vec<_> = cafe
            .store
            .logs()
            .await
            .into_iter()
            .map(|entry| entry.action)
            .collect();
        assert_eq!(actions, ["CREATE_ORDER", "COMPLETE_ORDER"]);
    }

    #[tokio::test]
    async fn test_complete_order_aggregates_shared_ingredient() {
        // A: 3 units, 2 per unit. B: 1 unit, 10 per unit. 16 total.
        let store = MemoryStore::new();
        let barista = testing::user(&store, "Ola").await;
        let sugar = testing::ingredient(&store, "Cukier", 100).await;
        let a = testing::product(&store, "A", 5, &[(sugar, Decimal::from(2))]).await;
        let b = testing::product(&store, "B", 5, &[(sugar, Decimal::from(10))]).await;

        let service = OrderService::new(&store);
        let order_id = service
            .create_order(
                barista,
                CreateOrderInput {
                    items: vec![line(a, 3, 5), line(b, 1, 5)],
                },
            )
            .await
            .unwrap()
            .order
            .id;
        service.complete_order(order_id, Some(barista)).await.unwrap();

        assert_eq!(stock_of(&store, sugar).await, Decimal::from(84));
    }

    #[tokio::test]
    async fn test_complete_order_allows_negative_stock() {
        let store = MemoryStore::new();
        let barista = testing::user(&store, "Ola").await;
        let cream = testing::ingredient(&store, "Śmietanka", 5).await;
        let coffee = testing::product(&store, "Kawa", 9, &[(cream, Decimal::from(10))]).await;

        let service = OrderService::new(&store);
        let order_id = service
            .create_order(
                barista,
                CreateOrderInput {
                    items: vec![line(coffee, 1, 9)],
                },
            )
            .await
            .unwrap()
            .order
            .id;
        service.complete_order(order_id, Some(barista)).await.unwrap();

        assert_eq!(stock_of(&store, cream).await, Decimal::from(-5));
    }

    #[tokio::test]
    async fn test_complete_order_twice_is_rejected() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 1, 14)]).await;
        let service = OrderService::new(&cafe.store);

        service.complete_order(order_id, Some(cafe.barista)).await.unwrap();
        let err = service
            .complete_order(order_id, Some(cafe.barista))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::OrderAlreadyCompleted(_)));
        assert_eq!(stock_of(&cafe.store, cafe.beans).await, Decimal::from(982));
    }

    #[tokio::test]
    async fn test_complete_missing_order() {
        let cafe = cafe().await;
        let err = OrderService::new(&cafe.store)
            .complete_order(OrderId::new(404), Some(cafe.barista))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::OrderNotFoundOrEmpty(_)));
    }

    #[tokio::test]
    async fn test_complete_order_with_deactivated_ingredient_changes_nothing() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 1, 14)]).await;

        let mut tx = cafe.store.begin().await.unwrap();
        tx.set_ingredient_active(cafe.milk, false).await.unwrap();
        tx.commit().await.unwrap();

        let err = OrderService::new(&cafe.store)
            .complete_order(order_id, Some(cafe.barista))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::IngredientNotFound(id) if id == cafe.milk));
        // Beans sort first and were decremented before the failure.
        assert_eq!(stock_of(&cafe.store, cafe.beans).await, Decimal::from(1000));
        assert_eq!(
            cafe.store.order(order_id).await.unwrap().status,
            OrderStatus::Open
        );
    }

    #[tokio::test]
    async fn test_storage_failure_reports_completion_failed() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 1, 14)]).await;
        cafe.store.inject(Fault::StatusWrite).await;

        let err = OrderService::new(&cafe.store)
            .complete_order(order_id, Some(cafe.barista))
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::CompletionFailed(_)));
        assert_eq!(stock_of(&cafe.store, cafe.beans).await, Decimal::from(1000));
        assert_eq!(
            cafe.store.order(order_id).await.unwrap().status,
            OrderStatus::Open
        );
    }

    #[tokio::test]
    async fn test_audit_failure_does_not_abort_completion() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 1, 14)]).await;
        cafe.store.inject(Fault::AuditWrite).await;

        OrderService::new(&cafe.store)
            .complete_order(order_id, Some(cafe.barista))
            .await
            .unwrap();

        assert_eq!(
            cafe.store.order(order_id).await.unwrap().status,
            OrderStatus::Completed
        );
        assert_eq!(cafe.store.logs().await.len(), 1);
    }

    #[tokio::test]
    async fn test_completion_without_acting_user_skips_audit() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 1, 14)]).await;

        OrderService::new(&cafe.store)
            .complete_order(order_id, None)
            .await
            .unwrap();

        let logs = cafe.store.logs().await;
        assert!(logs.iter().all(|entry| entry.action != "COMPLETE_ORDER"));
    }

    #[tokio::test]
    async fn test_cancelled_order_cannot_be_completed() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 1, 14)]).await;
        let service = OrderService::new(&cafe.store);

        service.cancel_order(order_id, Some(cafe.barista)).await.unwrap();
        let err = service
            .complete_order(order_id, Some(cafe.barista))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ServiceError::OrderNotOpen {
                status: OrderStatus::Cancelled,
                ..
            }
        ));
        assert_eq!(stock_of(&cafe.store, cafe.beans).await, Decimal::from(1000));
    }

    #[tokio::test]
    async fn test_update_replaces_lines_of_open_order() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 1, 14)]).await;

        let details = OrderService::new(&cafe.store)
            .update_order(
                order_id,
                UpdateOrderInput {
                    items: vec![line(cafe.latte, 3, 13)],
                    total_price: Decimal::from(39),
                },
                Some(cafe.barista),
            )
            .await
            .unwrap();

        assert_eq!(details.items.len(), 1);
        assert_eq!(details.order.total_price, Decimal::from(39));
        let stored = cafe.store.order_items(order_id).await;
        assert_eq!(stored.len(), 1);
        assert_eq!(stored.first().unwrap().quantity, 3);
    }

    #[tokio::test]
    async fn test_update_completed_order_is_rejected() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 1, 14)]).await;
        let service = OrderService::new(&cafe.store);
        service.complete_order(order_id, Some(cafe.barista)).await.unwrap();

        let err = service
            .update_order(
                order_id,
                UpdateOrderInput {
                    items: vec![line(cafe.latte, 5, 14)],
                    total_price: Decimal::from(70),
                },
                Some(cafe.barista),
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::OrderNotOpen { .. }));
        let stored = cafe.store.order_items(order_id).await;
        assert_eq!(stored.first().unwrap().quantity, 1);
    }

    #[tokio::test]
    async fn test_update_missing_order() {
        let cafe = cafe().await;
        let err = OrderService::new(&cafe.store)
            .update_order(
                OrderId::new(8),
                UpdateOrderInput {
                    items: vec![line(cafe.latte, 1, 14)],
                    total_price: Decimal::from(14),
                },
                None,
            )
            .await
            .unwrap_err();

        assert!(matches!(err, ServiceError::OrderNotFound(_)));
    }

    #[tokio::test]
    async fn test_cancel_is_one_way() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 1, 14)]).await;
        let service = OrderService::new(&cafe.store);

        service.cancel_order(order_id, None).await.unwrap();
        let err = service.cancel_order(order_id, None).await.unwrap_err();

        assert!(matches!(err, ServiceError::OrderNotOpen { .. }));
    }

    #[tokio::test]
    async fn test_order_details_returns_lines() {
        let cafe = cafe().await;
        let order_id = open_order(&cafe, vec![line(cafe.latte, 2, 14)]).await;

        let details = OrderService::new(&cafe.store)
            .order_details(order_id)
            .await
            .unwrap();

        assert_eq!(details.order.id, order_id);
        assert_eq!(details.items.first().unwrap().price_per_item, Decimal::from(14));
    }
}

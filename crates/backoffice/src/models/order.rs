//! Orders and order lines.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use madziarynka_core::{OrderId, OrderItemId, OrderLineInput, OrderStatus, ProductId, UserId};

/// An order header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Order {
    pub id: OrderId,
    /// Staff member who took the order.
    pub user_id: UserId,
    pub status: OrderStatus,
    /// Sum of the line totals, as supplied by the till.
    pub total_price: Decimal,
    pub created_at: DateTime<Utc>,
}

/// A stored order line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderItem {
    pub id: OrderItemId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i32,
    /// Price snapshot at order time; independent of the current menu price.
    pub price_per_item: Decimal,
}

/// An order with its lines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderDetails {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
}

/// Request body for placing an order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateOrderInput {
    pub items: Vec<OrderLineInput>,
}

/// Request body for editing an open order.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateOrderInput {
    pub items: Vec<OrderLineInput>,
    /// Overwrites the stored total as-is.
    pub total_price: Decimal,
}

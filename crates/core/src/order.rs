//! Validated order line input.
//!
//! Prices come from the caller, not from the current catalog: the till may
//! apply promotions or manual overrides, and the line keeps that snapshot.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{MAX_MONEY, ValidationError, money};
use crate::types::ProductId;

/// One requested order line, as received from the till.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderLineInput {
    /// Product being sold.
    #[serde(alias = "id")]
    pub product_id: ProductId,
    /// Units sold (at least one).
    pub quantity: i32,
    /// Price per unit at order time.
    #[serde(alias = "price")]
    pub unit_price: Decimal,
}

impl OrderLineInput {
    /// `quantity * unit_price`, or `None` on overflow.
    #[must_use]
    pub fn line_total(&self) -> Option<Decimal> {
        Decimal::from(self.quantity).checked_mul(self.unit_price)
    }
}

/// A non-empty list of order lines with positive quantities and
/// non-negative whole-cent prices, whose total fits a money column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderLines {
    lines: Vec<OrderLineInput>,
    total: Decimal,
}

impl OrderLines {
    /// Validate raw lines.
    ///
    /// # Errors
    ///
    /// - `ValidationError::EmptyOrder` if `lines` is empty
    /// - `ValidationError::InvalidQuantity` for a quantity below one
    /// - `ValidationError::Negative` for a negative unit price
    /// - `ValidationError::TooPrecise` for a price with fractions of a cent
    /// - `ValidationError::OutOfRange` if the total exceeds `MAX_MONEY`
    pub fn parse(lines: Vec<OrderLineInput>) -> Result<Self, ValidationError> {
        if lines.is_empty() {
            return Err(ValidationError::EmptyOrder);
        }
        let mut total = Decimal::ZERO;
        for line in &lines {
            if line.quantity < 1 {
                return Err(ValidationError::InvalidQuantity {
                    product_id: line.product_id,
                    quantity: line.quantity,
                });
            }
            money(line.unit_price, "unit_price")?;
            total = line
                .line_total()
                .and_then(|line_total| total.checked_add(line_total))
                .filter(|sum| *sum <= MAX_MONEY)
                .ok_or(ValidationError::OutOfRange {
                    field: "total_price",
                })?;
        }
        Ok(Self { lines, total })
    }

    /// Sum of `quantity * unit_price` over all lines.
    #[must_use]
    pub const fn total(&self) -> Decimal {
        self.total
    }

    /// The validated lines.
    #[must_use]
    pub fn as_slice(&self) -> &[OrderLineInput] {
        &self.lines
    }

    /// Number of lines (never zero).
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Always `false`; present for API symmetry with `len`.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

impl<'a> IntoIterator for &'a OrderLines {
    type Item = &'a OrderLineInput;
    type IntoIter = std::slice::Iter<'a, OrderLineInput>;

    fn into_iter(self) -> Self::IntoIter {
        self.lines.iter()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn line(product: i32, quantity: i32, price: Decimal) -> OrderLineInput {
        OrderLineInput {
            product_id: ProductId::new(product),
            quantity,
            unit_price: price,
        }
    }

    #[test]
    fn test_empty_order_rejected() {
        assert_eq!(OrderLines::parse(vec![]), Err(ValidationError::EmptyOrder));
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let err = OrderLines::parse(vec![line(1, 0, Decimal::ONE)]).unwrap_err();
        assert!(matches!(err, ValidationError::InvalidQuantity { quantity: 0, .. }));
    }

    #[test]
    fn test_negative_price_rejected() {
        let err = OrderLines::parse(vec![line(1, 1, Decimal::from(-2))]).unwrap_err();
        assert_eq!(
            err,
            ValidationError::Negative {
                field: "unit_price",
                value: Decimal::from(-2)
            }
        );
    }

    #[test]
    fn test_total_uses_supplied_prices() {
        let lines = OrderLines::parse(vec![
            line(1, 2, Decimal::new(1250, 2)),
            line(2, 3, Decimal::new(800, 2)),
        ])
        .unwrap();
        assert_eq!(lines.total(), Decimal::new(4900, 2));
        assert_eq!(lines.len(), 2);
    }

    #[test]
    fn test_overflowing_total_rejected() {
        let err = OrderLines::parse(vec![line(1, i32::MAX, Decimal::MAX)]).unwrap_err();
        assert_eq!(err, ValidationError::OutOfRange { field: "unit_price" });

        let err = OrderLines::parse(vec![line(1, i32::MAX, Decimal::new(9_999, 2))]).unwrap_err();
        assert_eq!(err, ValidationError::OutOfRange { field: "total_price" });
    }

    #[test]
    fn test_total_at_column_limit_accepted() {
        let lines = OrderLines::parse(vec![
            line(1, 1, Decimal::new(9_999_999_900, 2)),
            line(2, 99, Decimal::new(1, 2)),
        ])
        .unwrap();
        assert_eq!(lines.total(), MAX_MONEY);

        let err = OrderLines::parse(vec![
            line(1, 1, Decimal::new(9_999_999_900, 2)),
            line(2, 100, Decimal::new(1, 2)),
        ])
        .unwrap_err();
        assert_eq!(err, ValidationError::OutOfRange { field: "total_price" });
    }

    #[test]
    fn test_sub_cent_price_rejected() {
        let err = OrderLines::parse(vec![line(1, 3, Decimal::new(1005, 3))]).unwrap_err();
        assert!(matches!(
            err,
            ValidationError::TooPrecise {
                field: "unit_price",
                max_scale: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_accepts_till_field_names() {
        let parsed: OrderLineInput =
            serde_json::from_str(r#"{"id": 4, "quantity": 1, "price": "9.50"}"#).unwrap();
        assert_eq!(parsed, line(4, 1, Decimal::new(950, 2)));
    }

    #[test]
    fn test_unknown_fields_rejected() {
        let parsed = serde_json::from_str::<OrderLineInput>(
            r#"{"product_id": 4, "quantity": 1, "unit_price": 1, "discount": 5}"#,
        );
        assert!(parsed.is_err());
    }
}

//! Input validation errors.
//!
//! Raised while turning request input into validated types, always before
//! any storage call is made.

use rust_decimal::Decimal;
use thiserror::Error;

use crate::types::{IngredientId, ProductId};

/// Errors produced by validating user-supplied input.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    /// An order must contain at least one line.
    #[error("order must contain at least one item")]
    EmptyOrder,

    /// Order line quantity below one.
    #[error("quantity for product {product_id} must be at least 1, got {quantity}")]
    InvalidQuantity { product_id: ProductId, quantity: i32 },

    /// Negative price or stock reference level.
    #[error("{field} must not be negative, got {value}")]
    Negative { field: &'static str, value: Decimal },

    /// BOM quantity that is zero or negative.
    #[error("quantity needed for ingredient {ingredient_id} must be positive, got {quantity}")]
    NonPositiveBomQuantity {
        ingredient_id: IngredientId,
        quantity: Decimal,
    },

    /// The same ingredient listed twice in one BOM.
    #[error("ingredient {0} appears more than once in the recipe")]
    DuplicateIngredient(IngredientId),

    /// Shift end not after its start.
    #[error("shift must end after it starts")]
    InvertedTimeRange,

    /// A required text field is blank.
    #[error("{0} must not be empty")]
    BlankField(&'static str),

    /// More decimal places than the column stores.
    #[error("{field} allows at most {max_scale} decimal places, got {value}")]
    TooPrecise {
        field: &'static str,
        value: Decimal,
        max_scale: u32,
    },

    /// Amount beyond what the column can hold, or an overflowing sum.
    #[error("{field} is out of range")]
    OutOfRange { field: &'static str },
}

/// Decimal places of money columns (`NUMERIC(10, 2)`).
pub const MONEY_SCALE: u32 = 2;

/// Largest amount a money column holds.
pub const MAX_MONEY: Decimal = Decimal::from_parts(1_410_065_407, 2, 0, false, MONEY_SCALE);

/// Decimal places of stock and recipe quantities (`NUMERIC(12, 3)`).
pub const QUANTITY_SCALE: u32 = 3;

/// Largest magnitude a quantity column holds.
pub const MAX_QUANTITY: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, QUANTITY_SCALE);

/// Reject blank (whitespace-only) text and return it trimmed.
///
/// # Errors
///
/// Returns `ValidationError::BlankField` if `value` is empty after trimming.
pub fn non_blank(value: &str, field: &'static str) -> Result<String, ValidationError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ValidationError::BlankField(field));
    }
    Ok(trimmed.to_owned())
}

/// Reject negative amounts.
///
/// # Errors
///
/// Returns `ValidationError::Negative` if `value < 0`.
pub fn non_negative(value: Decimal, field: &'static str) -> Result<Decimal, ValidationError> {
    if value < Decimal::ZERO {
        return Err(ValidationError::Negative { field, value });
    }
    Ok(value)
}

/// Validate a price or total: non-negative, at most two decimal places
/// and within `MAX_MONEY`.
///
/// # Errors
///
/// Returns `ValidationError::Negative`, `ValidationError::TooPrecise` or
/// `ValidationError::OutOfRange`.
pub fn money(value: Decimal, field: &'static str) -> Result<Decimal, ValidationError> {
    bounded(non_negative(value, field)?, field, MONEY_SCALE, MAX_MONEY)
}

/// Validate a signed stock or recipe quantity: at most three decimal places
/// and within `MAX_QUANTITY` either way.
///
/// # Errors
///
/// Returns `ValidationError::TooPrecise` or `ValidationError::OutOfRange`.
pub fn quantity(value: Decimal, field: &'static str) -> Result<Decimal, ValidationError> {
    bounded(value, field, QUANTITY_SCALE, MAX_QUANTITY)
}

fn bounded(
    value: Decimal,
    field: &'static str,
    max_scale: u32,
    max: Decimal,
) -> Result<Decimal, ValidationError> {
    // Trailing zeros ("1.50") do not count against the scale.
    if value.normalize().scale() > max_scale {
        return Err(ValidationError::TooPrecise {
            field,
            value,
            max_scale,
        });
    }
    if value.abs() > max {
        return Err(ValidationError::OutOfRange { field });
    }
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_blank_trims() {
        assert_eq!(non_blank("  Latte ", "name"), Ok("Latte".to_owned()));
        assert_eq!(non_blank("   ", "name"), Err(ValidationError::BlankField("name")));
    }

    #[test]
    fn test_non_negative() {
        assert_eq!(non_negative(Decimal::ZERO, "price"), Ok(Decimal::ZERO));
        assert!(non_negative(Decimal::NEGATIVE_ONE, "price").is_err());
    }

    #[test]
    fn test_column_bounds() {
        assert_eq!(MAX_MONEY, Decimal::new(9_999_999_999, 2));
        assert_eq!(MAX_QUANTITY, Decimal::new(999_999_999_999, 3));
    }

    #[test]
    fn test_money_rejects_sub_cent_amounts() {
        assert_eq!(money(Decimal::new(150, 2), "price"), Ok(Decimal::new(150, 2)));
        assert_eq!(money(Decimal::new(1500, 3), "price"), Ok(Decimal::new(1500, 3)));
        assert_eq!(
            money(Decimal::new(1005, 3), "price"),
            Err(ValidationError::TooPrecise {
                field: "price",
                value: Decimal::new(1005, 3),
                max_scale: 2,
            })
        );
    }

    #[test]
    fn test_money_rejects_amounts_beyond_column() {
        assert_eq!(money(MAX_MONEY, "total_price"), Ok(MAX_MONEY));
        assert_eq!(
            money(Decimal::from(100_000_000), "total_price"),
            Err(ValidationError::OutOfRange { field: "total_price" })
        );
        assert_eq!(
            money(Decimal::MAX, "total_price"),
            Err(ValidationError::OutOfRange { field: "total_price" })
        );
    }

    #[test]
    fn test_quantity_is_signed_but_bounded() {
        assert_eq!(quantity(Decimal::new(-75, 1), "delta"), Ok(Decimal::new(-75, 1)));
        assert!(matches!(
            quantity(Decimal::new(1, 4), "delta"),
            Err(ValidationError::TooPrecise { max_scale: 3, .. })
        ));
        assert_eq!(
            quantity(Decimal::from(-1_000_000_000), "delta"),
            Err(ValidationError::OutOfRange { field: "delta" })
        );
    }

    #[test]
    fn test_messages() {
        let err = ValidationError::InvalidQuantity {
            product_id: ProductId::new(3),
            quantity: 0,
        };
        assert_eq!(err.to_string(), "quantity for product 3 must be at least 1, got 0");
        assert_eq!(
            ValidationError::EmptyOrder.to_string(),
            "order must contain at least one item"
        );
    }
}

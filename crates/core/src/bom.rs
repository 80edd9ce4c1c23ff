//! Bill of materials.
//!
//! A product's BOM lists the ingredients consumed by selling one unit of
//! it. Completing an order expands every order line through its product's
//! BOM and sums the result per ingredient.

use std::collections::{BTreeMap, HashSet};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{ValidationError, quantity};
use crate::types::IngredientId;

/// One ingredient requirement of a product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BomLine {
    pub ingredient_id: IngredientId,
    /// Consumption per one unit of product sold.
    pub quantity_needed: Decimal,
}

/// A validated BOM: positive quantities, each ingredient at most once.
///
/// May be empty (a product with no tracked ingredients).
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct BomLines(Vec<BomLine>);

impl BomLines {
    /// Validate raw BOM lines.
    ///
    /// # Errors
    ///
    /// - `ValidationError::NonPositiveBomQuantity` for a quantity `<= 0`
    /// - `ValidationError::TooPrecise` / `ValidationError::OutOfRange` for a
    ///   quantity the recipe column cannot store exactly
    /// - `ValidationError::DuplicateIngredient` if an ingredient repeats
    pub fn parse(lines: Vec<BomLine>) -> Result<Self, ValidationError> {
        let mut seen = HashSet::with_capacity(lines.len());
        for line in &lines {
            if line.quantity_needed <= Decimal::ZERO {
                return Err(ValidationError::NonPositiveBomQuantity {
                    ingredient_id: line.ingredient_id,
                    quantity: line.quantity_needed,
                });
            }
            quantity(line.quantity_needed, "quantity_needed")?;
            if !seen.insert(line.ingredient_id) {
                return Err(ValidationError::DuplicateIngredient(line.ingredient_id));
            }
        }
        Ok(Self(lines))
    }

    /// The validated lines.
    #[must_use]
    pub fn as_slice(&self) -> &[BomLine] {
        &self.0
    }

    /// Ingredient ids referenced by this BOM.
    pub fn ingredient_ids(&self) -> impl Iterator<Item = IngredientId> + '_ {
        self.0.iter().map(|line| line.ingredient_id)
    }

    /// Number of ingredients.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Whether the product consumes no tracked ingredients.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Total consumption per ingredient, iterated in ascending ingredient id.
pub type Consumption = BTreeMap<IngredientId, Decimal>;

/// Expand sold quantities through their BOMs.
///
/// Each item pairs the units sold on one order line with that product's
/// BOM. Every BOM row contributes `units * quantity_needed` to its
/// ingredient's total.
///
/// # Errors
///
/// Returns `ValidationError::OutOfRange` if a total overflows.
pub fn consumption<'a, I>(items: I) -> Result<Consumption, ValidationError>
where
    I: IntoIterator<Item = (i32, &'a [BomLine])>,
{
    let mut totals = Consumption::new();
    for (units, bom) in items {
        let units = Decimal::from(units);
        for row in bom {
            let total = totals.entry(row.ingredient_id).or_insert(Decimal::ZERO);
            *total = units
                .checked_mul(row.quantity_needed)
                .and_then(|needed| total.checked_add(needed))
                .ok_or(ValidationError::OutOfRange {
                    field: "quantity_needed",
                })?;
        }
    }
    Ok(totals)
}

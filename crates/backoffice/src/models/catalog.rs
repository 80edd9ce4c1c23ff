//! Warehouse ingredients, menu products and recipes.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use madziarynka_core::error::{money, non_blank, non_negative, quantity};
use madziarynka_core::{BomLine, BomLines, IngredientId, ProductId, StockLevel, ValidationError};

/// A warehouse ingredient.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Ingredient {
    pub id: IngredientId,
    pub name: String,
    /// Free-form unit label ("g", "l", "szt").
    pub unit: String,
    /// On-hand quantity; negative after overselling.
    pub stock_quantity: Decimal,
    /// Reference level used only for status display.
    pub nominal_stock: Decimal,
    pub is_active: bool,
}

impl Ingredient {
    #[must_use]
    pub fn stock_level(&self) -> StockLevel {
        StockLevel::of(self.stock_quantity, self.nominal_stock)
    }
}

/// An ingredient as returned to the warehouse screen.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngredientView {
    #[serde(flatten)]
    pub ingredient: Ingredient,
    pub stock_level: StockLevel,
}

impl From<Ingredient> for IngredientView {
    fn from(ingredient: Ingredient) -> Self {
        Self {
            stock_level: ingredient.stock_level(),
            ingredient,
        }
    }
}

/// Validated, editable ingredient fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientFields {
    pub name: String,
    pub unit: String,
    pub nominal_stock: Decimal,
}

/// Request body for creating an ingredient.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateIngredientInput {
    pub name: String,
    pub unit: String,
    #[serde(default)]
    pub nominal_stock: Decimal,
    /// Opening stock. Later changes go through restocking or fulfillment.
    #[serde(default)]
    pub stock_quantity: Decimal,
}

impl CreateIngredientInput {
    /// Validate into storable fields plus the opening stock.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for blank name/unit, negative nominal stock,
    /// or a quantity the stock columns cannot store exactly.
    pub fn validate(&self) -> Result<(IngredientFields, Decimal), ValidationError> {
        let fields = validate_fields(&self.name, &self.unit, self.nominal_stock)?;
        Ok((fields, quantity(self.stock_quantity, "stock_quantity")?))
    }
}

/// Request body for editing an ingredient.
///
/// Carries no `stock_quantity`: the ledger only moves through restocking
/// and fulfillment.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UpdateIngredientInput {
    pub name: String,
    pub unit: String,
    pub nominal_stock: Decimal,
}

impl UpdateIngredientInput {
    /// # Errors
    ///
    /// Returns `ValidationError` for blank name/unit or negative nominal stock.
    pub fn validate(&self) -> Result<IngredientFields, ValidationError> {
        validate_fields(&self.name, &self.unit, self.nominal_stock)
    }
}

fn validate_fields(
    name: &str,
    unit: &str,
    nominal_stock: Decimal,
) -> Result<IngredientFields, ValidationError> {
    let nominal_stock = non_negative(nominal_stock, "nominal_stock")?;
    Ok(IngredientFields {
        name: non_blank(name, "name")?,
        unit: non_blank(unit, "unit")?,
        nominal_stock: quantity(nominal_stock, "nominal_stock")?,
    })
}

/// Request body for a warehouse stock correction.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RestockInput {
    /// Signed change; deliveries are positive, write-offs negative.
    pub delta: Decimal,
    #[serde(default)]
    pub note: Option<String>,
}

/// A menu product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub price: Decimal,
    /// Menu category label.
    pub group: String,
    pub is_visible: bool,
}

/// Request body for creating or replacing a product and its recipe.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ProductInput {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub ingredients: Vec<BomLine>,
}

impl ProductInput {
    /// # Errors
    ///
    /// Returns `ValidationError` for a blank name, negative price, or an
    /// invalid recipe (non-positive quantity, repeated ingredient).
    pub fn validate(self) -> Result<ProductDraft, ValidationError> {
        Ok(ProductDraft {
            name: non_blank(&self.name, "name")?,
            price: money(self.price, "price")?,
            group: self.group.trim().to_owned(),
            bom: BomLines::parse(self.ingredients)?,
        })
    }
}

/// Validated product fields and recipe.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProductDraft {
    pub name: String,
    pub price: Decimal,
    pub group: String,
    pub bom: BomLines,
}

/// A recipe row joined with its ingredient for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct ProductBomEntry {
    pub ingredient_id: IngredientId,
    pub quantity_needed: Decimal,
    pub ingredient_name: String,
    pub unit: String,
}

/// A product with its recipe, as returned after a menu change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductDetails {
    #[serde(flatten)]
    pub product: Product,
    pub ingredients: Vec<ProductBomEntry>,
}

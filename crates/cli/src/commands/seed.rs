//! Seed the database from a YAML file.
//!
//! The file lists staff, ingredients and products. Recipes reference
//! ingredients by name; every reference is resolved before anything is
//! written, so a typo fails the run without touching the database.
//!
//! ```yaml
//! users:
//!   - { name: Magda, role: admin }
//! ingredients:
//!   - { name: Mleko, unit: ml, nominal_stock: 20000, stock_quantity: 12000 }
//! products:
//!   - name: Latte
//!     price: "14.00"
//!     group: Kawa
//!     recipe:
//!       - { ingredient: Mleko, quantity: 200 }
//! ```

use std::collections::{BTreeMap, BTreeSet};
use std::path::Path;

use madziarynka_backoffice::db::{PgStore, Store, StoreTransaction};
use madziarynka_backoffice::models::{CreateIngredientInput, NewUser, ProductInput};
use madziarynka_backoffice::services::CatalogService;
use madziarynka_core::{BomLine, IngredientId};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::info;

use super::connect;

/// Top-level seed document.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedFile {
    #[serde(default)]
    pub users: Vec<NewUser>,
    #[serde(default)]
    pub ingredients: Vec<CreateIngredientInput>,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

/// A product whose recipe names its ingredients.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedProduct {
    pub name: String,
    pub price: Decimal,
    #[serde(default)]
    pub group: String,
    #[serde(default)]
    pub recipe: Vec<SeedRecipeLine>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SeedRecipeLine {
    pub ingredient: String,
    pub quantity: Decimal,
}

/// Recipe references that could not be resolved.
#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("product '{product}' uses unknown ingredient '{ingredient}'")]
    UnknownIngredient { product: String, ingredient: String },

    #[error("ingredient '{0}' is listed twice")]
    DuplicateIngredient(String),
}

impl SeedFile {
    /// Check that every ingredient name is unique and every recipe line
    /// names a listed ingredient.
    ///
    /// # Errors
    ///
    /// Returns the first `SeedError` found.
    pub fn validate(&self) -> Result<(), SeedError> {
        let mut names = BTreeSet::new();
        for ingredient in &self.ingredients {
            if !names.insert(ingredient.name.as_str()) {
                return Err(SeedError::DuplicateIngredient(ingredient.name.clone()));
            }
        }

        for product in &self.products {
            if let Some(line) = product
                .recipe
                .iter()
                .find(|line| !names.contains(line.ingredient.as_str()))
            {
                return Err(SeedError::UnknownIngredient {
                    product: product.name.clone(),
                    ingredient: line.ingredient.clone(),
                });
            }
        }

        Ok(())
    }
}

impl SeedProduct {
    /// Turn names into ids once the ingredients exist.
    fn into_input(
        self,
        ids: &BTreeMap<String, IngredientId>,
    ) -> Result<ProductInput, SeedError> {
        let mut ingredients = Vec::with_capacity(self.recipe.len());
        for line in self.recipe {
            let ingredient_id = *ids.get(&line.ingredient).ok_or_else(|| {
                SeedError::UnknownIngredient {
                    product: self.name.clone(),
                    ingredient: line.ingredient.clone(),
                }
            })?;
            ingredients.push(BomLine {
                ingredient_id,
                quantity_needed: line.quantity,
            });
        }

        Ok(ProductInput {
            name: self.name,
            price: self.price,
            group: self.group,
            ingredients,
        })
    }
}

/// Load a seed file into the database.
///
/// # Errors
///
/// Returns an error if the file cannot be read or parsed, a recipe
/// references an unknown ingredient, or a database operation fails.
pub async fn run(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    if !path.exists() {
        return Err(format!("File not found: {}", path.display()).into());
    }

    info!(path = %path.display(), "Loading seed file");

    // Read and validate YAML before connecting to database
    let content = tokio::fs::read_to_string(path).await?;
    let seed: SeedFile = serde_yaml::from_str(&content)?;
    seed.validate()?;

    info!(
        users = seed.users.len(),
        ingredients = seed.ingredients.len(),
        products = seed.products.len(),
        "Seed file validated"
    );

    let store = PgStore::new(connect().await?);

    let mut tx = store.begin().await?;
    for user in &seed.users {
        let user = tx.insert_user(user).await?;
        info!(user_id = %user.id, name = %user.name, "User created");
    }
    tx.commit().await?;

    // Seeding is an administrative action without an acting staff member,
    // so the catalog writes carry no audit entries.
    let catalog = CatalogService::new(&store);

    let mut ids = BTreeMap::new();
    for input in seed.ingredients {
        let ingredient = catalog.create_ingredient(input, None).await?;
        ids.insert(ingredient.name.clone(), ingredient.id);
    }

    for product in seed.products {
        let details = catalog
            .create_product(product.into_input(&ids)?, None)
            .await?;
        info!(
            product_id = %details.product.id,
            name = %details.product.name,
            ingredients = details.ingredients.len(),
            "Product created"
        );
    }

    info!("Seeding complete!");
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const DEMO: &str = include_str!("../../seed/demo.yaml");

    #[test]
    fn test_demo_file_is_valid() {
        let seed: SeedFile = serde_yaml::from_str(DEMO).unwrap();
        seed.validate().unwrap();
        assert!(!seed.products.is_empty());
    }

    #[test]
    fn test_unknown_recipe_ingredient() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
ingredients:
  - { name: Mleko, unit: ml }
products:
  - name: Latte
    price: 14
    recipe:
      - { ingredient: Mleczko, quantity: 200 }
",
        )
        .unwrap();

        let err = seed.validate().unwrap_err();
        assert!(matches!(err, SeedError::UnknownIngredient { ingredient, .. } if ingredient == "Mleczko"));
    }

    #[test]
    fn test_duplicate_ingredient() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
ingredients:
  - { name: Mleko, unit: ml }
  - { name: Mleko, unit: l }
",
        )
        .unwrap();

        assert!(matches!(
            seed.validate(),
            Err(SeedError::DuplicateIngredient(_))
        ));
    }

    #[test]
    fn test_recipe_names_resolve_to_ids() {
        let seed: SeedFile = serde_yaml::from_str(
            r"
products:
  - name: Espresso
    price: 8
    recipe:
      - { ingredient: Kawa, quantity: 9 }
",
        )
        .unwrap();
        let ids = BTreeMap::from([("Kawa".to_owned(), IngredientId::new(4))]);

        let product = seed.products.into_iter().next().unwrap();
        let input = product.into_input(&ids).unwrap();
        assert_eq!(
            input.ingredients.first().unwrap().ingredient_id,
            IngredientId::new(4)
        );
    }
}

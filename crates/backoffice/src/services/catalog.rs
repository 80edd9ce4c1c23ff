//! Menu products, recipes and warehouse ingredients.
//!
//! A product's recipe is replaced wholesale together with its fields: the
//! old rows are deleted and the new set inserted in the same transaction,
//! so a rejected recipe leaves the product exactly as it was.

use tracing::{info, instrument};

use madziarynka_core::error::quantity;
use madziarynka_core::{AuditAction, BomLines, IngredientId, ProductId, UserId};

use super::{ServiceError, audit, stock};
use crate::db::{Store, StoreTransaction};
use crate::models::{
    CreateIngredientInput, Ingredient, Product, ProductBomEntry, ProductDetails, ProductInput,
    RestockInput, UpdateIngredientInput,
};

/// Menu and warehouse maintenance.
pub struct CatalogService<'a, S> {
    store: &'a S,
}

impl<'a, S: Store> CatalogService<'a, S> {
    #[must_use]
    pub const fn new(store: &'a S) -> Self {
        Self { store }
    }

    // =========================================================================
    // Products
    // =========================================================================

    /// Add a product with its recipe.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for invalid fields or recipe and
    /// `ServiceError::IngredientNotFound` for a missing or deactivated
    /// ingredient.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_product(
        &self,
        input: ProductInput,
        acting_user: Option<UserId>,
    ) -> Result<ProductDetails, ServiceError> {
        let draft = input.validate()?;

        let mut tx = self.store.begin().await?;
        ensure_ingredients_active(&mut tx, &draft.bom).await?;

        let product = tx.insert_product(&draft).await?;
        tx.replace_product_bom(product.id, &draft.bom).await?;

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::CreateProduct,
            format!(
                "product #{} '{}': {} ingredient(s)",
                product.id,
                product.name,
                draft.bom.len()
            ),
        )
        .await;

        let ingredients = tx.product_bom_entries(product.id).await?;
        tx.commit().await?;

        info!(product_id = %product.id, "Product created");
        Ok(ProductDetails {
            product,
            ingredients,
        })
    }

    /// Overwrite a product's fields and replace its recipe.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::ProductNotFound` for an unknown product; see
    /// [`CatalogService::create_product`] for validation failures. Nothing
    /// is saved on error.
    #[instrument(skip(self, input), fields(product_id = %product_id))]
    pub async fn update_product(
        &self,
        product_id: ProductId,
        input: ProductInput,
        acting_user: Option<UserId>,
    ) -> Result<ProductDetails, ServiceError> {
        let draft = input.validate()?;

        let mut tx = self.store.begin().await?;
        let previous = tx.product_bom(product_id).await?;
        ensure_ingredients_active(&mut tx, &draft.bom).await?;

        let product = tx
            .update_product(product_id, &draft)
            .await?
            .ok_or(ServiceError::ProductNotFound(product_id))?;
        tx.replace_product_bom(product_id, &draft.bom).await?;

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::UpdateProduct,
            format!(
                "product #{product_id} '{}': recipe {} → {} ingredient(s)",
                product.name,
                previous.len(),
                draft.bom.len()
            ),
        )
        .await;

        let ingredients = tx.product_bom_entries(product_id).await?;
        tx.commit().await?;

        info!(product_id = %product_id, "Product updated");
        Ok(ProductDetails {
            product,
            ingredients,
        })
    }

    /// Take a product off the menu. Its row and recipe are kept.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::ProductNotFound` for an unknown product.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn hide_product(
        &self,
        product_id: ProductId,
        acting_user: Option<UserId>,
    ) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;

        if !tx.set_product_visible(product_id, false).await? {
            return Err(ServiceError::ProductNotFound(product_id));
        }

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::DeleteProduct,
            format!("product #{product_id}"),
        )
        .await;

        tx.commit().await?;

        info!(product_id = %product_id, "Product hidden");
        Ok(())
    }

    /// A product's recipe with ingredient names and units.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::ProductNotFound` for an unknown product.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn product_bom(
        &self,
        product_id: ProductId,
    ) -> Result<Vec<ProductBomEntry>, ServiceError> {
        let mut tx = self.store.begin().await?;

        if tx.product(product_id).await?.is_none() {
            return Err(ServiceError::ProductNotFound(product_id));
        }
        let entries = tx.product_bom_entries(product_id).await?;

        tx.rollback().await?;
        Ok(entries)
    }

    /// Get a product by ID.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::ProductNotFound` for an unknown product.
    pub async fn product(&self, product_id: ProductId) -> Result<Product, ServiceError> {
        let mut tx = self.store.begin().await?;
        let product = tx
            .product(product_id)
            .await?
            .ok_or(ServiceError::ProductNotFound(product_id))?;
        tx.rollback().await?;
        Ok(product)
    }

    // =========================================================================
    // Ingredients
    // =========================================================================

    /// Add an ingredient with its opening stock.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for blank names or a negative
    /// nominal stock.
    #[instrument(skip(self, input), fields(name = %input.name))]
    pub async fn create_ingredient(
        &self,
        input: CreateIngredientInput,
        acting_user: Option<UserId>,
    ) -> Result<Ingredient, ServiceError> {
        let (fields, opening_stock) = input.validate()?;

        let mut tx = self.store.begin().await?;
        let ingredient = tx.insert_ingredient(&fields, opening_stock).await?;

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::CreateIngredient,
            format!(
                "ingredient #{} '{}': opening stock {} {}",
                ingredient.id, ingredient.name, ingredient.stock_quantity, ingredient.unit
            ),
        )
        .await;

        tx.commit().await?;

        info!(ingredient_id = %ingredient.id, "Ingredient created");
        Ok(ingredient)
    }

    /// Edit name, unit and nominal stock. The on-hand quantity is untouched.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::IngredientNotFound` for a missing or
    /// deactivated ingredient.
    #[instrument(skip(self, input), fields(ingredient_id = %ingredient_id))]
    pub async fn update_ingredient(
        &self,
        ingredient_id: IngredientId,
        input: UpdateIngredientInput,
        acting_user: Option<UserId>,
    ) -> Result<Ingredient, ServiceError> {
        let fields = input.validate()?;

        let mut tx = self.store.begin().await?;
        let ingredient = tx
            .update_ingredient(ingredient_id, &fields)
            .await?
            .ok_or(ServiceError::IngredientNotFound(ingredient_id))?;

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::UpdateIngredient,
            format!("ingredient #{ingredient_id} '{}'", ingredient.name),
        )
        .await;

        tx.commit().await?;

        info!(ingredient_id = %ingredient_id, "Ingredient updated");
        Ok(ingredient)
    }

    /// Soft-delete an ingredient.
    ///
    /// Recipes that still reference it will fail to complete until they are
    /// edited.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::IngredientNotFound` for an unknown ingredient.
    #[instrument(skip(self), fields(ingredient_id = %ingredient_id))]
    pub async fn deactivate_ingredient(
        &self,
        ingredient_id: IngredientId,
        acting_user: Option<UserId>,
    ) -> Result<(), ServiceError> {
        let mut tx = self.store.begin().await?;

        if !tx.set_ingredient_active(ingredient_id, false).await? {
            return Err(ServiceError::IngredientNotFound(ingredient_id));
        }

        audit::record(
            &mut tx,
            acting_user,
            AuditAction::DeleteIngredient,
            format!("ingredient #{ingredient_id}"),
        )
        .await;

        tx.commit().await?;

        info!(ingredient_id = %ingredient_id, "Ingredient deactivated");
        Ok(())
    }

    /// Apply a warehouse correction (delivery, write-off, stocktake).
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a delta the stock column cannot
    /// store exactly, `ServiceError::IngredientNotFound` for a missing or
    /// deactivated ingredient.
    #[instrument(skip(self, input), fields(ingredient_id = %ingredient_id, delta = %input.delta))]
    pub async fn restock(
        &self,
        ingredient_id: IngredientId,
        input: RestockInput,
        acting_user: Option<UserId>,
    ) -> Result<Ingredient, ServiceError> {
        let delta = quantity(input.delta, "delta")?;
        let mut tx = self.store.begin().await?;

        let remaining = stock::adjust_stock(&mut tx, ingredient_id, delta).await?;
        let ingredient = tx
            .ingredient(ingredient_id)
            .await?
            .ok_or(ServiceError::IngredientNotFound(ingredient_id))?;

        let mut details = format!(
            "ingredient #{ingredient_id} '{}': {:+} → {remaining} {}",
            ingredient.name, delta, ingredient.unit
        );
        if let Some(note) = input.note.as_deref().map(str::trim).filter(|n| !n.is_empty()) {
            details.push_str(" (");
            details.push_str(note);
            details.push(')');
        }
        audit::record(&mut tx, acting_user, AuditAction::AdjustStock, details).await;

        tx.commit().await?;

        info!(ingredient_id = %ingredient_id, remaining = %remaining, "Stock corrected");
        Ok(ingredient)
    }
}

/// Every recipe ingredient must exist and be active.
async fn ensure_ingredients_active<T: StoreTransaction>(
    tx: &mut T,
    bom: &BomLines,
) -> Result<(), ServiceError> {
    for ingredient_id in bom.ingredient_ids() {
        match tx.ingredient(ingredient_id).await? {
            Some(ingredient) if ingredient.is_active => {}
            _ => return Err(ServiceError::IngredientNotFound(ingredient_id)),
        }
    }
    Ok(())
}

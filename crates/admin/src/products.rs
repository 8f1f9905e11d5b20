//! Catalog management for staff.

use thiserror::Error;
use tracing::{info, instrument};

use cafe_core::{NewProduct, ProductError, ProductId, ProductPatch};
use cafe_storefront::StoreError;
use cafe_storefront::services::CatalogService;

/// Errors from catalog management.
#[derive(Debug, Error)]
pub enum ProductAdminError {
    /// Payload failed validation; nothing was sent.
    #[error(transparent)]
    Invalid(#[from] ProductError),

    /// Store rejected the write.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Creates, edits and removes products.
///
/// Writes go to the catalog's store; every successful write empties the
/// catalog cache so customers see the change on their next read.
#[derive(Debug, Clone)]
pub struct ProductManager {
    catalog: CatalogService,
}

impl ProductManager {
    #[must_use]
    pub const fn new(catalog: CatalogService) -> Self {
        Self { catalog }
    }

    /// Add a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductAdminError::Invalid` for a blank name and
    /// `ProductAdminError::Store` if the write fails.
    #[instrument(skip(self, product), fields(name = %product.name))]
    pub async fn create(&self, product: NewProduct) -> Result<ProductId, ProductAdminError> {
        let product = product.validated()?;
        let id = self.catalog.store().create_product(&product).await?;
        self.catalog.invalidate().await;
        info!(product_id = %id, "Product created");
        Ok(id)
    }

    /// Change some fields of a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductAdminError::Invalid` for an empty patch or blank name
    /// and `ProductAdminError::Store` if the write fails (including
    /// `StoreError::NotFound`).
    #[instrument(skip(self, patch), fields(product_id = %id))]
    pub async fn update(&self, id: &ProductId, patch: ProductPatch) -> Result<(), ProductAdminError> {
        let patch = patch.validated()?;
        self.catalog.store().update_product(id, &patch).await?;
        self.catalog.invalidate().await;
        info!("Product updated");
        Ok(())
    }

    /// Remove a product. Past orders keep their snapshot of it.
    ///
    /// # Errors
    ///
    /// Returns `ProductAdminError::Store` if the write fails.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn delete(&self, id: &ProductId) -> Result<(), ProductAdminError> {
        self.catalog.store().delete_product(id).await?;
        self.catalog.invalidate().await;
        info!("Product deleted");
        Ok(())
    }

    /// Show or hide a product on the menu.
    ///
    /// # Errors
    ///
    /// As [`ProductManager::update`].
    pub async fn set_availability(&self, id: &ProductId, available: bool) -> Result<(), ProductAdminError> {
        self.update(
            id,
            ProductPatch {
                available: Some(available),
                ..ProductPatch::default()
            },
        )
        .await
    }

    /// Set the stock count.
    ///
    /// # Errors
    ///
    /// As [`ProductManager::update`].
    pub async fn restock(&self, id: &ProductId, stock: u32) -> Result<(), ProductAdminError> {
        self.update(
            id,
            ProductPatch {
                stock: Some(stock),
                ..ProductPatch::default()
            },
        )
        .await
    }
}

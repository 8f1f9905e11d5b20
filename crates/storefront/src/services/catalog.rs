//! Cached catalog reads.
//!
//! Products change rarely and are read on every menu view, so reads go
//! through a `moka` cache. Writes happen elsewhere (staff product
//! management) and call [`CatalogService::invalidate`].

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::{debug, instrument};

use cafe_core::{Product, ProductId};

use crate::store::{CatalogStore, StoreError};

/// Cache key for catalog reads.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
enum CacheKey {
    Products,
    Product(ProductId),
}

/// Cached value types.
#[derive(Debug, Clone)]
enum CacheValue {
    Products(Arc<Vec<Product>>),
    Product(Box<Product>),
}

/// Catalog reads with a TTL cache. Cheap to clone.
#[derive(Clone)]
pub struct CatalogService {
    inner: Arc<CatalogServiceInner>,
}

struct CatalogServiceInner {
    store: Arc<dyn CatalogStore>,
    cache: Cache<CacheKey, CacheValue>,
}

impl std::fmt::Debug for CatalogService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CatalogService")
            .field("cached_entries", &self.inner.cache.entry_count())
            .finish_non_exhaustive()
    }
}

impl CatalogService {
    /// Create a catalog service whose entries live for `ttl`.
    #[must_use]
    pub fn new(store: Arc<dyn CatalogStore>, ttl: Duration) -> Self {
        let cache = Cache::builder()
            .max_capacity(1000)
            .time_to_live(ttl)
            .build();

        Self {
            inner: Arc::new(CatalogServiceInner { store, cache }),
        }
    }

    /// The underlying store, for writes.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn CatalogStore> {
        &self.inner.store
    }

    /// All products, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the catalog cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Arc<Vec<Product>>, StoreError> {
        if let Some(CacheValue::Products(products)) =
            self.inner.cache.get(&CacheKey::Products).await
        {
            debug!("Cache hit for product list");
            return Ok(products);
        }

        let products = Arc::new(self.inner.store.list_products().await?);
        self.inner
            .cache
            .insert(CacheKey::Products, CacheValue::Products(products.clone()))
            .await;
        Ok(products)
    }

    /// One product by id.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the catalog cannot be read.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let key = CacheKey::Product(id.clone());
        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&key).await {
            debug!("Cache hit for product");
            return Ok(Some(*product));
        }

        let product = self.inner.store.get_product(id).await?;
        if let Some(product) = &product {
            self.inner
                .cache
                .insert(key, CacheValue::Product(Box::new(product.clone())))
                .await;
        }
        Ok(product)
    }

    /// One product read straight from the store, refreshing its cache entry.
    ///
    /// Used where a stale `available` or `stock` would let an order through.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the catalog cannot be read.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn get_fresh(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let key = CacheKey::Product(id.clone());
        let product = self.inner.store.get_product(id).await?;
        match &product {
            Some(product) => {
                self.inner
                    .cache
                    .insert(key, CacheValue::Product(Box::new(product.clone())))
                    .await;
            }
            None => self.inner.cache.invalidate(&key).await,
        }
        Ok(product)
    }

    /// Distinct categories in first-seen order.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the catalog cannot be read.
    pub async fn categories(&self) -> Result<Vec<String>, StoreError> {
        let products = self.list().await?;
        let mut categories: Vec<String> = Vec::new();
        for product in products.iter() {
            if !categories.contains(&product.category) {
                categories.push(product.category.clone());
            }
        }
        Ok(categories)
    }

    /// Products in a category; `None` means all of them.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the catalog cannot be read.
    pub async fn by_category(&self, category: Option<&str>) -> Result<Vec<Product>, StoreError> {
        let products = self.list().await?;
        Ok(products
            .iter()
            .filter(|p| category.is_none_or(|c| p.category == c))
            .cloned()
            .collect())
    }

    /// Drop every cached entry.
    pub async fn invalidate(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
        debug!("Catalog cache invalidated");
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cafe_core::{Money, NewProduct};

    use super::*;
    use crate::store::MemoryBackend;

    fn product(name: &str, category: &str) -> NewProduct {
        NewProduct {
            name: name.to_owned(),
            description: String::new(),
            price: Money::from_major(30),
            category: category.to_owned(),
            stock: 5,
            available: true,
            image: None,
        }
    }

    async fn seeded() -> (Arc<MemoryBackend>, CatalogService) {
        let backend = Arc::new(MemoryBackend::new());
        backend.insert_product(product("Espresso", "Coffee")).await;
        backend.insert_product(product("Cheesecake", "Desserts")).await;
        backend.insert_product(product("Latte", "Coffee")).await;
        let catalog = CatalogService::new(backend.clone(), Duration::from_secs(300));
        (backend, catalog)
    }

    #[tokio::test]
    async fn test_list_is_cached_until_invalidated() {
        let (backend, catalog) = seeded().await;

        assert_eq!(catalog.list().await.unwrap().len(), 3);
        assert_eq!(catalog.list().await.unwrap().len(), 3);
        assert_eq!(backend.remote_calls(), 1);

        backend.insert_product(product("Mocha", "Coffee")).await;
        assert_eq!(catalog.list().await.unwrap().len(), 3);

        catalog.invalidate().await;
        assert_eq!(catalog.list().await.unwrap().len(), 4);
        assert_eq!(backend.remote_calls(), 2);
    }

    #[tokio::test]
    async fn test_categories_first_seen_order() {
        let (_, catalog) = seeded().await;
        // Newest first: Latte, Cheesecake, Espresso
        assert_eq!(catalog.categories().await.unwrap(), vec!["Coffee", "Desserts"]);
    }

    #[tokio::test]
    async fn test_by_category() {
        let (_, catalog) = seeded().await;
        assert_eq!(catalog.by_category(None).await.unwrap().len(), 3);
        let coffee = catalog.by_category(Some("Coffee")).await.unwrap();
        assert_eq!(coffee.len(), 2);
        assert!(coffee.iter().all(|p| p.category == "Coffee"));
        assert!(catalog.by_category(Some("Tea")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_missing_product_not_cached() {
        let (backend, catalog) = seeded().await;
        let id = ProductId::new("ghost");
        assert!(catalog.get(&id).await.unwrap().is_none());
        assert!(catalog.get(&id).await.unwrap().is_none());
        assert_eq!(backend.remote_calls(), 2);
    }
}

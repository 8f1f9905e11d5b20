//! Staff services wired over one backend.

use std::sync::Arc;
use std::time::Duration;

use cafe_core::Identity;
use cafe_storefront::services::CatalogService;
use cafe_storefront::{HostedBackend, StoreError, Stores};

use crate::analytics::SalesAnalytics;
use crate::board::BoardHandle;
use crate::config::AdminConfig;
use crate::customers::CustomerDirectory;
use crate::poller::OrderPoller;
use crate::products::ProductManager;
use crate::seed::{SeedError, SeedReport, seed_catalog};
use crate::waiter::WaiterDesk;

/// Services shared by every staff view.
///
/// This struct is cheaply cloneable via `Arc`.
#[derive(Clone)]
pub struct AdminState {
    inner: Arc<AdminStateInner>,
}

struct AdminStateInner {
    stores: Stores,
    catalog: CatalogService,
    board: BoardHandle,
    products: ProductManager,
    customers: CustomerDirectory,
    analytics: SalesAnalytics,
    poll_interval: Duration,
}

impl std::fmt::Debug for AdminState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminState")
            .field("poll_interval", &self.inner.poll_interval)
            .finish_non_exhaustive()
    }
}

impl AdminState {
    /// Connect to the hosted backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend client cannot be built.
    pub fn connect(config: &AdminConfig) -> Result<Self, StoreError> {
        let backend = Arc::new(HostedBackend::new(&config.backend)?);
        Ok(Self::with_stores(
            Stores::from_backend(&backend),
            config.catalog_cache_ttl,
            config.poll_interval,
        ))
    }

    /// Build state over explicit stores.
    #[must_use]
    pub fn with_stores(stores: Stores, catalog_ttl: Duration, poll_interval: Duration) -> Self {
        let catalog = CatalogService::new(stores.catalog.clone(), catalog_ttl);
        let board = BoardHandle::new(stores.orders.clone());
        let products = ProductManager::new(catalog.clone());
        let customers = CustomerDirectory::new(stores.users.clone());
        let analytics = SalesAnalytics::new(stores.orders.clone(), stores.users.clone());

        Self {
            inner: Arc::new(AdminStateInner {
                stores,
                catalog,
                board,
                products,
                customers,
                analytics,
                poll_interval,
            }),
        }
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn board(&self) -> &BoardHandle {
        &self.inner.board
    }

    #[must_use]
    pub fn products(&self) -> &ProductManager {
        &self.inner.products
    }

    #[must_use]
    pub fn customers(&self) -> &CustomerDirectory {
        &self.inner.customers
    }

    #[must_use]
    pub fn analytics(&self) -> &SalesAnalytics {
        &self.inner.analytics
    }

    /// The signed-in staff member, if any.
    #[must_use]
    pub fn staff(&self) -> Option<Identity> {
        self.inner.stores.identity.subscribe().borrow().clone()
    }

    /// Keep the order board fresh until the returned poller is dropped.
    #[must_use]
    pub fn start_poller(&self) -> OrderPoller {
        OrderPoller::spawn(self.inner.board.clone(), self.inner.poll_interval)
    }

    /// A waiter desk with an empty cart. Call
    /// [`WaiterDesk::load_catalog`] before adding products.
    #[must_use]
    pub fn waiter_desk(&self) -> WaiterDesk {
        WaiterDesk::new(&self.inner.stores, self.inner.catalog.clone())
    }

    /// Seed the sample menu if the catalog is empty.
    ///
    /// # Errors
    ///
    /// Returns `SeedError` if the catalog cannot be read.
    pub async fn seed_catalog(&self) -> Result<SeedReport, SeedError> {
        let report = seed_catalog(self.inner.stores.catalog.as_ref()).await?;
        self.inner.catalog.invalidate().await;
        Ok(report)
    }
}

//! Table orders taken by staff.
//!
//! A [`WaiterDesk`] is one staff member's cart for the table they are
//! serving. Products come from a catalog snapshot loaded up front, so adding
//! by id or by scanned code needs no store round trip.

use std::sync::Arc;

use thiserror::Error;
use tracing::{debug, instrument};

use cafe_core::{Cart, CartError, Identity, Product, ProductId};
use cafe_storefront::qr::{self, QrError};
use cafe_storefront::services::{CatalogService, Session};
use cafe_storefront::{Checkout, CheckoutError, CheckoutReceipt, StoreError, Stores, TableTicket};

/// Errors from waiter actions.
#[derive(Debug, Error)]
pub enum WaiterError {
    /// Not in the loaded catalog.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// In the catalog but cannot be ordered.
    #[error(transparent)]
    ProductUnavailable(#[from] CartError),

    /// Scanned code is not a product code.
    #[error(transparent)]
    InvalidCode(#[from] QrError),

    /// Catalog could not be loaded.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Placing the order failed.
    #[error(transparent)]
    Checkout(#[from] CheckoutError),
}

/// Staff cart for one table.
pub struct WaiterDesk {
    cart: Cart,
    products: Arc<Vec<Product>>,
    catalog: CatalogService,
    checkout: Checkout,
}

impl std::fmt::Debug for WaiterDesk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaiterDesk")
            .field("cart", &self.cart)
            .field("products", &self.products.len())
            .finish_non_exhaustive()
    }
}

impl WaiterDesk {
    /// A desk with an empty cart and no catalog loaded.
    #[must_use]
    pub fn new(stores: &Stores, catalog: CatalogService) -> Self {
        // Table orders award no points, so the session is never signed in.
        let session = Session::new(stores.users.clone());
        let checkout = Checkout::new(
            stores.orders.clone(),
            stores.users.clone(),
            stores.points.clone(),
            session,
        );
        Self {
            cart: Cart::new(),
            products: Arc::new(Vec::new()),
            catalog,
            checkout,
        }
    }

    /// Load (or reload) the catalog snapshot.
    ///
    /// # Errors
    ///
    /// Returns `WaiterError::Store` if the catalog cannot be read. The
    /// previous snapshot is kept.
    #[instrument(skip(self))]
    pub async fn load_catalog(&mut self) -> Result<usize, WaiterError> {
        self.products = self.catalog.list().await?;
        Ok(self.products.len())
    }

    /// The loaded catalog snapshot.
    #[must_use]
    pub fn products(&self) -> &[Product] {
        &self.products
    }

    #[must_use]
    pub const fn cart(&self) -> &Cart {
        &self.cart
    }

    /// The checkout workflow, for observing its phase.
    #[must_use]
    pub const fn checkout_workflow(&self) -> &Checkout {
        &self.checkout
    }

    /// Add one unit of a product from the loaded catalog.
    ///
    /// # Errors
    ///
    /// Returns `WaiterError::ProductNotFound` if the id is not in the
    /// snapshot and `WaiterError::ProductUnavailable` if it cannot be ordered.
    pub fn add_by_id(&mut self, id: &ProductId) -> Result<&Product, WaiterError> {
        let product = self
            .products
            .iter()
            .find(|p| &p.id == id)
            .ok_or_else(|| WaiterError::ProductNotFound(id.clone()))?;
        self.cart.add_one(product.clone())?;
        debug!(product_id = %id, items = self.cart.item_count(), "Added to table cart");
        Ok(product)
    }

    /// Add one unit of the product in a scanned QR payload.
    ///
    /// # Errors
    ///
    /// Returns `WaiterError::InvalidCode` for payloads that are not product
    /// codes, otherwise as [`WaiterDesk::add_by_id`].
    pub fn add_scanned(&mut self, payload: &str) -> Result<&Product, WaiterError> {
        let scanned = qr::decode(payload)?;
        self.add_by_id(&scanned.product_id)
    }

    /// Set a line's quantity; zero or less removes it.
    pub fn update_quantity(&mut self, id: &ProductId, quantity: i64) {
        self.cart.update_quantity(id, quantity);
    }

    pub fn remove(&mut self, id: &ProductId) {
        self.cart.remove(id);
    }

    pub fn clear(&mut self) {
        self.cart.clear();
    }

    /// Place the table's order under the staff member's account.
    ///
    /// The cart is cleared only on success.
    ///
    /// # Errors
    ///
    /// See [`Checkout::checkout_for_table`].
    pub async fn place_order(
        &mut self,
        staff: Option<&Identity>,
        ticket: TableTicket,
    ) -> Result<CheckoutReceipt, WaiterError> {
        Ok(self
            .checkout
            .checkout_for_table(&mut self.cart, staff, ticket)
            .await?)
    }
}

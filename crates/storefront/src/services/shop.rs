//! One customer's shopping session.
//!
//! A [`ShopSession`] owns the customer's [`Cart`] and runs every cart action
//! and the checkout against it. Nothing is global: two sessions never see
//! each other's carts.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, instrument};

use cafe_core::{Cart, CartError, OrderSummary, Product, ProductId};

use super::catalog::CatalogService;
use super::checkout::{Checkout, CheckoutError, CheckoutReceipt, CheckoutRequest};
use super::session::Session;
use crate::qr::{self, QrError};
use crate::store::{OrderStore, StoreError, Stores};

/// Errors from shop actions.
#[derive(Debug, Error)]
pub enum ShopError {
    /// No product with that id.
    #[error("product {0} not found")]
    ProductNotFound(ProductId),

    /// Product exists but cannot be ordered.
    #[error(transparent)]
    ProductUnavailable(#[from] CartError),

    /// Scanned code is not a product code.
    #[error(transparent)]
    InvalidCode(#[from] QrError),

    /// Action needs a signed-in customer.
    #[error("sign in to see your orders")]
    NotAuthenticated,

    /// Store read failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// A customer's cart plus the services that act on it.
pub struct ShopSession {
    cart: Cart,
    catalog: CatalogService,
    checkout: Checkout,
    orders: Arc<dyn OrderStore>,
    session: Session,
}

impl std::fmt::Debug for ShopSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopSession")
            .field("cart", &self.cart)
            .field("session", &self.session)
            .finish_non_exhaustive()
    }
}

impl ShopSession {
    /// Start a session with an empty cart.
    #[must_use]
    pub fn new(stores: &Stores, catalog: CatalogService, session: Session) -> Self {
        let checkout = Checkout::new(
            stores.orders.clone(),
            stores.users.clone(),
            stores.points.clone(),
            session.clone(),
        );
        Self {
            cart: Cart::new(),
            catalog,
            checkout,
            orders: stores.orders.clone(),
            session,
        }
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

    /// Add `quantity` units of a catalog product.
    ///
    /// Availability is checked against the store, not the catalog cache.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::ProductNotFound` for unknown ids,
    /// `ShopError::ProductUnavailable` for products that cannot be ordered,
    /// and `ShopError::Store` if the catalog cannot be read.
    #[instrument(skip(self), fields(product_id = %id))]
    pub async fn add_product(&mut self, id: &ProductId, quantity: u32) -> Result<Product, ShopError> {
        let product = self
            .catalog
            .get_fresh(id)
            .await?
            .ok_or_else(|| ShopError::ProductNotFound(id.clone()))?;
        self.cart.add(product.clone(), quantity)?;
        debug!(quantity, items = self.cart.item_count(), "Added to cart");
        Ok(product)
    }

    /// Add one unit of the product in a scanned QR payload.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::InvalidCode` for payloads that are not product
    /// codes, otherwise as [`ShopSession::add_product`].
    pub async fn add_scanned(&mut self, payload: &str) -> Result<Product, ShopError> {
        let scanned = qr::decode(payload)?;
        self.add_product(&scanned.product_id, 1).await
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

    /// Check out the cart.
    ///
    /// # Errors
    ///
    /// See [`Checkout::checkout`].
    pub async fn checkout(
        &mut self,
        request: CheckoutRequest,
    ) -> Result<CheckoutReceipt, CheckoutError> {
        self.checkout.checkout(&mut self.cart, request).await
    }

    /// The signed-in customer's orders, newest first, projected at `now`.
    ///
    /// # Errors
    ///
    /// Returns `ShopError::NotAuthenticated` if nobody is signed in and
    /// `ShopError::Store` if orders cannot be read.
    pub async fn my_orders(&self, now: DateTime<Utc>) -> Result<Vec<OrderSummary>, ShopError> {
        let profile = self.session.current().ok_or(ShopError::NotAuthenticated)?;
        let orders = self.orders.list_orders_for_user(&profile.id).await?;
        Ok(orders
            .iter()
            .map(|order| OrderSummary::project(order, now))
            .collect())
    }
}

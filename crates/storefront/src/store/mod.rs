//! Contracts for the external stores the cafe depends on.
//!
//! The identity provider, user directory, catalog, order store and points
//! ledger are remote services. Everything above this module talks to them
//! through these traits, held as `Arc<dyn ...>` and injected explicitly.
//!
//! # Implementations
//!
//! - [`HostedBackend`] - REST adapter for the hosted backend
//! - [`MemoryBackend`] - in-process backend for tests (feature `memory`)

mod hosted;
#[cfg(any(test, feature = "memory"))]
mod memory;

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::SecretString;
use thiserror::Error;
use tokio::sync::watch;

use cafe_core::{
    Email, Identity, NewOrder, NewPointsEntry, NewProduct, Order, OrderId, OrderStatus,
    PointsEntry, PointsEntryId, Product, ProductId, ProductPatch, UserId, UserProfile,
};

pub use hosted::HostedBackend;
#[cfg(any(test, feature = "memory"))]
pub use memory::MemoryBackend;

/// Errors from store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// HTTP request failed before a response arrived.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The store answered with a non-success status.
    #[error("store returned {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Truncated response body.
        message: String,
    },

    /// Response body could not be parsed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The addressed record does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Backend URL cannot address store endpoints.
    #[error("invalid backend endpoint: {0}")]
    InvalidEndpoint(String),

    /// Store is unreachable or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

/// Errors from the identity provider.
#[derive(Debug, Error)]
pub enum IdentityError {
    /// Wrong email or password.
    #[error("invalid credentials")]
    InvalidCredentials,

    /// An account already exists for the email.
    #[error("email already registered")]
    EmailInUse,

    /// Provider rejected the password.
    #[error("password rejected: {0}")]
    WeakPassword(String),

    /// Provider request failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Authenticates users and reports identity changes.
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::InvalidCredentials` if the pair is rejected.
    async fn sign_in(&self, email: &Email, password: &SecretString)
    -> Result<Identity, IdentityError>;

    /// Create an account and sign it in.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::EmailInUse` if the email is taken.
    async fn register(
        &self,
        email: &Email,
        password: &SecretString,
        name: &str,
    ) -> Result<Identity, IdentityError>;

    /// End the current session.
    ///
    /// # Errors
    ///
    /// Returns `IdentityError::Store` if the provider call fails. The local
    /// identity is cleared either way.
    async fn sign_out(&self) -> Result<(), IdentityError>;

    /// Listen for identity changes. The current value is available
    /// immediately.
    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// Profiles keyed by user id.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn get_profile(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError>;
    async fn create_profile(&self, profile: &UserProfile) -> Result<(), StoreError>;
    /// Overwrite the loyalty balance.
    async fn set_points(&self, id: &UserId, points: u32) -> Result<(), StoreError>;
    async fn touch_last_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError>;
    /// All profiles, newest first.
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, StoreError>;
}

/// The product catalog.
#[async_trait]
pub trait CatalogStore: Send + Sync {
    /// All products, newest first.
    async fn list_products(&self) -> Result<Vec<Product>, StoreError>;
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError>;
    /// Insert a product; the store assigns id and timestamps.
    async fn create_product(&self, product: &NewProduct) -> Result<ProductId, StoreError>;
    async fn update_product(&self, id: &ProductId, patch: &ProductPatch)
    -> Result<(), StoreError>;
    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError>;
}

/// Submitted orders.
#[async_trait]
pub trait OrderStore: Send + Sync {
    /// All orders, newest first.
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError>;
    /// Orders owned by one user, newest first.
    async fn list_orders_for_user(&self, user: &UserId) -> Result<Vec<Order>, StoreError>;
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError>;
    /// Insert an order; the store assigns id and timestamps.
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, StoreError>;
    async fn set_order_status(&self, id: &OrderId, status: OrderStatus)
    -> Result<(), StoreError>;
}

/// Loyalty points history.
#[async_trait]
pub trait PointsLedger: Send + Sync {
    /// Entries for one user, most recent first.
    async fn list_points_history(&self, user: &UserId) -> Result<Vec<PointsEntry>, StoreError>;
    async fn record_points(&self, entry: &NewPointsEntry) -> Result<PointsEntryId, StoreError>;
}

/// Handles to every store, shared by the services.
///
/// Cheap to clone.
#[derive(Clone)]
pub struct Stores {
    pub identity: Arc<dyn IdentityProvider>,
    pub users: Arc<dyn UserDirectory>,
    pub catalog: Arc<dyn CatalogStore>,
    pub orders: Arc<dyn OrderStore>,
    pub points: Arc<dyn PointsLedger>,
}

impl Stores {
    /// Use one backend for every store.
    #[must_use]
    pub fn from_backend<B>(backend: &Arc<B>) -> Self
    where
        B: IdentityProvider + UserDirectory + CatalogStore + OrderStore + PointsLedger + 'static,
    {
        Self {
            identity: backend.clone(),
            users: backend.clone(),
            catalog: backend.clone(),
            orders: backend.clone(),
            points: backend.clone(),
        }
    }
}

impl std::fmt::Debug for Stores {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Stores").finish_non_exhaustive()
    }
}

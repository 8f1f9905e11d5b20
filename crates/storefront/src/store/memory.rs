//! In-process backend implementing every store contract.
//!
//! Used by tests and local development. Supports fault injection so failure
//! paths can be exercised, and counts every remote call.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use tokio::sync::{RwLock, watch};

use cafe_core::{
    Email, Identity, NewOrder, NewPointsEntry, NewProduct, Order, OrderId, OrderStatus,
    PointsEntry, PointsEntryId, Product, ProductId, ProductPatch, UserId, UserProfile,
};

use super::{
    CatalogStore, IdentityError, IdentityProvider, OrderStore, PointsLedger, StoreError,
    UserDirectory,
};

const MIN_PASSWORD_LENGTH: usize = 6;

struct Account {
    user_id: UserId,
    password: SecretString,
}

#[derive(Default)]
struct State {
    accounts: HashMap<Email, Account>,
    profiles: Vec<UserProfile>,
    products: Vec<Product>,
    orders: Vec<Order>,
    points: Vec<PointsEntry>,
}

#[derive(Default)]
struct Faults {
    order_reads: AtomicBool,
    order_writes: AtomicBool,
    points_writes: AtomicBool,
    ledger_writes: AtomicBool,
}

/// In-memory backend.
pub struct MemoryBackend {
    state: RwLock<State>,
    identity: watch::Sender<Option<Identity>>,
    faults: Faults,
    calls: AtomicUsize,
    next_id: AtomicU64,
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MemoryBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryBackend")
            .field("calls", &self.calls.load(Ordering::Relaxed))
            .finish_non_exhaustive()
    }
}

impl MemoryBackend {
    /// Create an empty backend with nobody signed in.
    #[must_use]
    pub fn new() -> Self {
        let (identity, _) = watch::channel(None);
        Self {
            state: RwLock::new(State::default()),
            identity,
            faults: Faults::default(),
            calls: AtomicUsize::new(0),
            next_id: AtomicU64::new(1),
        }
    }

    // =========================================================================
    // Fault injection
    // =========================================================================

    /// Make `list_orders`, `list_orders_for_user` and `get_order` fail.
    pub fn fail_order_reads(&self, fail: bool) {
        self.faults.order_reads.store(fail, Ordering::SeqCst);
    }

    /// Make `create_order` and `set_order_status` fail.
    pub fn fail_order_writes(&self, fail: bool) {
        self.faults.order_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `set_points` fail.
    pub fn fail_points_writes(&self, fail: bool) {
        self.faults.points_writes.store(fail, Ordering::SeqCst);
    }

    /// Make `record_points` fail.
    pub fn fail_ledger_writes(&self, fail: bool) {
        self.faults.ledger_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of store calls served so far, including failed ones.
    #[must_use]
    pub fn remote_calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    // =========================================================================
    // Fixtures (not counted as remote calls)
    // =========================================================================

    /// Insert a product directly and return it.
    pub async fn insert_product(&self, product: NewProduct) -> Product {
        let now = Utc::now();
        let product = Product {
            id: ProductId::new(self.next_id("product")),
            name: product.name,
            description: product.description,
            price: product.price,
            category: product.category,
            stock: product.stock,
            available: product.available,
            image: product.image,
            created_at: now,
            updated_at: now,
        };
        self.state.write().await.products.push(product.clone());
        product
    }

    /// Insert a profile directly.
    pub async fn insert_profile(&self, profile: UserProfile) {
        self.state.write().await.profiles.push(profile);
    }

    /// Current profile, read without counting a call.
    pub async fn profile(&self, id: &UserId) -> Option<UserProfile> {
        self.state
            .read()
            .await
            .profiles
            .iter()
            .find(|p| &p.id == id)
            .cloned()
    }

    /// Every order, oldest first, read without counting a call.
    pub async fn orders(&self) -> Vec<Order> {
        self.state.read().await.orders.clone()
    }

    /// Every points entry, oldest first, read without counting a call.
    pub async fn points_entries(&self) -> Vec<PointsEntry> {
        self.state.read().await.points.clone()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    fn record_call(&self) {
        self.calls.fetch_add(1, Ordering::SeqCst);
    }

    fn next_id(&self, prefix: &str) -> String {
        format!("{prefix}-{}", self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn check(flag: &AtomicBool, what: &str) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!("{what} rejected")));
        }
        Ok(())
    }
}

/// Newest first; insertion order breaks ties, latest insert first.
fn newest_first<T: Clone>(items: &[T], key: impl Fn(&T) -> DateTime<Utc>) -> Vec<T> {
    let mut out: Vec<T> = items.iter().rev().cloned().collect();
    out.sort_by_key(|item| std::cmp::Reverse(key(item)));
    out
}

#[async_trait]
impl IdentityProvider for MemoryBackend {
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Identity, IdentityError> {
        self.record_call();
        let state = self.state.read().await;
        let account = state
            .accounts
            .get(email)
            .filter(|a| a.password.expose_secret() == password.expose_secret())
            .ok_or(IdentityError::InvalidCredentials)?;
        let identity = Identity {
            user_id: account.user_id.clone(),
            email: email.clone(),
        };
        drop(state);
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn register(
        &self,
        email: &Email,
        password: &SecretString,
        _name: &str,
    ) -> Result<Identity, IdentityError> {
        self.record_call();
        if password.expose_secret().len() < MIN_PASSWORD_LENGTH {
            return Err(IdentityError::WeakPassword(format!(
                "must be at least {MIN_PASSWORD_LENGTH} characters"
            )));
        }
        let mut state = self.state.write().await;
        if state.accounts.contains_key(email) {
            return Err(IdentityError::EmailInUse);
        }
        let user_id = UserId::new(self.next_id("user"));
        state.accounts.insert(
            email.clone(),
            Account {
                user_id: user_id.clone(),
                password: SecretString::from(password.expose_secret().to_owned()),
            },
        );
        drop(state);
        let identity = Identity {
            user_id,
            email: email.clone(),
        };
        self.identity.send_replace(Some(identity.clone()));
        Ok(identity)
    }

    async fn sign_out(&self) -> Result<(), IdentityError> {
        self.record_call();
        self.identity.send_replace(None);
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.identity.subscribe()
    }
}

#[async_trait]
impl UserDirectory for MemoryBackend {
    async fn get_profile(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        self.record_call();
        Ok(self.profile(id).await)
    }

    async fn create_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        self.record_call();
        let mut state = self.state.write().await;
        state.profiles.retain(|p| p.id != profile.id);
        state.profiles.push(profile.clone());
        Ok(())
    }

    async fn set_points(&self, id: &UserId, points: u32) -> Result<(), StoreError> {
        self.record_call();
        Self::check(&self.faults.points_writes, "points update")?;
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {id}")))?;
        profile.points = points;
        Ok(())
    }

    async fn touch_last_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.record_call();
        let mut state = self.state.write().await;
        let profile = state
            .profiles
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("profile {id}")))?;
        profile.last_login = Some(at);
        Ok(())
    }

    async fn list_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        self.record_call();
        let state = self.state.read().await;
        Ok(newest_first(&state.profiles, |p| p.created_at))
    }
}

#[async_trait]
impl CatalogStore for MemoryBackend {
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.record_call();
        let state = self.state.read().await;
        Ok(newest_first(&state.products, |p| p.created_at))
    }

    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        self.record_call();
        let state = self.state.read().await;
        Ok(state.products.iter().find(|p| &p.id == id).cloned())
    }

    async fn create_product(&self, product: &NewProduct) -> Result<ProductId, StoreError> {
        self.record_call();
        Ok(self.insert_product(product.clone()).await.id)
    }

    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<(), StoreError> {
        self.record_call();
        let mut state = self.state.write().await;
        let product = state
            .products
            .iter_mut()
            .find(|p| &p.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("product {id}")))?;
        patch.apply_to(product, Utc::now());
        Ok(())
    }

    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        self.record_call();
        let mut state = self.state.write().await;
        let before = state.products.len();
        state.products.retain(|p| &p.id != id);
        if state.products.len() == before {
            return Err(StoreError::NotFound(format!("product {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for MemoryBackend {
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.record_call();
        Self::check(&self.faults.order_reads, "order read")?;
        let state = self.state.read().await;
        Ok(newest_first(&state.orders, |o| o.created_at))
    }

    async fn list_orders_for_user(&self, user: &UserId) -> Result<Vec<Order>, StoreError> {
        self.record_call();
        Self::check(&self.faults.order_reads, "order read")?;
        let state = self.state.read().await;
        let owned: Vec<Order> = state
            .orders
            .iter()
            .filter(|o| &o.user_id == user)
            .cloned()
            .collect();
        Ok(newest_first(&owned, |o| o.created_at))
    }

    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        self.record_call();
        Self::check(&self.faults.order_reads, "order read")?;
        let state = self.state.read().await;
        Ok(state.orders.iter().find(|o| &o.id == id).cloned())
    }

    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, StoreError> {
        self.record_call();
        Self::check(&self.faults.order_writes, "order write")?;
        let id = OrderId::new(self.next_id("order"));
        let order = Order::from_new(id.clone(), order.clone(), Utc::now());
        self.state.write().await.orders.push(order);
        Ok(id)
    }

    async fn set_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        self.record_call();
        Self::check(&self.faults.order_writes, "order write")?;
        let mut state = self.state.write().await;
        let order = state
            .orders
            .iter_mut()
            .find(|o| &o.id == id)
            .ok_or_else(|| StoreError::NotFound(format!("order {id}")))?;
        order.status = status;
        order.updated_at = Utc::now();
        Ok(())
    }
}

#[async_trait]
impl PointsLedger for MemoryBackend {
    async fn list_points_history(&self, user: &UserId) -> Result<Vec<PointsEntry>, StoreError> {
        self.record_call();
        let state = self.state.read().await;
        let owned: Vec<PointsEntry> = state
            .points
            .iter()
            .filter(|e| &e.user_id == user)
            .cloned()
            .collect();
        Ok(newest_first(&owned, |e| e.date))
    }

    async fn record_points(&self, entry: &NewPointsEntry) -> Result<PointsEntryId, StoreError> {
        self.record_call();
        Self::check(&self.faults.ledger_writes, "points history write")?;
        let id = PointsEntryId::new(self.next_id("points"));
        self.state.write().await.points.push(PointsEntry {
            id: id.clone(),
            user_id: entry.user_id.clone(),
            date: Utc::now(),
            description: entry.description.clone(),
            points: entry.points,
            kind: entry.kind,
        });
        Ok(id)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use cafe_core::Money;

    use super::*;

    fn latte() -> NewProduct {
        NewProduct {
            name: "Latte".to_owned(),
            description: String::new(),
            price: Money::from_major(45),
            category: "Coffee".to_owned(),
            stock: 10,
            available: true,
            image: None,
        }
    }

    #[tokio::test]
    async fn test_sign_in_requires_matching_password() {
        let backend = MemoryBackend::new();
        let email = Email::parse("ana@cafe.example").unwrap();
        let mut rx = backend.subscribe();

        backend
            .register(&email, &SecretString::from("espresso42"), "Ana")
            .await
            .unwrap();
        assert!(rx.borrow_and_update().is_some());

        let err = backend
            .sign_in(&email, &SecretString::from("wrong-pass"))
            .await
            .unwrap_err();
        assert!(matches!(err, IdentityError::InvalidCredentials));

        backend.sign_out().await.unwrap();
        assert!(rx.borrow_and_update().is_none());
    }

    #[tokio::test]
    async fn test_register_twice_is_email_in_use() {
        let backend = MemoryBackend::new();
        let email = Email::parse("ana@cafe.example").unwrap();
        let password = SecretString::from("espresso42");
        backend.register(&email, &password, "Ana").await.unwrap();
        let err = backend.register(&email, &password, "Ana").await.unwrap_err();
        assert!(matches!(err, IdentityError::EmailInUse));
    }

    #[tokio::test]
    async fn test_products_listed_newest_first() {
        let backend = MemoryBackend::new();
        let first = backend.insert_product(latte()).await;
        let second = backend.insert_product(latte()).await;

        let listed = backend.list_products().await.unwrap();
        assert_eq!(listed[0].id, second.id);
        assert_eq!(listed[1].id, first.id);
    }

    #[tokio::test]
    async fn test_faults_and_call_counting() {
        let backend = MemoryBackend::new();
        assert_eq!(backend.remote_calls(), 0);

        backend.fail_ledger_writes(true);
        let entry = NewPointsEntry::earned(UserId::new("u1"), 5, "Order");
        assert!(backend.record_points(&entry).await.is_err());
        backend.fail_ledger_writes(false);
        backend.record_points(&entry).await.unwrap();

        assert_eq!(backend.remote_calls(), 2);
        assert_eq!(backend.points_entries().await.len(), 1);
    }

    #[tokio::test]
    async fn test_update_missing_product_is_not_found() {
        let backend = MemoryBackend::new();
        let patch = ProductPatch {
            stock: Some(3),
            ..ProductPatch::default()
        };
        let err = backend
            .update_product(&ProductId::new("nope"), &patch)
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }
}

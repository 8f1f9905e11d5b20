//! End-to-end scenarios for the cafe services.
//!
//! Every scenario runs the storefront and admin services against one shared
//! in-memory backend, so a customer's checkout shows up on the staff board
//! exactly as it would over the hosted backend.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p cafe-integration-tests
//! ```

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::sync::Arc;
use std::time::Duration;

use secrecy::SecretString;

use cafe_admin::AdminState;
use cafe_core::{Money, NewProduct, Product, UserProfile};
use cafe_storefront::{AppState, MemoryBackend, Stores};

/// Storefront and admin wired over one in-memory backend.
pub struct TestCafe {
    pub backend: Arc<MemoryBackend>,
    pub storefront: AppState,
    pub admin: AdminState,
}

impl TestCafe {
    /// A cafe with no products and no users. New customers start with zero
    /// points.
    #[must_use]
    pub fn new() -> Self {
        let backend = Arc::new(MemoryBackend::new());
        let storefront =
            AppState::with_stores(Stores::from_backend(&backend), 0, Duration::from_secs(60));
        let admin = AdminState::with_stores(
            Stores::from_backend(&backend),
            Duration::from_secs(60),
            Duration::from_secs(10),
        );
        Self {
            backend,
            storefront,
            admin,
        }
    }

    /// Insert an available product.
    pub async fn product(&self, name: &str, price: u32, stock: u32) -> Product {
        self.backend
            .insert_product(NewProduct {
                name: name.to_owned(),
                description: String::new(),
                price: Money::from_major(price),
                category: "Menu".to_owned(),
                stock,
                available: true,
                image: None,
            })
            .await
    }

    /// Register and sign in a customer through the storefront.
    ///
    /// # Panics
    ///
    /// Panics if registration fails.
    pub async fn customer(&self, name: &str, email: &str) -> UserProfile {
        self.storefront
            .auth()
            .register(name, email, &SecretString::from("espresso42"))
            .await
            .expect("customer registration failed")
    }
}

impl Default for TestCafe {
    fn default() -> Self {
        Self::new()
    }
}

//! Storefront state shared across a customer's views.

use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::StorefrontConfig;
use crate::services::{AuthService, CatalogService, LoyaltyService, Session, ShopSession};
use crate::store::{HostedBackend, StoreError, Stores};

/// Services for one signed-in (or anonymous) customer.
///
/// This struct is cheaply cloneable via `Arc`. Carts are not part of it:
/// each [`ShopSession`] owns its own.
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    stores: Stores,
    session: Session,
    catalog: CatalogService,
    auth: AuthService,
    loyalty: LoyaltyService,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("session", &self.inner.session)
            .finish_non_exhaustive()
    }
}

impl AppState {
    /// Connect to the hosted backend described by `config`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the backend client cannot be built.
    pub fn connect(config: &StorefrontConfig) -> Result<Self, StoreError> {
        let backend = Arc::new(HostedBackend::new(&config.backend)?);
        Ok(Self::with_stores(
            Stores::from_backend(&backend),
            config.welcome_points,
            config.catalog_cache_ttl,
        ))
    }

    /// Build state over explicit stores.
    #[must_use]
    pub fn with_stores(stores: Stores, welcome_points: u32, catalog_ttl: Duration) -> Self {
        let session = Session::new(stores.users.clone());
        let catalog = CatalogService::new(stores.catalog.clone(), catalog_ttl);
        let auth = AuthService::new(
            stores.identity.clone(),
            stores.users.clone(),
            stores.points.clone(),
            session.clone(),
            welcome_points,
        );
        let loyalty = LoyaltyService::new(stores.points.clone());

        Self {
            inner: Arc::new(AppStateInner {
                stores,
                session,
                catalog,
                auth,
                loyalty,
            }),
        }
    }

    #[must_use]
    pub fn stores(&self) -> &Stores {
        &self.inner.stores
    }

    #[must_use]
    pub fn session(&self) -> &Session {
        &self.inner.session
    }

    #[must_use]
    pub fn catalog(&self) -> &CatalogService {
        &self.inner.catalog
    }

    #[must_use]
    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    #[must_use]
    pub fn loyalty(&self) -> &LoyaltyService {
        &self.inner.loyalty
    }

    /// Start a shopping session with an empty cart.
    #[must_use]
    pub fn shop(&self) -> ShopSession {
        ShopSession::new(
            &self.inner.stores,
            self.inner.catalog.clone(),
            self.inner.session.clone(),
        )
    }

    /// Keep the session in sync with the identity provider in the
    /// background. Abort the handle to stop.
    #[must_use]
    pub fn follow_identity(&self) -> JoinHandle<()> {
        let identities = self.inner.stores.identity.subscribe();
        tokio::spawn(self.inner.session.clone().follow(identities))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use secrecy::SecretString;
    use url::Url;

    use super::*;
    use crate::config::BackendConfig;
    use crate::store::MemoryBackend;

    #[test]
    fn test_connect_builds_hosted_state() {
        let config = StorefrontConfig {
            backend: BackendConfig {
                url: Url::parse("https://cafe.backend.test").unwrap(),
                api_key: SecretString::from("k3y-Abc.987-Zq"),
                timeout: Duration::from_secs(15),
            },
            welcome_points: 50,
            catalog_cache_ttl: Duration::from_secs(300),
            sentry_dsn: None,
            sentry_environment: None,
        };
        let state = AppState::connect(&config).unwrap();
        assert!(!state.session().is_authenticated());
    }

    #[tokio::test]
    async fn test_follow_identity_loads_registered_profile() {
        let backend = Arc::new(MemoryBackend::new());
        let state = AppState::with_stores(
            Stores::from_backend(&backend),
            50,
            Duration::from_secs(60),
        );
        let follower = state.follow_identity();

        let profile = state
            .auth()
            .register("Ana", "ana@cafe.example", &SecretString::from("espresso42"))
            .await
            .unwrap();
        state
            .session()
            .subscribe()
            .wait_for(|p| p.as_ref().is_some_and(|p| p.id == profile.id))
            .await
            .unwrap();
        assert_eq!(state.session().current().unwrap().points, 50);
        follower.abort();
    }
}

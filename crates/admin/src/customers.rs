//! Customer listing for the CRM.

use std::sync::Arc;

use tracing::instrument;

use cafe_core::{Role, UserProfile};
use cafe_storefront::{StoreError, UserDirectory};

/// Read access to customer profiles.
#[derive(Clone)]
pub struct CustomerDirectory {
    users: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for CustomerDirectory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CustomerDirectory").finish_non_exhaustive()
    }
}

impl CustomerDirectory {
    #[must_use]
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Every profile with the customer role, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if profiles cannot be read.
    #[instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<UserProfile>, StoreError> {
        let mut customers: Vec<UserProfile> = self
            .users
            .list_profiles()
            .await?
            .into_iter()
            .filter(|p| p.role == Role::User)
            .collect();
        customers.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(customers)
    }

    /// Customers whose name or email contains `query`, ignoring case.
    ///
    /// A blank query matches everyone.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if profiles cannot be read.
    pub async fn search(&self, query: &str) -> Result<Vec<UserProfile>, StoreError> {
        let needle = query.trim().to_lowercase();
        let customers = self.list().await?;
        if needle.is_empty() {
            return Ok(customers);
        }
        Ok(customers
            .into_iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.email.as_str().to_lowercase().contains(&needle)
            })
            .collect())
    }
}

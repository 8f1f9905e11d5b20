//! Authentication service.
//!
//! Wraps the identity provider with the profile bookkeeping the cafe needs:
//! registration creates a customer profile with a welcome bonus, and sign
//! in stamps the last login time.

use std::sync::Arc;

use chrono::Utc;
use secrecy::SecretString;
use thiserror::Error;
use tracing::{info, instrument, warn};

use cafe_core::{Email, EmailError, NewPointsEntry, UserProfile};

use super::session::Session;
use crate::store::{IdentityError, IdentityProvider, PointsLedger, StoreError, UserDirectory};

const WELCOME_DESCRIPTION: &str = "Welcome bonus";

/// Errors that can occur during authentication operations.
#[derive(Debug, Error)]
pub enum AuthError {
    /// Invalid email format.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// Registration without a name.
    #[error("name is required")]
    MissingName,

    /// Signed in, but no profile exists for the account.
    #[error("account has no profile")]
    ProfileMissing,

    /// Identity provider error.
    #[error(transparent)]
    Identity(#[from] IdentityError),

    /// Profile store error.
    #[error("profile store error: {0}")]
    Store(#[from] StoreError),
}

/// Sign in, registration and sign out.
pub struct AuthService {
    identity: Arc<dyn IdentityProvider>,
    users: Arc<dyn UserDirectory>,
    ledger: Arc<dyn PointsLedger>,
    session: Session,
    welcome_points: u32,
}

impl std::fmt::Debug for AuthService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthService")
            .field("welcome_points", &self.welcome_points)
            .finish_non_exhaustive()
    }
}

impl AuthService {
    /// Create an authentication service.
    #[must_use]
    pub fn new(
        identity: Arc<dyn IdentityProvider>,
        users: Arc<dyn UserDirectory>,
        ledger: Arc<dyn PointsLedger>,
        session: Session,
        welcome_points: u32,
    ) -> Self {
        Self {
            identity,
            users,
            ledger,
            session,
            welcome_points,
        }
    }

    /// Sign in and load the profile into the session.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` if the email is malformed,
    /// `AuthError::Identity` if the provider rejects the credentials, and
    /// `AuthError::ProfileMissing` if the account has no profile.
    #[instrument(skip(self, password))]
    pub async fn sign_in(
        &self,
        email: &str,
        password: &SecretString,
    ) -> Result<UserProfile, AuthError> {
        let email = Email::parse(email)?;
        let identity = self.identity.sign_in(&email, password).await?;

        let profile = self
            .session
            .apply_identity(Some(&identity))
            .await?
            .ok_or(AuthError::ProfileMissing)?;

        if let Err(e) = self
            .users
            .touch_last_login(&identity.user_id, Utc::now())
            .await
        {
            warn!(error = %e, user_id = %identity.user_id, "Failed to update last login");
        }

        info!(user_id = %profile.id, "User signed in");
        Ok(profile)
    }

    /// Create an account and customer profile, crediting the welcome bonus.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::MissingName` for a blank name,
    /// `AuthError::InvalidEmail` for a malformed email, `AuthError::Identity`
    /// if the provider refuses the account, and `AuthError::Store` if the
    /// profile cannot be written.
    #[instrument(skip(self, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &SecretString,
    ) -> Result<UserProfile, AuthError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AuthError::MissingName);
        }
        let email = Email::parse(email)?;

        let identity = self.identity.register(&email, password, name).await?;
        let profile = UserProfile::new_customer(&identity, name, self.welcome_points);
        self.users.create_profile(&profile).await?;

        if self.welcome_points > 0 {
            let entry = NewPointsEntry::earned(
                profile.id.clone(),
                self.welcome_points,
                WELCOME_DESCRIPTION,
            );
            if let Err(e) = self.ledger.record_points(&entry).await {
                warn!(error = %e, user_id = %profile.id, "Failed to record welcome bonus history");
            }
        }

        self.session.set_profile(Some(profile.clone()));
        info!(user_id = %profile.id, welcome_points = self.welcome_points, "User registered");
        Ok(profile)
    }

    /// Sign out. The session is cleared even if the provider call fails.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::Identity` if the provider call fails.
    #[instrument(skip(self))]
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let result = self.identity.sign_out().await;
        self.session.set_profile(None);
        result?;
        info!("User signed out");
        Ok(())
    }
}

//! Password auth against the GoTrue-style `/auth/v1` API.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tokio::sync::watch;
use tracing::{info, instrument, warn};

use cafe_core::{Email, Identity, UserId};

use super::HostedBackend;
use crate::store::{IdentityError, IdentityProvider, StoreError};

#[derive(Debug, Deserialize)]
struct AuthUser {
    id: String,
    email: Option<String>,
}

/// Token and signup responses.
///
/// Signup without auto-confirm returns the bare user instead of a session.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    access_token: Option<String>,
    user: Option<AuthUser>,
    id: Option<String>,
    email: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    error_code: Option<String>,
    msg: Option<String>,
    error_description: Option<String>,
}

impl AuthErrorBody {
    fn parse(message: &str) -> Self {
        serde_json::from_str(message).unwrap_or_default()
    }

    fn message(self) -> String {
        self.msg
            .or(self.error_description)
            .unwrap_or_else(|| "rejected by identity provider".to_owned())
    }
}

impl AuthResponse {
    /// Resolve the identity, falling back to the submitted email.
    fn identity(self, fallback_email: &Email) -> Result<(Option<String>, Identity), StoreError> {
        let (id, email) = match self.user {
            Some(user) => (Some(user.id), user.email),
            None => (self.id, self.email),
        };
        let id = id.ok_or_else(|| StoreError::NotFound("user id in auth response".to_owned()))?;
        let email = email
            .and_then(|raw| Email::parse(&raw).ok())
            .unwrap_or_else(|| fallback_email.clone());
        Ok((
            self.access_token,
            Identity {
                user_id: UserId::new(id),
                email,
            },
        ))
    }
}

impl HostedBackend {
    async fn start_session(
        &self,
        response: AuthResponse,
        email: &Email,
    ) -> Result<Identity, IdentityError> {
        let (token, identity) = response.identity(email)?;
        self.set_session(token.map(SecretString::from), Some(identity.clone()))
            .await;
        Ok(identity)
    }
}

#[async_trait]
impl IdentityProvider for HostedBackend {
    #[instrument(skip(self, password), fields(email = %email))]
    async fn sign_in(
        &self,
        email: &Email,
        password: &SecretString,
    ) -> Result<Identity, IdentityError> {
        let mut url = self.auth_url("token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");
        let body = json!({ "email": email, "password": password.expose_secret() });

        let response = match self
            .fetch::<AuthResponse>(self.request(Method::POST, url).await.json(&body))
            .await
        {
            Ok(response) => response,
            Err(StoreError::Status { status, .. })
                if status == StatusCode::BAD_REQUEST.as_u16() =>
            {
                return Err(IdentityError::InvalidCredentials);
            }
            Err(e) => return Err(e.into()),
        };

        let identity = self.start_session(response, email).await?;
        info!(user_id = %identity.user_id, "Signed in");
        Ok(identity)
    }

    #[instrument(skip(self, password, name), fields(email = %email))]
    async fn register(
        &self,
        email: &Email,
        password: &SecretString,
        name: &str,
    ) -> Result<Identity, IdentityError> {
        let url = self.auth_url("signup")?;
        let body = json!({
            "email": email,
            "password": password.expose_secret(),
            "data": { "name": name },
        });

        let response = match self
            .fetch::<AuthResponse>(self.request(Method::POST, url).await.json(&body))
            .await
        {
            Ok(response) => response,
            Err(StoreError::Status { status, message })
                if status == StatusCode::UNPROCESSABLE_ENTITY.as_u16() =>
            {
                let body = AuthErrorBody::parse(&message);
                return Err(if body.error_code.as_deref() == Some("weak_password") {
                    IdentityError::WeakPassword(body.message())
                } else {
                    IdentityError::EmailInUse
                });
            }
            Err(e) => return Err(e.into()),
        };

        let identity = self.start_session(response, email).await?;
        info!(user_id = %identity.user_id, "Registered");
        Ok(identity)
    }

    #[instrument(skip(self))]
    async fn sign_out(&self) -> Result<(), IdentityError> {
        let url = self.auth_url("logout")?;
        let result = self.send(self.request(Method::POST, url).await).await;
        self.set_session(None, None).await;
        if let Err(e) = result {
            warn!(error = %e, "Remote sign-out failed; local session cleared");
            return Err(e.into());
        }
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.inner.identity.subscribe()
    }
}

//! REST adapter for the hosted backend.
//!
//! The backend exposes PostgREST-style tables under `/rest/v1` and a
//! GoTrue-style auth API under `/auth/v1`. Every request carries the project
//! `apikey` header plus a bearer token: the signed-in user's access token
//! when there is one, otherwise the project key.
//!
//! Money columns travel as decimal strings, timestamps as RFC 3339.

mod auth;
mod tables;

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use tokio::sync::{RwLock, watch};
use tracing::debug;
use url::Url;

use cafe_core::Identity;

use super::StoreError;
use crate::config::BackendConfig;

const REST_PREFIX: &[&str] = &["rest", "v1"];
const AUTH_PREFIX: &[&str] = &["auth", "v1"];
const ERROR_BODY_LIMIT: usize = 500;

/// Client for the hosted backend.
///
/// Implements every store contract. Cheap to clone.
#[derive(Clone)]
pub struct HostedBackend {
    inner: Arc<HostedBackendInner>,
}

struct HostedBackendInner {
    client: reqwest::Client,
    base: Url,
    api_key: SecretString,
    access_token: RwLock<Option<SecretString>>,
    identity: watch::Sender<Option<Identity>>,
}

impl std::fmt::Debug for HostedBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HostedBackend")
            .field("base", &self.inner.base.as_str())
            .finish_non_exhaustive()
    }
}

impl HostedBackend {
    /// Create a client for the configured backend.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::InvalidEndpoint` if the URL cannot carry a path,
    /// or `StoreError::Http` if the HTTP client cannot be built.
    pub fn new(config: &BackendConfig) -> Result<Self, StoreError> {
        if config.url.cannot_be_a_base() {
            return Err(StoreError::InvalidEndpoint(config.url.to_string()));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()?;
        let (identity, _) = watch::channel(None);

        Ok(Self {
            inner: Arc::new(HostedBackendInner {
                client,
                base: config.url.clone(),
                api_key: config.api_key.clone(),
                access_token: RwLock::new(None),
                identity,
            }),
        })
    }

    /// URL for a table under `/rest/v1`.
    fn table_url(&self, table: &str) -> Result<Url, StoreError> {
        self.endpoint(REST_PREFIX, table)
    }

    /// URL for an auth endpoint under `/auth/v1`.
    fn auth_url(&self, path: &str) -> Result<Url, StoreError> {
        self.endpoint(AUTH_PREFIX, path)
    }

    fn endpoint(&self, prefix: &[&str], last: &str) -> Result<Url, StoreError> {
        let mut url = self.inner.base.clone();
        url.path_segments_mut()
            .map_err(|()| StoreError::InvalidEndpoint(self.inner.base.to_string()))?
            .pop_if_empty()
            .extend(prefix)
            .push(last);
        Ok(url)
    }

    /// Start a request with the `apikey` and bearer headers set.
    async fn request(&self, method: Method, url: Url) -> RequestBuilder {
        let bearer = self
            .inner
            .access_token
            .read()
            .await
            .as_ref()
            .map_or_else(
                || self.inner.api_key.expose_secret().to_owned(),
                |token| token.expose_secret().to_owned(),
            );

        self.inner
            .client
            .request(method, url)
            .header("apikey", self.inner.api_key.expose_secret())
            .bearer_auth(bearer)
    }

    /// Send a request and fail on non-success statuses.
    async fn send(&self, builder: RequestBuilder) -> Result<Response, StoreError> {
        let response = builder.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        tracing::error!(
            status = %status,
            body = %body.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
            "Backend returned non-success status"
        );
        Err(StoreError::Status {
            status: status.as_u16(),
            message: body.chars().take(200).collect(),
        })
    }

    /// Send a request and decode the JSON body.
    async fn fetch<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, StoreError> {
        let response = self.send(builder).await?;
        let text = response.text().await?;
        match serde_json::from_str(&text) {
            Ok(value) => Ok(value),
            Err(e) => {
                tracing::error!(
                    error = %e,
                    body = %text.chars().take(ERROR_BODY_LIMIT).collect::<String>(),
                    "Failed to parse backend response"
                );
                Err(StoreError::Parse(e))
            }
        }
    }

    /// Replace the session token and notify identity subscribers.
    async fn set_session(&self, token: Option<SecretString>, identity: Option<Identity>) {
        *self.inner.access_token.write().await = token;
        debug!(signed_in = identity.is_some(), "Backend session changed");
        self.inner.identity.send_replace(identity);
    }
}

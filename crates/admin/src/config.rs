//! Admin configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CAFE_BACKEND_URL` - Base URL of the hosted backend
//! - `CAFE_BACKEND_KEY` - Project API key (high entropy)
//!
//! ## Optional
//! - `CAFE_BACKEND_TIMEOUT_SECS` - HTTP timeout for backend calls (default: 15)
//! - `CAFE_ORDER_POLL_SECS` - Order board refresh interval (default: 10)
//! - `CAFE_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::time::Duration;

use cafe_storefront::config::{BackendConfig, ConfigError, get_optional_env, parse_env_or};

const DEFAULT_POLL_SECS: u64 = 10;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;

/// Admin application configuration.
#[derive(Debug, Clone)]
pub struct AdminConfig {
    /// Hosted backend connection
    pub backend: BackendConfig,
    /// How often the order board re-fetches orders
    pub poll_interval: Duration,
    /// How long catalog reads are cached
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl AdminConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid,
    /// if the backend key fails validation, or if the poll interval is zero.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            backend: BackendConfig::from_env()?,
            poll_interval: poll_interval(parse_env_or("CAFE_ORDER_POLL_SECS", DEFAULT_POLL_SECS)?)?,
            catalog_cache_ttl: Duration::from_secs(parse_env_or(
                "CAFE_CATALOG_CACHE_TTL_SECS",
                DEFAULT_CATALOG_TTL_SECS,
            )?),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Install logging and, when a DSN is set, Sentry. Keep the guard alive
    /// for the life of the process.
    #[must_use]
    pub fn init_telemetry(&self) -> Option<sentry::ClientInitGuard> {
        cafe_storefront::telemetry::init(
            "cafe-admin",
            self.sentry_dsn.as_deref(),
            self.sentry_environment.as_deref(),
        )
    }
}

fn poll_interval(secs: u64) -> Result<Duration, ConfigError> {
    if secs == 0 {
        return Err(ConfigError::InvalidEnvVar(
            "CAFE_ORDER_POLL_SECS".to_string(),
            "must be greater than zero".to_string(),
        ));
    }
    Ok(Duration::from_secs(secs))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_poll_interval_rejected() {
        assert!(matches!(
            poll_interval(0),
            Err(ConfigError::InvalidEnvVar(key, _)) if key == "CAFE_ORDER_POLL_SECS"
        ));
        assert_eq!(poll_interval(10).unwrap(), Duration::from_secs(10));
    }
}

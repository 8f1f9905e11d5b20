//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `CAFE_BACKEND_URL` - Base URL of the hosted backend (e.g. `https://xyz.backend.example`)
//! - `CAFE_BACKEND_KEY` - Project API key sent with every request (high entropy)
//!
//! ## Optional
//! - `CAFE_BACKEND_TIMEOUT_SECS` - HTTP timeout for backend calls (default: 15)
//! - `CAFE_WELCOME_POINTS` - Points granted on registration (default: 50)
//! - `CAFE_CATALOG_CACHE_TTL_SECS` - Catalog cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_TIMEOUT_SECS: u64 = 15;
const DEFAULT_WELCOME_POINTS: u32 = 50;
const DEFAULT_CATALOG_TTL_SECS: u64 = 300;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Hosted backend connection settings.
///
/// Implements `Debug` manually to redact the API key.
#[derive(Clone)]
pub struct BackendConfig {
    /// Base URL; REST tables live under `/rest/v1`, auth under `/auth/v1`
    pub url: Url,
    /// Project API key
    pub api_key: SecretString,
    /// Per-request timeout
    pub timeout: Duration,
}

impl std::fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl BackendConfig {
    /// Load backend settings from the environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if the URL or key is missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url = Url::parse(&get_required_env("CAFE_BACKEND_URL")?).map_err(|e| {
            ConfigError::InvalidEnvVar("CAFE_BACKEND_URL".to_string(), e.to_string())
        })?;
        let api_key = get_validated_secret("CAFE_BACKEND_KEY")?;
        let timeout = Duration::from_secs(parse_env_or(
            "CAFE_BACKEND_TIMEOUT_SECS",
            DEFAULT_TIMEOUT_SECS,
        )?);

        Ok(Self {
            url,
            api_key,
            timeout,
        })
    }
}

/// Storefront application configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Hosted backend connection
    pub backend: BackendConfig,
    /// Points credited when a customer registers
    pub welcome_points: u32,
    /// How long catalog reads are cached
    pub catalog_cache_ttl: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        Ok(Self {
            backend: BackendConfig::from_env()?,
            welcome_points: parse_env_or("CAFE_WELCOME_POINTS", DEFAULT_WELCOME_POINTS)?,
            catalog_cache_ttl: Duration::from_secs(parse_env_or(
                "CAFE_CATALOG_CACHE_TTL_SECS",
                DEFAULT_CATALOG_TTL_SECS,
            )?),
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Install logging and, when a DSN is set, Sentry.
    #[must_use]
    pub fn init_telemetry(&self) -> Option<sentry::ClientInitGuard> {
        crate::telemetry::init(
            "cafe-storefront",
            self.sentry_dsn.as_deref(),
            self.sentry_environment.as_deref(),
        )
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
pub(crate) fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating blank values as unset.
#[must_use]
pub fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional environment variable, falling back to a default.
///
/// # Errors
///
/// Returns `ConfigError::InvalidEnvVar` if the variable is set but does not
/// parse.
pub fn parse_env_or<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| parse_value(key, &raw))
}

fn parse_value<T>(key: &str, raw: &str) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    raw.trim()
        .parse::<T>()
        .map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.chars().count() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the backend."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
pub(crate) fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_uniform_and_single() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("zzzz") - 0.0).abs() < f64::EPSILON);
        assert!((shannon_entropy("ab") - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_placeholder_key_rejected() {
        let err = validate_secret_strength("your-backend-key", "CAFE_BACKEND_KEY").unwrap_err();
        assert!(matches!(err, ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_low_entropy_key_rejected() {
        assert!(validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaa", "CAFE_BACKEND_KEY").is_err());
    }

    #[test]
    fn test_random_key_accepted() {
        assert!(validate_secret_strength("eyJ4bGciOiJIUzI1NiIs.k9Qz-Lm3", "CAFE_BACKEND_KEY").is_ok());
    }

    #[test]
    fn test_parse_value_reports_key() {
        let err = parse_value::<u32>("CAFE_WELCOME_POINTS", "lots").unwrap_err();
        match err {
            ConfigError::InvalidEnvVar(key, _) => assert_eq!(key, "CAFE_WELCOME_POINTS"),
            other => panic!("unexpected error: {other}"),
        }
        assert_eq!(parse_value::<u64>("X", " 10 ").unwrap(), 10);
    }

    #[test]
    fn test_backend_config_debug_redacts_key() {
        let config = BackendConfig {
            url: Url::parse("https://cafe.backend.test").unwrap(),
            api_key: SecretString::from("super_private_backend_key"),
            timeout: Duration::from_secs(15),
        };
        let debug_output = format!("{config:?}");
        assert!(debug_output.contains("cafe.backend.test"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("super_private_backend_key"));
    }
}

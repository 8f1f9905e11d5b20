//! Tracing and Sentry setup shared by the storefront and admin services.

use sentry::integrations::tracing as sentry_tracing;
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

/// Set to `json` to emit structured JSON log lines.
const LOG_FORMAT_VAR: &str = "CAFE_LOG_FORMAT";

/// Initialize Sentry (when a DSN is set) and the global tracing subscriber.
///
/// `service` is the crate target used as the default filter
/// (`<service>=info`) when `RUST_LOG` is unset. The returned guard flushes
/// Sentry on drop and must be kept alive for the life of the process.
///
/// Installing the subscriber twice is not an error: the second call leaves
/// the existing subscriber in place.
#[must_use]
pub fn init(
    service: &str,
    sentry_dsn: Option<&str>,
    environment: Option<&str>,
) -> Option<sentry::ClientInitGuard> {
    // Sentry must be initialized before the subscriber
    let guard = sentry_dsn.map(|dsn| {
        sentry::init((
            dsn,
            sentry::ClientOptions {
                release: sentry::release_name!(),
                environment: environment.map(|env| std::borrow::Cow::Owned(env.to_owned())),
                attach_stacktrace: true,
                ..Default::default()
            },
        ))
    });

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{}=info", service.replace('-', "_"))));
    let json = std::env::var(LOG_FORMAT_VAR).is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    let installed = tracing_subscriber::registry()
        .with(env_filter)
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(tracing_subscriber::fmt::layer))
        .with(sentry_tracing::layer().event_filter(sentry_event_filter))
        .try_init()
        .is_ok();

    if !installed {
        tracing::debug!("Tracing subscriber already installed");
    }
    if guard.is_some() {
        tracing::info!(service, "Sentry initialized");
    }
    guard
}

/// Route tracing events to Sentry: errors and warnings become events,
/// info and debug become breadcrumbs.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_twice_keeps_first_subscriber() {
        assert!(init("cafe-storefront", None, None).is_none());
        assert!(init("cafe-storefront", None, Some("test")).is_none());
        tracing::info!("still logging");
    }
}

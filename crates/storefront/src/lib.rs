//! Cafe Storefront library.
//!
//! Customer-facing services built on the hosted backend:
//!
//! - [`store`] - Contracts for the identity provider, user directory, catalog,
//!   order store and points ledger, plus the hosted REST adapter
//! - [`services`] - Auth, session handle, catalog cache, checkout workflow,
//!   loyalty, and the per-session [`services::shop::ShopSession`]
//! - [`qr`] - Product QR payloads, SVG rendering, and camera scan sessions
//! - [`state`] - [`AppState`], the wired-up services for one customer
//! - [`config`] / [`telemetry`] - Environment configuration and tracing/Sentry setup
//!
//! # Architecture
//!
//! There is no ambient state. Each session owns its [`cafe_core::Cart`] and
//! receives the store handles and session explicitly.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod qr;
pub mod services;
pub mod state;
pub mod store;
pub mod telemetry;

pub use services::checkout::{
    AwardOutcome, Checkout, CheckoutError, CheckoutPhase, CheckoutReceipt, CheckoutRequest,
    TableTicket,
};
pub use state::AppState;
#[cfg(any(test, feature = "memory"))]
pub use store::MemoryBackend;
pub use store::{
    CatalogStore, HostedBackend, IdentityError, IdentityProvider, OrderStore, PointsLedger,
    StoreError, Stores, UserDirectory,
};

//! Cafe Core - Shared domain types.
//!
//! This crate provides the types used across the cafe components:
//! - `storefront` - Customer-facing services (cart, checkout, QR, loyalty)
//! - `admin` - Staff and CRM services (order board, waiter desk, catalog management)
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no store access,
//! no HTTP clients. This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for ids, money, emails, and statuses
//! - [`models`] - Products, orders, user profiles, points entries
//! - [`cart`] - The session-scoped cart aggregator
//! - [`display`] - Display projection for orders (badges, relative age, summaries)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod display;
pub mod models;
pub mod types;

pub use cart::{Cart, CartError, CartLine};
pub use display::{OrderSummary, format_elapsed};
pub use models::*;
pub use types::*;

//! Cafe Admin library.
//!
//! Staff and CRM services over the same stores the storefront uses:
//!
//! - [`board`] / [`poller`] - Live order board with optimistic status changes
//! - [`waiter`] - Table orders placed by staff
//! - [`products`] - Catalog management
//! - [`customers`] / [`analytics`] - Customer listing and sales figures
//! - [`seed`] - Sample menu for an empty catalog
//! - [`state`] - [`AdminState`], the wired-up services

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod board;
pub mod config;
pub mod customers;
pub mod poller;
pub mod products;
pub mod seed;
pub mod state;
pub mod waiter;

pub use analytics::{BestSeller, SalesAnalytics, SalesReport};
pub use board::{BoardError, BoardHandle, OrderBoard};
pub use config::AdminConfig;
pub use customers::CustomerDirectory;
pub use poller::OrderPoller;
pub use products::{ProductAdminError, ProductManager};
pub use seed::{SeedError, SeedReport, seed_catalog};
pub use state::AdminState;
pub use waiter::{WaiterDesk, WaiterError};

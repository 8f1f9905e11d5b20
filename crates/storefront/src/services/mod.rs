//! Business logic services for the storefront.
//!
//! # Services
//!
//! - `auth` - Sign in, registration with welcome bonus, sign out
//! - `session` - The signed-in customer's profile, kept in sync with the
//!   identity provider
//! - `catalog` - Cached product reads and category filtering
//! - `checkout` - Cart to order, then loyalty points
//! - `loyalty` - Points rules and history
//! - `shop` - One customer's cart and the actions on it

pub mod auth;
pub mod catalog;
pub mod checkout;
pub mod loyalty;
pub mod session;
pub mod shop;

pub use auth::{AuthError, AuthService};
pub use catalog::CatalogService;
pub use loyalty::LoyaltyService;
pub use session::Session;
pub use shop::{ShopError, ShopSession};

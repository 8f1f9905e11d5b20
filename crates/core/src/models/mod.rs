//! Domain models.
//!
//! These are validated domain objects, separate from whatever row shape the
//! hosted store uses on the wire.

pub mod order;
pub mod product;
pub mod user;

pub use order::{NewOrder, Order, OrderItem};
pub use product::{NewProduct, Product, ProductError, ProductPatch};
pub use user::{Identity, NewPointsEntry, PointsEntry, UserProfile};

//! Session-scoped shopping cart.
//!
//! A [`Cart`] belongs to exactly one session (a customer browsing, or a staff
//! member building one table's order). It is a plain owned value: nothing is
//! persisted and nothing is shared, so there is no locking.
//!
//! # Invariants
//!
//! - At most one line per product id; adding an existing product merges.
//! - Every line has a quantity of at least one.
//! - Lines keep insertion order.
//! - [`Cart::total`] is computed from the lines on every call.

use serde::Serialize;

use crate::models::{OrderItem, Product};
use crate::types::{Money, ProductId};

/// Errors from cart mutations.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CartError {
    /// Product is unavailable or out of stock.
    #[error("product {name} is not available")]
    ProductUnavailable {
        /// Rejected product id.
        id: ProductId,
        /// Rejected product name.
        name: String,
    },
}

/// One product and its quantity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CartLine {
    product: Product,
    quantity: u32,
}

impl CartLine {
    /// The product as it was when added.
    #[must_use]
    pub const fn product(&self) -> &Product {
        &self.product
    }

    /// Quantity, always at least one.
    #[must_use]
    pub const fn quantity(&self) -> u32 {
        self.quantity
    }

    /// Unit price times quantity.
    #[must_use]
    pub fn subtotal(&self) -> Money {
        self.product.price.times(self.quantity)
    }
}

/// The cart aggregator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    /// Create an empty cart.
    #[must_use]
    pub const fn new() -> Self {
        Self { lines: Vec::new() }
    }

    /// Add `quantity` units of a product.
    ///
    /// Merges into the existing line for the same product id, otherwise
    /// appends a new line. A quantity of zero is a no-op.
    ///
    /// # Errors
    ///
    /// Returns `CartError::ProductUnavailable` if the product is unavailable
    /// or has no stock. The cart is unchanged.
    pub fn add(&mut self, product: Product, quantity: u32) -> Result<(), CartError> {
        if !product.is_orderable() {
            return Err(CartError::ProductUnavailable {
                id: product.id,
                name: product.name,
            });
        }
        if quantity == 0 {
            return Ok(());
        }

        if let Some(line) = self.line_mut(&product.id) {
            line.quantity = line.quantity.saturating_add(quantity);
        } else {
            self.lines.push(CartLine { product, quantity });
        }
        Ok(())
    }

    /// Add a single unit of a product.
    ///
    /// # Errors
    ///
    /// Same as [`Cart::add`].
    pub fn add_one(&mut self, product: Product) -> Result<(), CartError> {
        self.add(product, 1)
    }

    /// Remove the line for a product. Absent products are ignored.
    pub fn remove(&mut self, product_id: &ProductId) {
        self.lines.retain(|line| &line.product.id != product_id);
    }

    /// Set a line's quantity to exactly `quantity`.
    ///
    /// Zero or negative removes the line. Absent products are ignored.
    pub fn update_quantity(&mut self, product_id: &ProductId, quantity: i64) {
        match u32::try_from(quantity) {
            Ok(quantity) if quantity > 0 => {
                if let Some(line) = self.line_mut(product_id) {
                    line.quantity = quantity;
                }
            }
            Ok(_) => self.remove(product_id),
            // Negative removes; anything above u32::MAX saturates.
            Err(_) if quantity < 0 => self.remove(product_id),
            Err(_) => {
                if let Some(line) = self.line_mut(product_id) {
                    line.quantity = u32::MAX;
                }
            }
        }
    }

    /// Empty the cart.
    pub fn clear(&mut self) {
        self.lines.clear();
    }

    /// Sum of price times quantity over all lines.
    #[must_use]
    pub fn total(&self) -> Money {
        self.lines.iter().map(CartLine::subtotal).sum()
    }

    /// Total number of units.
    #[must_use]
    pub fn item_count(&self) -> u32 {
        self.lines
            .iter()
            .fold(0u32, |acc, line| acc.saturating_add(line.quantity))
    }

    /// Lines in insertion order.
    #[must_use]
    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    /// Line for a product, if present.
    #[must_use]
    pub fn get(&self, product_id: &ProductId) -> Option<&CartLine> {
        self.lines.iter().find(|line| &line.product.id == product_id)
    }

    /// Number of distinct products.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lines.len()
    }

    /// Whether the cart has no lines.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Immutable order-item snapshot of the current lines.
    #[must_use]
    pub fn to_order_items(&self) -> Vec<OrderItem> {
        self.lines.iter().map(OrderItem::snapshot).collect()
    }

    fn line_mut(&mut self, product_id: &ProductId) -> Option<&mut CartLine> {
        self.lines
            .iter_mut()
            .find(|line| &line.product.id == product_id)
    }
}

//! Orders and their line-item snapshots.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cart::CartLine;
use crate::types::{CheckoutKey, Money, OrderId, OrderStatus, PaymentMethod, ProductId, UserId};

/// One line of an order, snapshotted at creation.
///
/// Name and price are copies, not references: later product edits do not
/// change existing orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub product_id: ProductId,
    pub product_name: String,
    pub price: Money,
    pub quantity: u32,
    pub subtotal: Money,
}

impl OrderItem {
    /// Snapshot a cart line.
    #[must_use]
    pub fn snapshot(line: &CartLine) -> Self {
        let price = line.product().price;
        let quantity = line.quantity();
        Self {
            product_id: line.product().id.clone(),
            product_name: line.product().name.clone(),
            price,
            quantity,
            subtotal: price.times(quantity),
        }
    }
}

/// Order payload submitted to the order store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    /// Purchasing user, or the staff member for table orders.
    pub user_id: UserId,
    /// Customer name shown on the order.
    pub user_name: String,
    pub user_email: String,
    /// Table reference for staff-placed orders.
    pub table: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub checkout_key: CheckoutKey,
}

/// A persisted order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub user_id: UserId,
    pub user_name: String,
    pub user_email: String,
    pub table: Option<String>,
    pub items: Vec<OrderItem>,
    pub total: Money,
    pub status: OrderStatus,
    pub payment_method: PaymentMethod,
    pub notes: Option<String>,
    pub checkout_key: Option<CheckoutKey>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    /// Materialize a submitted order with store-assigned id and timestamps.
    #[must_use]
    pub fn from_new(id: OrderId, new: NewOrder, now: DateTime<Utc>) -> Self {
        Self {
            id,
            user_id: new.user_id,
            user_name: new.user_name,
            user_email: new.user_email,
            table: new.table,
            items: new.items,
            total: new.total,
            status: new.status,
            payment_method: new.payment_method,
            notes: new.notes,
            checkout_key: Some(new.checkout_key),
            created_at: now,
            updated_at: now,
        }
    }

    /// Name to show for the customer, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.user_name.trim().is_empty() {
            &self.user_email
        } else {
            &self.user_name
        }
    }

    /// Items as `"Latte x2, Cheesecake x1"`.
    #[must_use]
    pub fn items_summary(&self) -> String {
        self.items
            .iter()
            .map(|item| format!("{} x{}", item.product_name, item.quantity))
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Total number of units across all items.
    #[must_use]
    pub fn unit_count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, item| acc.saturating_add(item.quantity))
    }
}

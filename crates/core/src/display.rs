//! Display projection for orders.
//!
//! Read by both the customer order history and the staff order board.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::models::Order;
use crate::types::{Money, OrderId, OrderStatus, StatusBadge};

const MINUTE: i64 = 60;
const HOUR: i64 = 60 * MINUTE;
const DAY: i64 = 24 * HOUR;

/// Coarse relative age: `"30s"`, `"2m"`, `"5h"`, `"3d"`.
///
/// Timestamps in the future (clock skew, server-assigned times) count as
/// zero elapsed.
#[must_use]
pub fn format_elapsed(timestamp: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let secs = (now - timestamp).num_seconds().max(0);
    match secs {
        s if s < MINUTE => format!("{s}s"),
        s if s < HOUR => format!("{}m", s / MINUTE),
        s if s < DAY => format!("{}h", s / HOUR),
        s => format!("{}d", s / DAY),
    }
}

/// One row of an order list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrderSummary {
    pub id: OrderId,
    pub customer: String,
    pub table: Option<String>,
    pub items: String,
    pub total: Money,
    pub status: OrderStatus,
    pub badge: StatusBadge,
    pub elapsed: String,
}

impl OrderSummary {
    /// Project an order for display at `now`.
    #[must_use]
    pub fn project(order: &Order, now: DateTime<Utc>) -> Self {
        Self {
            id: order.id.clone(),
            customer: order.display_name().to_owned(),
            table: order.table.clone(),
            items: order.items_summary(),
            total: order.total,
            status: order.status,
            badge: order.status.badge(),
            elapsed: format_elapsed(order.created_at, now),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    fn ago(secs: i64) -> String {
        let now = Utc::now();
        format_elapsed(now - Duration::seconds(secs), now)
    }

    #[test]
    fn test_seconds_scale() {
        assert_eq!(ago(0), "0s");
        assert_eq!(ago(30), "30s");
        assert_eq!(ago(59), "59s");
    }

    #[test]
    fn test_minutes_scale() {
        assert_eq!(ago(60), "1m");
        assert_eq!(ago(125), "2m");
        assert_eq!(ago(3599), "59m");
    }

    #[test]
    fn test_hours_and_days_scale() {
        assert_eq!(ago(3600), "1h");
        assert_eq!(ago(23 * 3600 + 59), "23h");
        assert_eq!(ago(86_400), "1d");
        assert_eq!(ago(10 * 86_400), "10d");
    }

    #[test]
    fn test_future_timestamp_clamps_to_zero() {
        assert_eq!(ago(-90), "0s");
    }
}

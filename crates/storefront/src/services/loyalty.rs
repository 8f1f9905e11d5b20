//! Loyalty points rules and history.

use std::sync::Arc;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use cafe_core::{Money, PointsEntry, UserId};

use crate::store::{PointsLedger, StoreError};

/// Currency units spent per point earned, and points per currency unit of
/// discount.
const POINTS_RATIO: u32 = 10;

/// Points earned for an order total: one point per 10 currency units,
/// rounded down.
#[must_use]
pub fn points_for(total: Money) -> u32 {
    (total.amount() / Decimal::from(POINTS_RATIO))
        .floor()
        .to_u32()
        .unwrap_or(u32::MAX)
}

/// Currency value of a points balance. Display only; redemption is not
/// supported.
#[must_use]
pub fn discount_value(points: u32) -> Money {
    Money::from_major(points / POINTS_RATIO)
}

/// Read access to a user's points history.
#[derive(Clone)]
pub struct LoyaltyService {
    ledger: Arc<dyn PointsLedger>,
}

impl std::fmt::Debug for LoyaltyService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoyaltyService").finish_non_exhaustive()
    }
}

impl LoyaltyService {
    #[must_use]
    pub fn new(ledger: Arc<dyn PointsLedger>) -> Self {
        Self { ledger }
    }

    /// See [`points_for`].
    #[must_use]
    pub fn points_for(&self, total: Money) -> u32 {
        points_for(total)
    }

    /// See [`discount_value`].
    #[must_use]
    pub fn discount_value(&self, points: u32) -> Money {
        discount_value(points)
    }

    /// Points movements for a user, most recent first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if the ledger cannot be read.
    pub async fn history(&self, user: &UserId) -> Result<Vec<PointsEntry>, StoreError> {
        self.ledger.list_points_history(user).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::str::FromStr;

    use cafe_core::NewPointsEntry;

    use super::*;
    use crate::store::MemoryBackend;

    fn money(s: &str) -> Money {
        Money::new(Decimal::from_str(s).unwrap()).unwrap()
    }

    #[test]
    fn test_points_round_down() {
        assert_eq!(points_for(money("115")), 11);
        assert_eq!(points_for(money("9.99")), 0);
        assert_eq!(points_for(money("10")), 1);
        assert_eq!(points_for(money("129.50")), 12);
        assert_eq!(points_for(Money::ZERO), 0);
    }

    #[test]
    fn test_discount_value() {
        assert_eq!(discount_value(50), Money::from_major(5));
        assert_eq!(discount_value(9), Money::ZERO);
    }

    #[tokio::test]
    async fn test_history_most_recent_first() {
        let backend = Arc::new(MemoryBackend::new());
        let user = UserId::new("u1");
        backend
            .record_points(&NewPointsEntry::earned(user.clone(), 50, "Welcome bonus"))
            .await
            .unwrap();
        backend
            .record_points(&NewPointsEntry::earned(user.clone(), 11, "Order order-2"))
            .await
            .unwrap();
        backend
            .record_points(&NewPointsEntry::earned(UserId::new("u2"), 3, "Order order-3"))
            .await
            .unwrap();

        let history = LoyaltyService::new(backend).history(&user).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].points, 11);
        assert_eq!(history[1].description, "Welcome bonus");
    }
}

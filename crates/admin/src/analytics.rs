//! Sales figures for the CRM dashboard.

use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

use serde::Serialize;
use tracing::instrument;

use cafe_core::{Money, Order, OrderStatus, ProductId, Role, UserProfile};
use cafe_storefront::{OrderStore, StoreError, UserDirectory};

/// Units sold of one product.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BestSeller {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: u32,
    pub revenue: Money,
}

/// Dashboard figures.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SalesReport {
    /// Sum of order totals, cancelled orders excluded.
    pub total_sales: Money,
    /// Every order, cancelled included.
    pub order_count: usize,
    pub customer_count: usize,
    pub by_status: BTreeMap<&'static str, usize>,
    /// Most units sold first.
    pub best_sellers: Vec<BestSeller>,
}

impl SalesReport {
    /// Figures over already-loaded orders and profiles.
    ///
    /// `top` limits the best-seller list. Ties are broken by name.
    #[must_use]
    pub fn compute(orders: &[Order], profiles: &[UserProfile], top: usize) -> Self {
        let mut by_status: BTreeMap<&'static str, usize> =
            OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        let mut sellers: HashMap<&ProductId, BestSeller> = HashMap::new();
        let mut total_sales = Money::ZERO;

        for order in orders {
            *by_status.entry(order.status.as_str()).or_insert(0) += 1;
            if order.status == OrderStatus::Cancelled {
                continue;
            }
            total_sales = total_sales + order.total;
            for item in &order.items {
                let entry = sellers.entry(&item.product_id).or_insert_with(|| BestSeller {
                    product_id: item.product_id.clone(),
                    product_name: item.product_name.clone(),
                    quantity: 0,
                    revenue: Money::ZERO,
                });
                entry.quantity = entry.quantity.saturating_add(item.quantity);
                entry.revenue = entry.revenue + item.subtotal;
            }
        }

        let mut best_sellers: Vec<BestSeller> = sellers.into_values().collect();
        best_sellers.sort_by(|a, b| {
            b.quantity
                .cmp(&a.quantity)
                .then_with(|| a.product_name.cmp(&b.product_name))
        });
        best_sellers.truncate(top);

        Self {
            total_sales,
            order_count: orders.len(),
            customer_count: profiles.iter().filter(|p| p.role == Role::User).count(),
            by_status,
            best_sellers,
        }
    }
}

/// Loads orders and profiles and computes a [`SalesReport`].
#[derive(Clone)]
pub struct SalesAnalytics {
    orders: Arc<dyn OrderStore>,
    users: Arc<dyn UserDirectory>,
}

impl std::fmt::Debug for SalesAnalytics {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SalesAnalytics").finish_non_exhaustive()
    }
}

impl SalesAnalytics {
    /// Best sellers listed by default.
    pub const DEFAULT_TOP: usize = 5;

    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>, users: Arc<dyn UserDirectory>) -> Self {
        Self { orders, users }
    }

    /// Current figures.
    ///
    /// # Errors
    ///
    /// Returns `StoreError` if orders or profiles cannot be read.
    #[instrument(skip(self))]
    pub async fn report(&self, top: usize) -> Result<SalesReport, StoreError> {
        let (orders, profiles) =
            tokio::try_join!(self.orders.list_orders(), self.users.list_profiles())?;
        Ok(SalesReport::compute(&orders, &profiles, top))
    }
}

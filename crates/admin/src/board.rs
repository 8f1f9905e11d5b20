//! Live order board for staff.
//!
//! The board holds the latest snapshot of every order. Polling replaces the
//! snapshot wholesale. Staff status changes are applied to the board before
//! the store confirms them; if the store write fails the change is rolled
//! back, unless a newer snapshot has arrived in the meantime (it already
//! reflects the store).
//!
//! The board is shared as `Arc<RwLock<OrderBoard>>` between the poller and
//! staff actions. No lock is held across a store call.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use thiserror::Error;
use tokio::sync::RwLock;
use tracing::{info, instrument, warn};

use cafe_core::{Order, OrderId, OrderStatus, OrderSummary};
use cafe_storefront::{OrderStore, StoreError};

/// Errors from board actions.
#[derive(Debug, Error)]
pub enum BoardError {
    /// The order is not on the board.
    #[error("order {0} is not on the board")]
    UnknownOrder(OrderId),

    /// The store rejected the status change; the board was rolled back.
    #[error("failed to update order {id}")]
    UpdateFailed {
        id: OrderId,
        #[source]
        source: StoreError,
    },

    /// Fetching orders failed.
    #[error("failed to load orders: {0}")]
    Load(#[from] StoreError),
}

/// An applied but unconfirmed status change.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingChange {
    previous: OrderStatus,
    generation: u64,
}

/// The latest order snapshot.
#[derive(Debug, Default)]
pub struct OrderBoard {
    orders: Vec<Order>,
    generation: u64,
}

impl OrderBoard {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            orders: Vec::new(),
            generation: 0,
        }
    }

    /// Replace the snapshot. Counts as newer than any pending change.
    pub fn replace(&mut self, orders: Vec<Order>) {
        self.orders = orders;
        self.generation += 1;
    }

    /// Orders as last loaded, newest first.
    #[must_use]
    pub fn orders(&self) -> &[Order] {
        &self.orders
    }

    #[must_use]
    pub fn get(&self, id: &OrderId) -> Option<&Order> {
        self.orders.iter().find(|o| &o.id == id)
    }

    /// Number of snapshots applied so far.
    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    /// Set a status locally, remembering how to undo it.
    ///
    /// Returns `None` if the order is not on the board.
    pub fn apply_optimistic(&mut self, id: &OrderId, status: OrderStatus) -> Option<PendingChange> {
        let generation = self.generation;
        let order = self.orders.iter_mut().find(|o| &o.id == id)?;
        let previous = order.status;
        order.status = status;
        Some(PendingChange {
            previous,
            generation,
        })
    }

    /// Undo a pending change, unless a newer snapshot replaced it.
    ///
    /// Returns whether the board was changed.
    pub fn rollback(&mut self, id: &OrderId, pending: PendingChange) -> bool {
        if self.generation != pending.generation {
            return false;
        }
        match self.orders.iter_mut().find(|o| &o.id == id) {
            Some(order) => {
                order.status = pending.previous;
                true
            }
            None => false,
        }
    }

    /// Display rows at `now`.
    #[must_use]
    pub fn summaries(&self, now: DateTime<Utc>) -> Vec<OrderSummary> {
        self.orders
            .iter()
            .map(|order| OrderSummary::project(order, now))
            .collect()
    }

    /// Orders in one status.
    #[must_use]
    pub fn with_status(&self, status: OrderStatus) -> Vec<&Order> {
        self.orders.iter().filter(|o| o.status == status).collect()
    }

    /// Order count per status, every status present.
    #[must_use]
    pub fn status_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts: BTreeMap<&'static str, usize> =
            OrderStatus::ALL.iter().map(|s| (s.as_str(), 0)).collect();
        for order in &self.orders {
            *counts.entry(order.status.as_str()).or_insert(0) += 1;
        }
        counts
    }
}

/// Shared board plus the store it mirrors. Cheap to clone.
#[derive(Clone)]
pub struct BoardHandle {
    board: Arc<RwLock<OrderBoard>>,
    orders: Arc<dyn OrderStore>,
}

impl std::fmt::Debug for BoardHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BoardHandle").finish_non_exhaustive()
    }
}

impl BoardHandle {
    #[must_use]
    pub fn new(orders: Arc<dyn OrderStore>) -> Self {
        Self {
            board: Arc::new(RwLock::new(OrderBoard::new())),
            orders,
        }
    }

    /// The shared board, for reading.
    #[must_use]
    pub const fn board(&self) -> &Arc<RwLock<OrderBoard>> {
        &self.board
    }

    /// Fetch every order and replace the snapshot.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::Load` if the store read fails. The board keeps
    /// its previous snapshot.
    #[instrument(skip(self))]
    pub async fn refresh(&self) -> Result<usize, BoardError> {
        let orders = self.orders.list_orders().await?;
        let count = orders.len();
        self.board.write().await.replace(orders);
        Ok(count)
    }

    /// Change an order's status optimistically.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::UnknownOrder` if the order is not on the board
    /// and `BoardError::UpdateFailed` if the store write fails (after rolling
    /// the board back).
    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    pub async fn set_status(&self, id: &OrderId, status: OrderStatus) -> Result<(), BoardError> {
        let pending = self
            .board
            .write()
            .await
            .apply_optimistic(id, status)
            .ok_or_else(|| BoardError::UnknownOrder(id.clone()))?;

        match self.orders.set_order_status(id, status).await {
            Ok(()) => {
                info!("Order status updated");
                Ok(())
            }
            Err(source) => {
                let rolled_back = self.board.write().await.rollback(id, pending);
                warn!(error = %source, rolled_back, "Order status update failed");
                Err(BoardError::UpdateFailed {
                    id: id.clone(),
                    source,
                })
            }
        }
    }

    /// Display rows at `now`.
    pub async fn summaries(&self, now: DateTime<Utc>) -> Vec<OrderSummary> {
        self.board.read().await.summaries(now)
    }
}

//! Periodic order board refresh.
//!
//! Every tick starts a fetch without waiting for the previous one, so a slow
//! backend never delays the schedule. Whichever fetch finishes last writes
//! the board. Dropping the poller stops the schedule and aborts fetches
//! still in flight.

use std::time::Duration;

use tokio::task::{JoinHandle, JoinSet};
use tokio::time::{MissedTickBehavior, interval};
use tracing::{debug, warn};

use crate::board::BoardHandle;

/// Handle to a running poller.
#[derive(Debug)]
pub struct OrderPoller {
    task: JoinHandle<()>,
}

impl OrderPoller {
    /// Refresh `board` now and then every `every`.
    ///
    /// Must be called from within a tokio runtime.
    #[must_use]
    pub fn spawn(board: BoardHandle, every: Duration) -> Self {
        let task = tokio::spawn(run(board, every));
        Self { task }
    }

    /// Whether the schedule is still running.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }

    /// Stop polling.
    pub fn stop(self) {
        drop(self);
    }
}

impl Drop for OrderPoller {
    fn drop(&mut self) {
        self.task.abort();
    }
}

async fn run(board: BoardHandle, every: Duration) {
    let mut ticks = interval(every);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // Aborts outstanding fetches when this task is aborted.
    let mut fetches = JoinSet::new();

    loop {
        ticks.tick().await;
        while let Some(done) = fetches.try_join_next() {
            if let Err(e) = done {
                warn!(error = %e, "Order refresh task failed");
            }
        }

        let board = board.clone();
        fetches.spawn(async move {
            match board.refresh().await {
                Ok(count) => debug!(count, "Order board refreshed"),
                Err(e) => warn!(error = %e, "Order board refresh failed"),
            }
        });
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use cafe_core::{CheckoutKey, Money, NewOrder, OrderStatus, PaymentMethod, UserId};
    use cafe_storefront::{MemoryBackend, OrderStore};

    use super::*;

    fn new_order() -> NewOrder {
        NewOrder {
            user_id: UserId::new("u1"),
            user_name: "Ana".to_owned(),
            user_email: "ana@cafe.example".to_owned(),
            table: Some("4".to_owned()),
            items: vec![],
            total: Money::from_major(25),
            status: OrderStatus::Pending,
            payment_method: PaymentMethod::Cash,
            notes: None,
            checkout_key: CheckoutKey::generate(),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_picks_up_new_orders() {
        let backend = Arc::new(MemoryBackend::new());
        let handle = BoardHandle::new(backend.clone());
        let poller = OrderPoller::spawn(handle.clone(), Duration::from_secs(10));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.board().read().await.generation(), 1);
        assert!(handle.board().read().await.orders().is_empty());

        backend.create_order(&new_order()).await.unwrap();
        tokio::time::sleep(Duration::from_secs(10)).await;
        assert_eq!(handle.board().read().await.orders().len(), 1);
        assert!(poller.is_running());
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refresh_keeps_polling() {
        let backend = Arc::new(MemoryBackend::new());
        backend.create_order(&new_order()).await.unwrap();
        backend.fail_order_reads(true);
        let handle = BoardHandle::new(backend.clone());
        let _poller = OrderPoller::spawn(handle.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(handle.board().read().await.generation(), 0);

        backend.fail_order_reads(false);
        tokio::time::sleep(Duration::from_secs(5)).await;
        assert_eq!(handle.board().read().await.orders().len(), 1);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_halts_refreshes() {
        let backend = Arc::new(MemoryBackend::new());
        let handle = BoardHandle::new(backend.clone());
        let poller = OrderPoller::spawn(handle.clone(), Duration::from_secs(5));

        tokio::time::sleep(Duration::from_secs(1)).await;
        poller.stop();
        let calls = backend.remote_calls();

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(backend.remote_calls(), calls);
    }
}

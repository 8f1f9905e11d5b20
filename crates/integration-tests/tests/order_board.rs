//! Staff order board fed by customer checkouts.

#![allow(clippy::unwrap_used)]

use std::time::Duration;

use cafe_admin::BoardError;
use cafe_core::{OrderStatus, format_elapsed};
use cafe_integration_tests::TestCafe;
use cafe_storefront::CheckoutRequest;
use chrono::{TimeZone, Utc};

async fn place_order(cafe: &TestCafe, email: &str) {
    let espresso = cafe.product("Espresso", 25, 20).await;
    cafe.customer("Ana", email).await;
    let mut shop = cafe.storefront.shop();
    shop.add_product(&espresso.id, 2).await.unwrap();
    shop.checkout(CheckoutRequest::default()).await.unwrap();
}

#[tokio::test]
async fn test_status_change_reaches_customer_history() {
    let cafe = TestCafe::new();
    place_order(&cafe, "ana@cafe.example").await;

    let board = cafe.admin.board();
    assert_eq!(board.refresh().await.unwrap(), 1);
    let order_id = board.summaries(Utc::now()).await[0].id.clone();

    let mut status = OrderStatus::Pending;
    while let Some(next) = status.next() {
        board.set_status(&order_id, next).await.unwrap();
        status = next;
    }

    let mine = cafe.storefront.shop().my_orders(Utc::now()).await.unwrap();
    assert_eq!(mine[0].status, OrderStatus::Delivered);
    assert_eq!(mine[0].badge.label, "Delivered");
    assert!(!mine[0].status.can_cancel());
}

#[tokio::test]
async fn test_failed_status_change_rolls_back() {
    let cafe = TestCafe::new();
    place_order(&cafe, "ana@cafe.example").await;
    let board = cafe.admin.board();
    board.refresh().await.unwrap();
    let order_id = board.summaries(Utc::now()).await[0].id.clone();

    cafe.backend.fail_order_writes(true);
    let err = board
        .set_status(&order_id, OrderStatus::Cancelled)
        .await
        .unwrap_err();
    assert!(matches!(err, BoardError::UpdateFailed { .. }));

    let rows = board.summaries(Utc::now()).await;
    assert_eq!(rows[0].status, OrderStatus::Pending);
    assert_eq!(cafe.backend.orders().await[0].status, OrderStatus::Pending);
}

#[tokio::test(start_paused = true)]
async fn test_poller_shows_new_orders() {
    let cafe = TestCafe::new();
    let poller = cafe.admin.start_poller();
    tokio::time::sleep(Duration::from_secs(1)).await;
    assert!(cafe.admin.board().summaries(Utc::now()).await.is_empty());

    place_order(&cafe, "ana@cafe.example").await;
    tokio::time::sleep(Duration::from_secs(10)).await;

    let rows = cafe.admin.board().summaries(Utc::now()).await;
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].customer, "Ana");
    assert_eq!(rows[0].items, "Espresso x2");
    poller.stop();
}

#[test]
fn test_elapsed_and_badges() {
    let created = Utc.with_ymd_and_hms(2026, 3, 1, 9, 0, 0).unwrap();
    let at = |secs: i64| created + chrono::Duration::seconds(secs);

    assert_eq!(format_elapsed(created, at(30)), "30s");
    assert_eq!(format_elapsed(created, at(125)), "2m");
    assert_eq!(format_elapsed(created, at(3 * 3600 + 5)), "3h");
    assert_eq!(format_elapsed(created, at(2 * 86_400)), "2d");
    assert_eq!(format_elapsed(created, at(-40)), "0s");

    assert_eq!(OrderStatus::from_code("ready").badge().label, "Ready");
    assert_eq!(OrderStatus::from_code("shipped").badge().label, "Unknown");
}

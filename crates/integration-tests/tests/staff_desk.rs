//! Waiter table orders, catalog management and CRM figures.

#![allow(clippy::unwrap_used)]

use secrecy::SecretString;

use cafe_admin::{SalesAnalytics, SeedReport, WaiterError};
use cafe_core::{Email, Money, OrderStatus, PaymentMethod};
use cafe_integration_tests::TestCafe;
use cafe_storefront::services::ShopError;
use cafe_storefront::{CheckoutError, CheckoutRequest, IdentityProvider, TableTicket};

// =============================================================================
// Waiter Desk
// =============================================================================

#[tokio::test]
async fn test_waiter_places_table_order_on_board() {
    let cafe = TestCafe::new();
    let espresso = cafe.product("Espresso", 25, 20).await;
    let brownie = cafe.product("Brownie", 35, 8).await;

    let staff_email = Email::parse("luis@cafe.example").unwrap();
    cafe.backend
        .register(&staff_email, &SecretString::from("barista99"), "Luis")
        .await
        .unwrap();
    let staff = cafe.admin.staff().unwrap();

    let mut desk = cafe.admin.waiter_desk();
    assert_eq!(desk.load_catalog().await.unwrap(), 2);
    desk.add_by_id(&espresso.id).unwrap();
    desk.add_by_id(&espresso.id).unwrap();
    desk.add_scanned(&cafe_storefront::qr::encode(&brownie.id, &brownie.name))
        .unwrap();
    desk.update_quantity(&brownie.id, 0);
    assert_eq!(desk.cart().len(), 1);

    let receipt = desk
        .place_order(
            Some(&staff),
            TableTicket {
                customer_name: "Marta".to_owned(),
                table: "12".to_owned(),
                notes: None,
            },
        )
        .await
        .unwrap();
    assert_eq!(receipt.total, Money::from_major(50));
    assert_eq!(receipt.points_earned, 0);

    cafe.admin.board().refresh().await.unwrap();
    let rows = cafe.admin.board().summaries(chrono::Utc::now()).await;
    assert_eq!(rows[0].customer, "Marta");
    assert_eq!(rows[0].table.as_deref(), Some("12"));
    let order = &cafe.backend.orders().await[0];
    assert_eq!(order.payment_method, PaymentMethod::Cash);
    assert_eq!(order.notes.as_deref(), Some("Table 12"));
}

#[tokio::test]
async fn test_waiter_needs_staff_and_customer_name() {
    let cafe = TestCafe::new();
    let espresso = cafe.product("Espresso", 25, 20).await;
    let mut desk = cafe.admin.waiter_desk();
    desk.load_catalog().await.unwrap();
    desk.add_by_id(&espresso.id).unwrap();

    let ticket = TableTicket {
        customer_name: " ".to_owned(),
        table: "3".to_owned(),
        notes: None,
    };
    assert!(matches!(
        desk.place_order(None, ticket.clone()).await,
        Err(WaiterError::Checkout(CheckoutError::NotAuthenticated))
    ));

    let staff_email = Email::parse("luis@cafe.example").unwrap();
    let staff = cafe
        .backend
        .register(&staff_email, &SecretString::from("barista99"), "Luis")
        .await
        .unwrap();
    assert!(matches!(
        desk.place_order(Some(&staff), ticket).await,
        Err(WaiterError::Checkout(CheckoutError::MissingCustomerName))
    ));
    assert_eq!(desk.cart().item_count(), 1);
    assert!(cafe.backend.orders().await.is_empty());
}

// =============================================================================
// Catalog
// =============================================================================

#[tokio::test]
async fn test_seeded_menu_is_orderable() {
    let cafe = TestCafe::new();

    let report = cafe.admin.seed_catalog().await.unwrap();
    assert_eq!(report, SeedReport::Seeded { inserted: 12, failed: 0 });
    assert_eq!(
        cafe.admin.seed_catalog().await.unwrap(),
        SeedReport::Skipped { existing: 12 }
    );

    let categories = cafe.storefront.catalog().categories().await.unwrap();
    assert!(categories.contains(&"Desserts".to_owned()));
    let desserts = cafe
        .storefront
        .catalog()
        .by_category(Some("Desserts"))
        .await
        .unwrap();
    assert_eq!(desserts.len(), 2);

    cafe.customer("Ana", "ana@cafe.example").await;
    let mut shop = cafe.storefront.shop();
    shop.add_product(&desserts[0].id, 1).await.unwrap();
    shop.checkout(CheckoutRequest::default()).await.unwrap();
}

#[tokio::test]
async fn test_hidden_product_cannot_be_ordered() {
    let cafe = TestCafe::new();
    let chai = cafe.product("Chai", 40, 6).await;
    cafe.admin.products().set_availability(&chai.id, false).await.unwrap();

    let mut shop = cafe.storefront.shop();
    assert!(matches!(
        shop.add_product(&chai.id, 1).await,
        Err(ShopError::ProductUnavailable(_))
    ));
}

// =============================================================================
// CRM
// =============================================================================

#[tokio::test]
async fn test_sales_report_and_customer_search() {
    let cafe = TestCafe::new();
    let espresso = cafe.product("Espresso", 25, 20).await;
    let cheesecake = cafe.product("Cheesecake", 65, 5).await;

    cafe.customer("Ana Torres", "ana@cafe.example").await;
    let mut shop = cafe.storefront.shop();
    shop.add_product(&espresso.id, 2).await.unwrap();
    shop.add_product(&cheesecake.id, 1).await.unwrap();
    shop.checkout(CheckoutRequest::default()).await.unwrap();

    cafe.storefront.auth().sign_out().await.unwrap();
    cafe.customer("Luis Vega", "luis@cafe.example").await;
    let mut shop = cafe.storefront.shop();
    shop.add_product(&cheesecake.id, 1).await.unwrap();
    shop.checkout(CheckoutRequest::default()).await.unwrap();

    let board = cafe.admin.board();
    board.refresh().await.unwrap();
    let luis_order = board.summaries(chrono::Utc::now()).await[0].id.clone();
    board
        .set_status(&luis_order, OrderStatus::Cancelled)
        .await
        .unwrap();

    let report = cafe
        .admin
        .analytics()
        .report(SalesAnalytics::DEFAULT_TOP)
        .await
        .unwrap();
    assert_eq!(report.total_sales, Money::from_major(115));
    assert_eq!(report.order_count, 2);
    assert_eq!(report.customer_count, 2);
    assert_eq!(report.by_status["cancelled"], 1);
    assert_eq!(report.best_sellers[0].product_name, "Espresso");
    assert_eq!(report.best_sellers[0].quantity, 2);

    let hits = cafe.admin.customers().search("torres").await.unwrap();
    assert_eq!(hits.len(), 1);
    assert_eq!(hits[0].name, "Ana Torres");
}

//! Ordering by scanning product QR codes.

#![allow(clippy::unwrap_used)]

use std::cell::Cell;
use std::rc::Rc;

use cafe_core::ProductId;
use cafe_integration_tests::TestCafe;
use cafe_storefront::qr::{self, Camera, QrError, ScanEvent, ScanIssue, ScanSession};
use cafe_storefront::services::ShopError;

/// Counts how often it was released.
struct CountingCamera(Rc<Cell<u32>>);

impl Camera for CountingCamera {
    fn release(self) {
        self.0.set(self.0.get() + 1);
    }
}

#[test]
fn test_generated_code_decodes_to_same_product() {
    let id = ProductId::new("product-42");
    let payload = qr::encode(&id, "Café Mocha");

    let scanned = qr::decode(&payload).unwrap();
    assert_eq!(scanned.product_id, id);
    assert_eq!(scanned.product_name, "Café Mocha");

    let svg = qr::render_svg(&payload, qr::DEFAULT_SIZE).unwrap();
    assert!(svg.contains("<svg"));
}

#[test]
fn test_malformed_payloads_rejected() {
    for payload in [
        "",
        "hello",
        "{}",
        "[1, 2]",
        r#"{"type":"promo","productId":"p1"}"#,
        r#"{"type":"product"}"#,
        r#"{"type":"product","productId":"   "}"#,
        r#"{"type":"product","productId":7}"#,
    ] {
        assert_eq!(qr::decode(payload), Err(QrError::InvalidFormat), "{payload}");
    }
}

#[tokio::test]
async fn test_scan_session_feeds_cart() {
    let cafe = TestCafe::new();
    let latte = cafe.product("Latte", 45, 10).await;
    let mut shop = cafe.storefront.shop();

    let released = Rc::new(Cell::new(0));
    let mut session = ScanSession::start(CountingCamera(released.clone()));

    assert_eq!(
        session.feed(Err("no code in frame".to_owned())),
        Some(ScanEvent::Recoverable(ScanIssue::NoCode("no code in frame".to_owned())))
    );
    assert_eq!(
        session.feed(Ok("https://cafe.example/menu")),
        Some(ScanEvent::Recoverable(ScanIssue::NotAProduct(QrError::InvalidFormat)))
    );
    assert!(session.is_active());

    let payload = qr::encode(&latte.id, &latte.name);
    let Some(ScanEvent::Decoded(scanned)) = session.feed(Ok(&payload)) else {
        panic!("expected a decoded product");
    };
    assert!(!session.is_active());
    assert_eq!(released.get(), 1);
    assert_eq!(session.feed(Ok(&payload)), None);

    shop.add_product(&scanned.product_id, 1).await.unwrap();
    shop.add_scanned(&payload).await.unwrap();
    assert_eq!(shop.cart().item_count(), 2);

    drop(session);
    assert_eq!(released.get(), 1);
}

#[tokio::test]
async fn test_scanned_code_for_deleted_product() {
    let cafe = TestCafe::new();
    let latte = cafe.product("Latte", 45, 10).await;
    let payload = qr::encode(&latte.id, &latte.name);
    cafe.admin.products().delete(&latte.id).await.unwrap();

    let mut shop = cafe.storefront.shop();
    assert!(matches!(
        shop.add_scanned(&payload).await,
        Err(ShopError::ProductNotFound(_))
    ));
    assert!(shop.cart().is_empty());
}

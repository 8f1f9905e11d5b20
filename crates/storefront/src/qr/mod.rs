//! Product QR codes.
//!
//! A product QR code carries a small JSON record:
//!
//! ```json
//! {"type":"product","productId":"p1","productName":"Latte","timestamp":1760000000000}
//! ```
//!
//! The timestamp (Unix milliseconds at generation) is informational only.
//! Decoding accepts any payload with `type == "product"` and a non-empty
//! `productId`; everything else is [`QrError::InvalidFormat`].

mod render;
mod scanner;

pub use render::{DEFAULT_SIZE, render_svg};
pub use scanner::{Camera, ScanEvent, ScanIssue, ScanSession};

use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use thiserror::Error;

use cafe_core::ProductId;

const PRODUCT_KIND: &str = "product";

/// Errors from encoding, decoding or rendering QR payloads.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum QrError {
    /// Payload is not a product record.
    #[error("not a product QR code")]
    InvalidFormat,

    /// Payload could not be rendered as a QR image.
    #[error("QR render failed: {0}")]
    Render(String),
}

/// A product reference read from a QR payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScannedProduct {
    pub product_id: ProductId,
    /// Name at generation time. Empty if the payload had none.
    pub product_name: String,
}

/// Encode a product reference, stamped with the current time.
#[must_use]
pub fn encode(product_id: &ProductId, product_name: &str) -> String {
    encode_at(product_id, product_name, Utc::now())
}

/// Encode a product reference with an explicit generation time.
#[must_use]
pub fn encode_at(product_id: &ProductId, product_name: &str, at: DateTime<Utc>) -> String {
    json!({
        "type": PRODUCT_KIND,
        "productId": product_id,
        "productName": product_name,
        "timestamp": at.timestamp_millis(),
    })
    .to_string()
}

/// Decode a scanned payload.
///
/// # Errors
///
/// Returns `QrError::InvalidFormat` if the payload is not JSON, not an
/// object, not of type `product`, or lacks a non-empty string `productId`.
pub fn decode(payload: &str) -> Result<ScannedProduct, QrError> {
    let value: Value = serde_json::from_str(payload).map_err(|_| QrError::InvalidFormat)?;
    let record = value.as_object().ok_or(QrError::InvalidFormat)?;

    if record.get("type").and_then(Value::as_str) != Some(PRODUCT_KIND) {
        return Err(QrError::InvalidFormat);
    }

    let product_id = record
        .get("productId")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|id| !id.is_empty())
        .ok_or(QrError::InvalidFormat)?;

    let product_name = record
        .get("productName")
        .and_then(Value::as_str)
        .unwrap_or_default();

    Ok(ScannedProduct {
        product_id: ProductId::new(product_id),
        product_name: product_name.to_owned(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip() {
        let payload = encode(&ProductId::new("p1"), "Latte");
        let scanned = decode(&payload).unwrap();
        assert_eq!(scanned.product_id, ProductId::new("p1"));
        assert_eq!(scanned.product_name, "Latte");
    }

    #[test]
    fn test_encode_carries_millisecond_timestamp() {
        let at = DateTime::from_timestamp_millis(1_760_000_000_123).unwrap();
        let payload = encode_at(&ProductId::new("p1"), "Latte", at);
        let value: Value = serde_json::from_str(&payload).unwrap();
        assert_eq!(value["type"], "product");
        assert_eq!(value["timestamp"], 1_760_000_000_123_i64);
    }

    #[test]
    fn test_missing_name_decodes_empty() {
        let scanned = decode(r#"{"type":"product","productId":"p9"}"#).unwrap();
        assert_eq!(scanned.product_name, "");
    }

    #[test]
    fn test_malformed_payloads_rejected() {
        for payload in [
            "hello",
            "",
            "[]",
            "42",
            r#"{"type":"table","productId":"p1"}"#,
            r#"{"productId":"p1"}"#,
            r#"{"type":"product"}"#,
            r#"{"type":"product","productId":""}"#,
            r#"{"type":"product","productId":"   "}"#,
            r#"{"type":"product","productId":17}"#,
        ] {
            assert_eq!(decode(payload), Err(QrError::InvalidFormat), "{payload}");
        }
    }
}

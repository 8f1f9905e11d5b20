//! Menu products.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::types::{Money, ProductId};

/// Errors from validating product payloads.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ProductError {
    /// Name is empty after trimming.
    #[error("product name cannot be empty")]
    EmptyName,
    /// Patch changes nothing.
    #[error("product update is empty")]
    EmptyPatch,
}

/// A product on the menu.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub stock: u32,
    pub available: bool,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Whether the product may be added to a cart.
    ///
    /// Unavailable or out-of-stock products are not orderable. Stock is only
    /// checked, never reserved.
    #[must_use]
    pub const fn is_orderable(&self) -> bool {
        self.available && self.stock > 0
    }
}

/// Payload for creating a product. The store assigns id and timestamps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub description: String,
    pub price: Money,
    pub category: String,
    pub stock: u32,
    pub available: bool,
    pub image: Option<String>,
}

impl NewProduct {
    /// Check the payload and trim text fields.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::EmptyName` if the name is blank.
    pub fn validated(mut self) -> Result<Self, ProductError> {
        self.name = self.name.trim().to_owned();
        if self.name.is_empty() {
            return Err(ProductError::EmptyName);
        }
        self.category = self.category.trim().to_owned();
        self.image = self.image.filter(|url| !url.trim().is_empty());
        Ok(self)
    }
}

/// Partial product update. `None` leaves the field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Money>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stock: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub available: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

impl ProductPatch {
    /// Check the patch and trim text fields.
    ///
    /// # Errors
    ///
    /// Returns `ProductError::EmptyName` if a blank name is supplied and
    /// `ProductError::EmptyPatch` if no field is set.
    pub fn validated(mut self) -> Result<Self, ProductError> {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_owned();
            if name.is_empty() {
                return Err(ProductError::EmptyName);
            }
        }
        if self.is_empty() {
            return Err(ProductError::EmptyPatch);
        }
        Ok(self)
    }

    /// Whether no field is set.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.category.is_none()
            && self.stock.is_none()
            && self.available.is_none()
            && self.image.is_none()
    }

    /// Apply the patch to a product, bumping `updated_at`.
    pub fn apply_to(&self, product: &mut Product, now: DateTime<Utc>) {
        if let Some(name) = &self.name {
            product.name.clone_from(name);
        }
        if let Some(description) = &self.description {
            product.description.clone_from(description);
        }
        if let Some(price) = self.price {
            product.price = price;
        }
        if let Some(category) = &self.category {
            product.category.clone_from(category);
        }
        if let Some(stock) = self.stock {
            product.stock = stock;
        }
        if let Some(available) = self.available {
            product.available = available;
        }
        if let Some(image) = &self.image {
            product.image = Some(image.clone());
        }
        product.updated_at = now;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn latte() -> Product {
        let now = Utc::now();
        Product {
            id: ProductId::new("p1"),
            name: "Latte".to_owned(),
            description: String::new(),
            price: Money::from_major(45),
            category: "Coffee".to_owned(),
            stock: 3,
            available: true,
            image: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_orderable_requires_stock_and_availability() {
        let mut product = latte();
        assert!(product.is_orderable());
        product.stock = 0;
        assert!(!product.is_orderable());
        product.stock = 1;
        product.available = false;
        assert!(!product.is_orderable());
    }

    #[test]
    fn test_new_product_trims_and_rejects_blank_name() {
        let draft = NewProduct {
            name: "  Mocha ".to_owned(),
            description: String::new(),
            price: Money::from_major(50),
            category: " Coffee ".to_owned(),
            stock: 10,
            available: true,
            image: Some("  ".to_owned()),
        };
        let ok = draft.clone().validated().unwrap();
        assert_eq!(ok.name, "Mocha");
        assert_eq!(ok.category, "Coffee");
        assert_eq!(ok.image, None);

        let blank = NewProduct {
            name: "   ".to_owned(),
            ..draft
        };
        assert_eq!(blank.validated(), Err(ProductError::EmptyName));
    }

    #[test]
    fn test_patch_validation() {
        assert_eq!(
            ProductPatch::default().validated(),
            Err(ProductError::EmptyPatch)
        );
        let blank_name = ProductPatch {
            name: Some(" ".to_owned()),
            ..ProductPatch::default()
        };
        assert_eq!(blank_name.validated(), Err(ProductError::EmptyName));
    }

    #[test]
    fn test_patch_apply_only_touches_set_fields() {
        let mut product = latte();
        let later = product.updated_at + chrono::Duration::minutes(5);
        let patch = ProductPatch {
            stock: Some(0),
            ..ProductPatch::default()
        };
        patch.apply_to(&mut product, later);
        assert_eq!(product.stock, 0);
        assert_eq!(product.name, "Latte");
        assert_eq!(product.updated_at, later);
    }

    #[test]
    fn test_patch_serializes_only_set_fields() {
        let patch = ProductPatch {
            available: Some(false),
            ..ProductPatch::default()
        };
        let json = serde_json::to_value(&patch).unwrap();
        assert_eq!(json, serde_json::json!({ "available": false }));
    }
}

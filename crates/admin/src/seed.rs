//! Sample menu for a fresh catalog.

use thiserror::Error;
use tracing::{info, instrument, warn};

use cafe_core::{Money, NewProduct};
use cafe_storefront::{CatalogStore, StoreError};

/// Errors that stop seeding before any product is written.
#[derive(Debug, Error)]
pub enum SeedError {
    /// Could not check whether the catalog is empty.
    #[error("failed to read catalog: {0}")]
    Store(#[from] StoreError),
}

/// What seeding did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedReport {
    /// The catalog already had products; nothing was written.
    Skipped { existing: usize },
    /// Sample products were written one by one.
    Seeded { inserted: usize, failed: usize },
}

struct SampleProduct {
    name: &'static str,
    description: &'static str,
    price: u32,
    category: &'static str,
    stock: u32,
    image: &'static str,
}

const SAMPLE_MENU: [SampleProduct; 12] = [
    SampleProduct {
        name: "Classic Espresso",
        description: "Intense, aromatic espresso from single-origin arabica beans.",
        price: 35,
        category: "Coffee",
        stock: 50,
        image: "https://images.unsplash.com/photo-1510591509098-f4fdc6d0ff04?w=400",
    },
    SampleProduct {
        name: "Americano",
        description: "Espresso topped up with hot water.",
        price: 30,
        category: "Coffee",
        stock: 60,
        image: "https://images.unsplash.com/photo-1559496417-e7f25cb247f3?w=400",
    },
    SampleProduct {
        name: "Vanilla Latte",
        description: "Steamed milk latte with house vanilla syrup.",
        price: 45,
        category: "Milk Coffee",
        stock: 40,
        image: "https://images.unsplash.com/photo-1461023058943-07fcbe16d735?w=400",
    },
    SampleProduct {
        name: "Italian Cappuccino",
        description: "Cappuccino with foamed milk and a dusting of cocoa.",
        price: 42,
        category: "Milk Coffee",
        stock: 45,
        image: "https://images.unsplash.com/photo-1572442388796-11668a67e53d?w=400",
    },
    SampleProduct {
        name: "Caramel Frappe",
        description: "Blended iced coffee with milk and salted caramel.",
        price: 55,
        category: "Cold Drinks",
        stock: 35,
        image: "https://images.unsplash.com/photo-1553909489-cd47e0ef937f?w=400",
    },
    SampleProduct {
        name: "Strawberry Cheesecake",
        description: "Cheesecake with fresh strawberries on a biscuit base.",
        price: 65,
        category: "Desserts",
        stock: 20,
        image: "https://images.unsplash.com/photo-1533134242443-d4fd215305ad?w=400",
    },
    SampleProduct {
        name: "Red Velvet Cake",
        description: "Red sponge with cream cheese frosting.",
        price: 58,
        category: "Desserts",
        stock: 15,
        image: "https://images.unsplash.com/photo-1587668178277-295251f900ce?w=400",
    },
    SampleProduct {
        name: "Almond Croissant",
        description: "Butter croissant filled with almond cream.",
        price: 38,
        category: "Pastries",
        stock: 25,
        image: "https://images.unsplash.com/photo-1555507036-ab1f4038808a?w=400",
    },
    SampleProduct {
        name: "Matcha Green Tea",
        description: "Matcha with almond milk and honey.",
        price: 48,
        category: "Specialty Teas",
        stock: 30,
        image: "https://images.unsplash.com/photo-1544787219-7f47ccb76574?w=400",
    },
    SampleProduct {
        name: "Mango Smoothie",
        description: "Fresh mango, greek yogurt and honey.",
        price: 52,
        category: "Smoothies",
        stock: 28,
        image: "https://images.unsplash.com/photo-1553909489-ec217ac8f3a5?w=400",
    },
    SampleProduct {
        name: "Chocolate Muffin",
        description: "Muffin with belgian chocolate chips and caramelized nuts.",
        price: 32,
        category: "Pastries",
        stock: 22,
        image: "https://images.unsplash.com/photo-1587668178277-295251f900ce?w=400",
    },
    SampleProduct {
        name: "Cafe Mocha",
        description: "Latte with dark chocolate and whipped cream.",
        price: 50,
        category: "Milk Coffee",
        stock: 38,
        image: "https://images.unsplash.com/photo-1578662996442-48f60103fc96?w=400",
    },
];

impl SampleProduct {
    fn to_new_product(&self) -> NewProduct {
        NewProduct {
            name: self.name.to_owned(),
            description: self.description.to_owned(),
            price: Money::from_major(self.price),
            category: self.category.to_owned(),
            stock: self.stock,
            available: true,
            image: Some(self.image.to_owned()),
        }
    }
}

/// The sample menu as create payloads.
#[must_use]
pub fn sample_menu() -> Vec<NewProduct> {
    SAMPLE_MENU.iter().map(SampleProduct::to_new_product).collect()
}

/// Write the sample menu into an empty catalog.
///
/// Products are written one at a time; a failed write is logged and counted
/// but does not stop the rest.
///
/// # Errors
///
/// Returns `SeedError::Store` if the catalog cannot be read.
#[instrument(skip(store))]
pub async fn seed_catalog(store: &dyn CatalogStore) -> Result<SeedReport, SeedError> {
    let existing = store.list_products().await?.len();
    if existing > 0 {
        info!(existing, "Catalog not empty, skipping seed");
        return Ok(SeedReport::Skipped { existing });
    }

    let mut inserted = 0;
    let mut failed = 0;
    for product in sample_menu() {
        match store.create_product(&product).await {
            Ok(id) => {
                inserted += 1;
                info!(product_id = %id, name = %product.name, "Seeded product");
            }
            Err(e) => {
                failed += 1;
                warn!(error = %e, name = %product.name, "Failed to seed product");
            }
        }
    }

    info!(inserted, failed, "Catalog seeding finished");
    Ok(SeedReport::Seeded { inserted, failed })
}

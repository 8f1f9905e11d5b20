//! Table-backed stores: profiles, products, orders and points history.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::instrument;
use url::Url;

use cafe_core::{
    NewOrder, NewPointsEntry, NewProduct, Order, OrderId, OrderStatus, PointsEntry, PointsEntryId,
    Product, ProductId, ProductPatch, UserId, UserProfile,
};

use super::HostedBackend;
use crate::store::{CatalogStore, OrderStore, PointsLedger, StoreError, UserDirectory};

const PRODUCTS: &str = "products";
const ORDERS: &str = "orders";
const PROFILES: &str = "profiles";
const POINTS_HISTORY: &str = "points_history";

/// Row shape returned by inserts with `select=id`.
#[derive(Debug, Deserialize)]
struct IdRow {
    id: String,
}

/// Add `key=value` query pairs to a table URL.
fn with_query(mut url: Url, pairs: &[(&str, &str)]) -> Url {
    url.query_pairs_mut().extend_pairs(pairs);
    url
}

/// PostgREST equality filter value.
fn eq(value: &str) -> String {
    format!("eq.{value}")
}

impl HostedBackend {
    async fn select<T: serde::de::DeserializeOwned>(
        &self,
        table: &str,
        pairs: &[(&str, &str)],
    ) -> Result<Vec<T>, StoreError> {
        let url = with_query(self.table_url(table)?, pairs);
        self.fetch(self.request(Method::GET, url).await).await
    }

    async fn insert_returning_id<B: serde::Serialize + Sync>(
        &self,
        table: &str,
        body: &B,
    ) -> Result<String, StoreError> {
        let url = with_query(self.table_url(table)?, &[("select", "id")]);
        let rows: Vec<IdRow> = self
            .fetch(
                self.request(Method::POST, url)
                    .await
                    .header("Prefer", "return=representation")
                    .json(body),
            )
            .await?;
        rows.into_iter()
            .next()
            .map(|row| row.id)
            .ok_or_else(|| StoreError::NotFound(format!("{table}: insert returned no row")))
    }

    /// PATCH rows matching `id` and fail if none matched.
    async fn update_by_id(&self, table: &str, id: &str, body: &Value) -> Result<(), StoreError> {
        let filter = eq(id);
        let url = with_query(self.table_url(table)?, &[("id", &filter), ("select", "id")]);
        let rows: Vec<IdRow> = self
            .fetch(
                self.request(Method::PATCH, url)
                    .await
                    .header("Prefer", "return=representation")
                    .json(body),
            )
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("{table} {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl UserDirectory for HostedBackend {
    #[instrument(skip(self), fields(user_id = %id))]
    async fn get_profile(&self, id: &UserId) -> Result<Option<UserProfile>, StoreError> {
        let filter = eq(id.as_str());
        let rows: Vec<UserProfile> = self
            .select(PROFILES, &[("select", "*"), ("id", &filter)])
            .await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self, profile), fields(user_id = %profile.id))]
    async fn create_profile(&self, profile: &UserProfile) -> Result<(), StoreError> {
        let url = self.table_url(PROFILES)?;
        self.send(self.request(Method::POST, url).await.json(profile))
            .await?;
        Ok(())
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn set_points(&self, id: &UserId, points: u32) -> Result<(), StoreError> {
        self.update_by_id(PROFILES, id.as_str(), &json!({ "points": points }))
            .await
    }

    #[instrument(skip(self), fields(user_id = %id))]
    async fn touch_last_login(&self, id: &UserId, at: DateTime<Utc>) -> Result<(), StoreError> {
        self.update_by_id(PROFILES, id.as_str(), &json!({ "last_login": at }))
            .await
    }

    #[instrument(skip(self))]
    async fn list_profiles(&self) -> Result<Vec<UserProfile>, StoreError> {
        self.select(PROFILES, &[("select", "*"), ("order", "created_at.desc")])
            .await
    }
}

#[async_trait]
impl CatalogStore for HostedBackend {
    #[instrument(skip(self))]
    async fn list_products(&self) -> Result<Vec<Product>, StoreError> {
        self.select(PRODUCTS, &[("select", "*"), ("order", "created_at.desc")])
            .await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn get_product(&self, id: &ProductId) -> Result<Option<Product>, StoreError> {
        let filter = eq(id.as_str());
        let rows: Vec<Product> = self
            .select(PRODUCTS, &[("select", "*"), ("id", &filter)])
            .await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self, product), fields(name = %product.name))]
    async fn create_product(&self, product: &NewProduct) -> Result<ProductId, StoreError> {
        self.insert_returning_id(PRODUCTS, product)
            .await
            .map(ProductId::new)
    }

    #[instrument(skip(self, patch), fields(product_id = %id))]
    async fn update_product(
        &self,
        id: &ProductId,
        patch: &ProductPatch,
    ) -> Result<(), StoreError> {
        let mut body = serde_json::to_value(patch)?;
        if let Value::Object(fields) = &mut body {
            fields.insert("updated_at".to_owned(), json!(Utc::now()));
        }
        self.update_by_id(PRODUCTS, id.as_str(), &body).await
    }

    #[instrument(skip(self), fields(product_id = %id))]
    async fn delete_product(&self, id: &ProductId) -> Result<(), StoreError> {
        let filter = eq(id.as_str());
        let url = with_query(self.table_url(PRODUCTS)?, &[("id", &filter), ("select", "id")]);
        let rows: Vec<IdRow> = self
            .fetch(
                self.request(Method::DELETE, url)
                    .await
                    .header("Prefer", "return=representation"),
            )
            .await?;
        if rows.is_empty() {
            return Err(StoreError::NotFound(format!("{PRODUCTS} {id}")));
        }
        Ok(())
    }
}

#[async_trait]
impl OrderStore for HostedBackend {
    #[instrument(skip(self))]
    async fn list_orders(&self) -> Result<Vec<Order>, StoreError> {
        self.select(ORDERS, &[("select", "*"), ("order", "created_at.desc")])
            .await
    }

    #[instrument(skip(self), fields(user_id = %user))]
    async fn list_orders_for_user(&self, user: &UserId) -> Result<Vec<Order>, StoreError> {
        let filter = eq(user.as_str());
        self.select(
            ORDERS,
            &[
                ("select", "*"),
                ("user_id", &filter),
                ("order", "created_at.desc"),
            ],
        )
        .await
    }

    #[instrument(skip(self), fields(order_id = %id))]
    async fn get_order(&self, id: &OrderId) -> Result<Option<Order>, StoreError> {
        let filter = eq(id.as_str());
        let rows: Vec<Order> = self
            .select(ORDERS, &[("select", "*"), ("id", &filter)])
            .await?;
        Ok(rows.into_iter().next())
    }

    #[instrument(skip(self, order), fields(checkout_key = %order.checkout_key))]
    async fn create_order(&self, order: &NewOrder) -> Result<OrderId, StoreError> {
        self.insert_returning_id(ORDERS, order)
            .await
            .map(OrderId::new)
    }

    #[instrument(skip(self), fields(order_id = %id, status = %status))]
    async fn set_order_status(
        &self,
        id: &OrderId,
        status: OrderStatus,
    ) -> Result<(), StoreError> {
        self.update_by_id(
            ORDERS,
            id.as_str(),
            &json!({ "status": status, "updated_at": Utc::now() }),
        )
        .await
    }
}

#[async_trait]
impl PointsLedger for HostedBackend {
    #[instrument(skip(self), fields(user_id = %user))]
    async fn list_points_history(&self, user: &UserId) -> Result<Vec<PointsEntry>, StoreError> {
        let filter = eq(user.as_str());
        self.select(
            POINTS_HISTORY,
            &[("select", "*"), ("user_id", &filter), ("order", "date.desc")],
        )
        .await
    }

    #[instrument(skip(self, entry), fields(user_id = %entry.user_id, points = entry.points))]
    async fn record_points(&self, entry: &NewPointsEntry) -> Result<PointsEntryId, StoreError> {
        let body = json!({
            "user_id": entry.user_id,
            "description": entry.description,
            "points": entry.points,
            "kind": entry.kind,
            "date": Utc::now(),
        });
        self.insert_returning_id(POINTS_HISTORY, &body)
            .await
            .map(PointsEntryId::new)
    }
}

//! Postgres-backed [`MarketDataSource`].

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mercado_core::{GeoPoint, OrderStatus};
use mercado_geo::{MarketDataSource, OrderEvent, SellerLocation, SourceError};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use sqlx::PgPool;

#[derive(Debug, Clone, sqlx::FromRow)]
struct SellerLocationRow {
    id: i64,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    latitude: Option<f64>,
    longitude: Option<f64>,
    is_active: bool,
    is_available: bool,
    product_count: i64,
}

#[derive(Debug, Clone, sqlx::FromRow)]
struct OrderEventRow {
    order_id: i64,
    buyer_id: i64,
    seller_id: i64,
    latitude: Option<f64>,
    longitude: Option<f64>,
    total_amount: Decimal,
    created_at: DateTime<Utc>,
    status: String,
}

impl From<SellerLocationRow> for SellerLocation {
    fn from(row: SellerLocationRow) -> Self {
        Self {
            location: GeoPoint::from_optional(row.latitude, row.longitude),
            id: row.id,
            name: row.name,
            email: row.email,
            phone: row.phone,
            address: row.address,
            is_active: row.is_active,
            is_available: row.is_available,
            product_count: row.product_count,
        }
    }
}

impl From<OrderEventRow> for OrderEvent {
    fn from(row: OrderEventRow) -> Self {
        Self {
            order_id: row.order_id,
            buyer_id: row.buyer_id,
            seller_id: row.seller_id,
            buyer_location: GeoPoint::from_optional(row.latitude, row.longitude),
            amount: row.total_amount.to_f64().unwrap_or_default(),
            placed_at: row.created_at,
            status: OrderStatus::from(row.status.as_str()),
        }
    }
}

/// Reads sellers and orders from the marketplace tables.
#[derive(Debug, Clone)]
pub struct PgMarketSource {
    pool: PgPool,
}

impl PgMarketSource {
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn source_error(what: &str, err: sqlx::Error) -> SourceError {
    tracing::error!(error = %err, "{what} query failed");
    SourceError::with_source(format!("{what} query failed"), err)
}

#[async_trait]
impl MarketDataSource for PgMarketSource {
    async fn list_sellers_with_location(
        &self,
        active_only: bool,
    ) -> Result<Vec<SellerLocation>, SourceError> {
        let rows = sqlx::query_as::<_, SellerLocationRow>(
            "SELECT \
                 u.id, u.name, u.email, u.phone, u.address, \
                 u.latitude, u.longitude, u.is_active, u.is_available, \
                 COUNT(p.id) AS product_count \
             FROM users u \
             LEFT JOIN products p ON p.seller_id = u.id \
             WHERE u.role = 'seller' \
               AND ($1 = FALSE OR u.is_active) \
             GROUP BY u.id \
             ORDER BY u.id",
        )
        .bind(active_only)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| source_error("seller location", e))?;

        Ok(rows.into_iter().map(SellerLocation::from).collect())
    }

    async fn list_orders(
        &self,
        since: DateTime<Utc>,
        seller_id: Option<i64>,
    ) -> Result<Vec<OrderEvent>, SourceError> {
        let rows = sqlx::query_as::<_, OrderEventRow>(
            "SELECT \
                 o.id AS order_id, o.buyer_id, o.seller_id, \
                 COALESCE(o.buyer_latitude, b.latitude) AS latitude, \
                 COALESCE(o.buyer_longitude, b.longitude) AS longitude, \
                 o.total_amount, o.created_at, o.status \
             FROM orders o \
             JOIN users b ON b.id = o.buyer_id \
             WHERE o.created_at >= $1 \
               AND ($2::BIGINT IS NULL OR o.seller_id = $2) \
             ORDER BY o.id",
        )
        .bind(since)
        .bind(seller_id)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| source_error("order event", e))?;

        Ok(rows.into_iter().map(OrderEvent::from).collect())
    }
}

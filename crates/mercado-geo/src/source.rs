//! Data-access seam between the analytics services and the persistence layer.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mercado_core::{GeoPoint, OrderStatus};

use crate::SourceError;

/// A seller as seen by proximity search.
#[derive(Debug, Clone, PartialEq)]
pub struct SellerLocation {
    pub id: i64,
    pub name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    /// Sellers without a location never match a geo query.
    pub location: Option<GeoPoint>,
    pub is_active: bool,
    pub is_available: bool,
    pub product_count: i64,
}

/// One order joined with the buyer's position.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderEvent {
    pub order_id: i64,
    pub buyer_id: i64,
    pub seller_id: i64,
    /// Position snapshotted on the order, falling back to the buyer's profile.
    pub buyer_location: Option<GeoPoint>,
    pub amount: f64,
    pub placed_at: DateTime<Utc>,
    pub status: OrderStatus,
}

/// Read access to sellers and orders.
///
/// Implementations should filter server-side where they can, but the
/// services re-apply every filter themselves and never rely on it.
#[async_trait]
pub trait MarketDataSource: Send + Sync {
    /// Sellers ordered by id. `active_only` drops deactivated accounts.
    async fn list_sellers_with_location(
        &self,
        active_only: bool,
    ) -> Result<Vec<SellerLocation>, SourceError>;

    /// Orders placed at or after `since`, optionally for a single seller.
    async fn list_orders(
        &self,
        since: DateTime<Utc>,
        seller_id: Option<i64>,
    ) -> Result<Vec<OrderEvent>, SourceError>;
}

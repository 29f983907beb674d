//! Relocation suggestions from a seller's buyer geography.
//!
//! The centroid is the plain arithmetic mean of latitudes and of longitudes.
//! That is only a fair "center of demand" for buyers spread over a city-sized
//! area: it ignores the Earth's curvature and breaks down across the
//! antimeridian or near the poles.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mercado_core::GeoPoint;

use crate::{
    CancelSignal, GeoError, MarketDataSource, OrderEvent, ZoneAggregator, ZoneParams, ZoneStats,
};

/// Mean buyer position for one seller.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Centroid {
    pub point: GeoPoint,
    /// Number of distinct buyers that contributed a position.
    pub sample_size: usize,
}

/// Either a centroid or an explicit absence of data, never a `(0, 0)` placeholder.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CentroidOutcome {
    Found(Centroid),
    NoData,
}

impl CentroidOutcome {
    #[must_use]
    pub fn centroid(&self) -> Option<&Centroid> {
        match self {
            CentroidOutcome::Found(c) => Some(c),
            CentroidOutcome::NoData => None,
        }
    }
}

/// Seller-specific centroid plus city-wide demand hot spots.
#[derive(Debug, Clone, PartialEq)]
pub struct LocationSuggestion {
    pub seller_id: i64,
    pub centroid: CentroidOutcome,
    /// Alternative candidates; independent of the seller.
    pub high_demand_zones: Vec<ZoneStats>,
}

impl LocationSuggestion {
    /// Human-readable summary for tool callers.
    #[must_use]
    pub fn recommendation(&self) -> String {
        match &self.centroid {
            CentroidOutcome::Found(c) => format!(
                "Suggested location: {:.4}, {:.4} (based on {} customers)",
                c.point.latitude(),
                c.point.longitude(),
                c.sample_size
            ),
            CentroidOutcome::NoData => {
                "Not enough data to suggest a location for this seller".to_string()
            }
        }
    }
}

/// Average the latest known position of each distinct buyer of `seller_id`.
///
/// Orders for other sellers, cancelled orders and orders without a buyer
/// position are skipped. When a buyer has several orders, only the most
/// recent one counts (ties go to the higher order id).
#[must_use]
pub fn compute_centroid(seller_id: i64, orders: &[OrderEvent]) -> CentroidOutcome {
    let mut latest: BTreeMap<i64, (DateTime<Utc>, i64, GeoPoint)> = BTreeMap::new();

    for order in orders {
        if order.seller_id != seller_id || !order.status.is_relevant() {
            continue;
        }
        let Some(location) = order.buyer_location else {
            continue;
        };
        let candidate = (order.placed_at, order.order_id, location);
        latest
            .entry(order.buyer_id)
            .and_modify(|current| {
                if (candidate.0, candidate.1) > (current.0, current.1) {
                    *current = candidate;
                }
            })
            .or_insert(candidate);
    }

    let sample_size = latest.len();
    if sample_size == 0 {
        return CentroidOutcome::NoData;
    }

    let (lat_sum, lng_sum) = latest
        .values()
        .fold((0.0_f64, 0.0_f64), |(lat, lng), (_, _, p)| {
            (lat + p.latitude(), lng + p.longitude())
        });
    #[allow(clippy::cast_precision_loss)]
    let n = sample_size as f64;

    match GeoPoint::from_lat_lng(lat_sum / n, lng_sum / n) {
        Ok(point) => CentroidOutcome::Found(Centroid { point, sample_size }),
        Err(_) => CentroidOutcome::NoData,
    }
}

/// Location suggestions against a data source.
#[derive(Clone)]
pub struct CentroidRecommender {
    source: Arc<dyn MarketDataSource>,
    zones: ZoneAggregator,
}

impl CentroidRecommender {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self {
            zones: ZoneAggregator::new(Arc::clone(&source)),
            source,
        }
    }

    /// Suggest a location for `seller_id` from their full order history,
    /// alongside the hot zones selected by `hot_zones`.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::Upstream`] if the source fails,
    /// [`GeoError::Cancelled`] if `cancel` trips, and
    /// [`GeoError::InvalidArgument`] for bad zone parameters.
    pub async fn suggest_location(
        &self,
        seller_id: i64,
        hot_zones: &ZoneParams,
        cancel: &CancelSignal,
    ) -> Result<LocationSuggestion, GeoError> {
        let history = cancel.guard(
            self.source
                .list_orders(DateTime::UNIX_EPOCH, Some(seller_id)),
        );
        let zones = self.zones.analyze(hot_zones, cancel);
        let (orders, high_demand_zones) = tokio::try_join!(history, zones)?;

        let centroid = compute_centroid(seller_id, &orders);
        match &centroid {
            CentroidOutcome::Found(c) => tracing::debug!(
                seller_id,
                sample_size = c.sample_size,
                "centroid computed"
            ),
            CentroidOutcome::NoData => tracing::debug!(seller_id, "no buyer locations for seller"),
        }

        Ok(LocationSuggestion {
            seller_id,
            centroid,
            high_demand_zones,
        })
    }
}

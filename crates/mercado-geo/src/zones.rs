//! Grid-cell demand aggregation.
//!
//! Orders are bucketed by their buyer position rounded to a fixed number of
//! decimal places. Each bucket reports volume, distinct buyers and sellers,
//! revenue and average ticket, then buckets are ranked by order count.

use std::collections::{BTreeMap, HashSet};
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use mercado_core::{GeoPoint, TimeRange};
use rust_decimal::{Decimal, RoundingStrategy};

use crate::{CancelSignal, GeoError, MarketDataSource, OrderEvent};

/// Finest supported grid: six decimals is roughly 0.1 m.
pub const MAX_GRID_PRECISION: u32 = 6;

const CANCEL_CHECK_INTERVAL: usize = 1_024;

/// Options for one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ZoneParams {
    /// Inclusive lower bound on `placed_at`.
    pub since: DateTime<Utc>,
    /// Decimal places kept when rounding coordinates into a cell.
    pub grid_precision: u32,
    /// Cells with fewer orders are dropped.
    pub min_count: usize,
    pub top_n: usize,
}

impl ZoneParams {
    /// Active-zone analysis: one decimal place (~11 km cells), at least three
    /// orders, top twenty.
    #[must_use]
    pub fn active_zones(range: TimeRange, now: DateTime<Utc>) -> Self {
        Self {
            since: range.since(now),
            grid_precision: 1,
            min_count: 3,
            top_n: 20,
        }
    }

    /// High-demand candidates for seller relocation: last 90 days, two
    /// decimal places (~1.1 km cells), at least five orders, top ten.
    #[must_use]
    pub fn hot_zones(now: DateTime<Utc>) -> Self {
        Self {
            since: now - chrono::Duration::days(90),
            grid_precision: 2,
            min_count: 5,
            top_n: 10,
        }
    }

    fn validate(&self) -> Result<(), GeoError> {
        if self.grid_precision > MAX_GRID_PRECISION {
            return Err(GeoError::InvalidArgument(format!(
                "grid precision {} exceeds maximum {MAX_GRID_PRECISION}",
                self.grid_precision
            )));
        }
        Ok(())
    }
}

/// A grid cell: both coordinates rounded half away from zero and stored as
/// integer multiples of `10^-precision`.
///
/// Ordering is latitude first, then longitude, which is the tie-break used
/// when two cells have the same order count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ZoneKey {
    lat_units: i64,
    lng_units: i64,
    precision: u32,
}

impl ZoneKey {
    /// Cell containing `point` at `precision` decimal places.
    ///
    /// Rounds on the shortest decimal rendering of each coordinate so that a
    /// value written as `14.65` lands in cell `14.7`, as it would in SQL.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError::InvalidArgument`] if `precision` exceeds
    /// [`MAX_GRID_PRECISION`].
    pub fn for_point(point: &GeoPoint, precision: u32) -> Result<Self, GeoError> {
        if precision > MAX_GRID_PRECISION {
            return Err(GeoError::InvalidArgument(format!(
                "grid precision {precision} exceeds maximum {MAX_GRID_PRECISION}"
            )));
        }
        Ok(Self {
            lat_units: scaled_units(point.latitude(), precision),
            lng_units: scaled_units(point.longitude(), precision),
            precision,
        })
    }

    #[must_use]
    pub fn precision(&self) -> u32 {
        self.precision
    }

    #[must_use]
    pub fn latitude(&self) -> Decimal {
        Decimal::new(self.lat_units, self.precision)
    }

    #[must_use]
    pub fn longitude(&self) -> Decimal {
        Decimal::new(self.lng_units, self.precision)
    }
}

fn scaled_units(value: f64, precision: u32) -> i64 {
    if let Ok(parsed) = Decimal::from_str(&value.to_string()) {
        let mut rounded =
            parsed.round_dp_with_strategy(precision, RoundingStrategy::MidpointAwayFromZero);
        rounded.rescale(precision);
        if let Ok(units) = i64::try_from(rounded.mantissa()) {
            return units;
        }
    }
    // Only reachable for values too long to render as a Decimal (tiny subnormals).
    #[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
    let units = (value * 10_f64.powi(precision as i32)).round() as i64;
    units
}

/// Aggregated activity for one cell.
#[derive(Debug, Clone, PartialEq)]
pub struct ZoneStats {
    pub cell: ZoneKey,
    pub order_count: usize,
    pub unique_buyers: usize,
    pub unique_sellers: usize,
    /// Unrounded sum; round only when presenting.
    pub revenue: f64,
    pub average_order_value: f64,
    /// Dense, 1-based rank by `order_count` descending.
    pub rank: usize,
}

#[derive(Default)]
struct CellAccumulator {
    amounts: Vec<f64>,
    buyers: HashSet<i64>,
    sellers: HashSet<i64>,
}

/// Group `events` into cells and rank them.
///
/// Events before `params.since` or without a buyer location are ignored.
/// The result depends only on the multiset of events, never on their order.
///
/// # Errors
///
/// Returns [`GeoError::InvalidArgument`] for an unsupported grid precision
/// and [`GeoError::Cancelled`] if `cancel` trips mid-run.
pub fn aggregate_zones(
    events: &[OrderEvent],
    params: &ZoneParams,
    cancel: &CancelSignal,
) -> Result<Vec<ZoneStats>, GeoError> {
    params.validate()?;

    let mut cells: BTreeMap<ZoneKey, CellAccumulator> = BTreeMap::new();
    for (idx, event) in events.iter().enumerate() {
        if idx % CANCEL_CHECK_INTERVAL == 0 {
            cancel.check()?;
        }
        if event.placed_at < params.since {
            continue;
        }
        let Some(location) = event.buyer_location else {
            continue;
        };
        let key = ZoneKey::for_point(&location, params.grid_precision)?;
        let cell = cells.entry(key).or_default();
        cell.amounts.push(event.amount);
        cell.buyers.insert(event.buyer_id);
        cell.sellers.insert(event.seller_id);
    }
    cancel.check()?;

    let mut zones: Vec<ZoneStats> = cells
        .into_iter()
        .filter(|(_, acc)| acc.amounts.len() >= params.min_count)
        .map(|(cell, mut acc)| {
            // Summing in a fixed order keeps the float result independent of input order.
            acc.amounts.sort_by(f64::total_cmp);
            let order_count = acc.amounts.len();
            let revenue: f64 = acc.amounts.iter().sum();
            #[allow(clippy::cast_precision_loss)]
            let average_order_value = revenue / order_count as f64;
            ZoneStats {
                cell,
                order_count,
                unique_buyers: acc.buyers.len(),
                unique_sellers: acc.sellers.len(),
                revenue,
                average_order_value,
                rank: 0,
            }
        })
        .collect();

    // BTreeMap iteration already has cells in key order; a stable sort on
    // count keeps that order among ties.
    zones.sort_by(|a, b| b.order_count.cmp(&a.order_count));

    let mut rank = 0;
    let mut previous = None;
    for zone in &mut zones {
        if previous != Some(zone.order_count) {
            rank += 1;
            previous = Some(zone.order_count);
        }
        zone.rank = rank;
    }

    zones.truncate(params.top_n);
    Ok(zones)
}

/// Zone analysis against a data source.
#[derive(Clone)]
pub struct ZoneAggregator {
    source: Arc<dyn MarketDataSource>,
}

impl ZoneAggregator {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    /// # Errors
    ///
    /// Returns [`GeoError::InvalidArgument`] for bad parameters,
    /// [`GeoError::Upstream`] if the source fails and [`GeoError::Cancelled`]
    /// if `cancel` trips.
    pub async fn analyze(
        &self,
        params: &ZoneParams,
        cancel: &CancelSignal,
    ) -> Result<Vec<ZoneStats>, GeoError> {
        params.validate()?;
        let events = cancel
            .guard(self.source.list_orders(params.since, None))
            .await?;
        let zones = aggregate_zones(&events, params, cancel)?;

        tracing::debug!(
            events = events.len(),
            zones = zones.len(),
            precision = params.grid_precision,
            min_count = params.min_count,
            "zone aggregation complete"
        );
        Ok(zones)
    }
}

#[cfg(test)]
#[path = "zones_test.rs"]
mod tests;

//! Read-only marketplace queries printed as plain-text tables.
//!
//! Geo commands go through the same services the HTTP tools use, backed by
//! [`mercado_db::PgMarketSource`], so output matches the API.

use std::{sync::Arc, time::Duration};

use chrono::Utc;
use mercado_core::TimeRange;
use mercado_geo::{
    CancelSignal, CentroidRecommender, MarketDataSource, NearbyParams, ProximitySearch,
    ZoneAggregator, ZoneKey, ZoneParams, ZoneStats,
};

const NAME_WIDTH: usize = 26;
const ADDRESS_WIDTH: usize = 40;

/// Arguments of the `zones` command.
#[derive(Debug, Clone)]
pub(crate) struct ZonesRequest {
    pub time_range: String,
    pub precision: u32,
    pub min_count: usize,
    pub top: usize,
}

impl ZonesRequest {
    fn params(&self, now: chrono::DateTime<Utc>) -> anyhow::Result<ZoneParams> {
        let range = self.time_range.parse::<TimeRange>()?;
        Ok(ZoneParams {
            since: range.since(now),
            grid_precision: self.precision,
            min_count: self.min_count,
            top_n: self.top,
        })
    }
}

fn market_source(pool: &sqlx::PgPool) -> Arc<dyn MarketDataSource> {
    Arc::new(mercado_db::PgMarketSource::new(pool.clone()))
}

/// Print active sellers within `radius_km` of a point.
///
/// # Errors
///
/// Returns an error for out-of-range coordinates or a failed query.
pub(crate) async fn run_nearby(
    pool: &sqlx::PgPool,
    lat: f64,
    lng: f64,
    radius_km: f64,
) -> anyhow::Result<()> {
    let origin = mercado_geo::require_point(Some(lat), Some(lng))?;
    let search = ProximitySearch::new(market_source(pool));
    let sellers = search
        .find_nearby(origin, &NearbyParams::from_km(radius_km))
        .await?;

    if sellers.is_empty() {
        println!("no active sellers within {radius_km} km of {lat}, {lng}");
        return Ok(());
    }

    println!(
        "{:<6}{:<28}{:>12}{:>10}  ADDRESS",
        "ID", "NAME", "DISTANCE", "PRODUCTS"
    );
    for hit in &sellers {
        let address = hit.seller.address.as_deref().unwrap_or("\u{2014}");
        println!(
            "{:<6}{:<28}{:>12}{:>10}  {}",
            hit.seller.id,
            truncate(&hit.seller.name, NAME_WIDTH),
            format!("{:.3} km", hit.distance_km()),
            hit.product_count(),
            truncate(address, ADDRESS_WIDTH)
        );
    }
    println!();
    println!("{} seller(s) within {radius_km} km", sellers.len());
    Ok(())
}

/// Print the busiest grid cells in the requested window.
///
/// # Errors
///
/// Returns an error for an invalid window or precision, a failed query, or
/// when the analysis exceeds `timeout_secs`.
pub(crate) async fn run_zones(
    pool: &sqlx::PgPool,
    request: &ZonesRequest,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    let params = request.params(Utc::now())?;
    let aggregator = ZoneAggregator::new(market_source(pool));
    let signal = CancelSignal::with_timeout(Duration::from_secs(timeout_secs));
    let zones = aggregator.analyze(&params, &signal).await?;

    if zones.is_empty() {
        println!(
            "no cells with at least {} orders in the last {}",
            request.min_count, request.time_range
        );
        return Ok(());
    }

    print_zone_table(&zones);
    println!();
    println!(
        "{} zone(s) over the last {}",
        zones.len(),
        request.time_range
    );
    Ok(())
}

/// Print a location suggestion and the high-demand cells behind it.
///
/// # Errors
///
/// Returns an error if a query fails or the analysis exceeds `timeout_secs`.
pub(crate) async fn run_suggest(
    pool: &sqlx::PgPool,
    seller_id: i64,
    timeout_secs: u64,
) -> anyhow::Result<()> {
    let recommender = CentroidRecommender::new(market_source(pool));
    let signal = CancelSignal::with_timeout(Duration::from_secs(timeout_secs));
    let suggestion = recommender
        .suggest_location(seller_id, &ZoneParams::hot_zones(Utc::now()), &signal)
        .await?;

    println!("Seller {seller_id}: {}", suggestion.recommendation());
    if suggestion.high_demand_zones.is_empty() {
        println!("no high-demand zones in the last 90 days");
        return Ok(());
    }
    println!();
    println!("High-demand zones (last 90 days):");
    print_zone_table(&suggestion.high_demand_zones);
    Ok(())
}

/// Print platform totals followed by per-category figures.
///
/// # Errors
///
/// Returns an error if the statistics query fails.
pub(crate) async fn run_stats(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let stats = mercado_db::load_statistics(pool).await?;

    println!("Sellers:            {}", stats.total_sellers);
    println!("Buyers:             {}", stats.total_buyers);
    println!(
        "Products:           {} ({} in stock)",
        stats.total_products, stats.available_products
    );
    println!("Orders:             {}", stats.total_orders);
    println!("Completed revenue:  {:.2}", stats.total_revenue);
    println!(
        "Avg product price:  {}",
        stats
            .avg_product_price
            .map_or_else(|| "\u{2014}".to_string(), |p| format!("{p:.2}"))
    );
    println!(
        "Top category:       {}",
        stats.most_popular_category().unwrap_or("\u{2014}")
    );

    if stats.categories.is_empty() {
        return Ok(());
    }
    println!();
    println!(
        "{:<14}{:>10}{:>12}{:>10}",
        "CATEGORY", "PRODUCTS", "AVG PRICE", "STOCK"
    );
    for row in &stats.categories {
        println!(
            "{:<14}{:>10}{:>12}{:>10}",
            row.category,
            row.product_count,
            format!("{:.2}", row.avg_price),
            row.total_stock
        );
    }
    Ok(())
}

fn print_zone_table(zones: &[ZoneStats]) {
    println!(
        "{:<6}{:<22}{:>8}{:>8}{:>9}{:>12}{:>10}",
        "RANK", "CELL", "ORDERS", "BUYERS", "SELLERS", "REVENUE", "AVG"
    );
    for zone in zones {
        println!(
            "{:<6}{:<22}{:>8}{:>8}{:>9}{:>12}{:>10}",
            zone.rank,
            format_cell(&zone.cell),
            zone.order_count,
            zone.unique_buyers,
            zone.unique_sellers,
            format!("{:.2}", zone.revenue),
            format!("{:.2}", zone.average_order_value)
        );
    }
}

fn format_cell(cell: &ZoneKey) -> String {
    format!("{}, {}", cell.latitude(), cell.longitude())
}

/// Cut `value` to at most `max` characters, marking the cut with `...`.
fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        let kept: String = value.chars().take(max.saturating_sub(3)).collect();
        format!("{kept}...")
    } else {
        value.to_string()
    }
}

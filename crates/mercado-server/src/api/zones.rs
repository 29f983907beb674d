use axum::{
    extract::{rejection::QueryRejection, Query, State},
    Extension, Json,
};
use chrono::Utc;
use mercado_core::TimeRange;
use mercado_geo::{ZoneParams, ZoneStats};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_geo_error, map_query_rejection, money, ApiError, ApiResponse, AppState};

const DEFAULT_TIME_RANGE: &str = "30 days";

#[derive(Debug, Deserialize)]
pub(super) struct ActiveZonesQuery {
    pub time_range: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ActiveZoneItem {
    lat_zone: f64,
    lng_zone: f64,
    total_orders: usize,
    unique_customers: usize,
    unique_sellers: usize,
    total_revenue: String,
    avg_order_value: String,
    activity_rank: usize,
}

impl From<ZoneStats> for ActiveZoneItem {
    fn from(zone: ZoneStats) -> Self {
        Self {
            lat_zone: zone.cell.latitude().to_f64().unwrap_or_default(),
            lng_zone: zone.cell.longitude().to_f64().unwrap_or_default(),
            total_orders: zone.order_count,
            unique_customers: zone.unique_buyers,
            unique_sellers: zone.unique_sellers,
            total_revenue: money(zone.revenue),
            avg_order_value: money(zone.average_order_value),
            activity_rank: zone.rank,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct ActiveZonesResponse {
    time_range: String,
    active_zones: Vec<ActiveZoneItem>,
    total_zones_analyzed: usize,
}

pub(super) async fn analyze_active_zones(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    query: Result<Query<ActiveZonesQuery>, QueryRejection>,
) -> Result<Json<ApiResponse<ActiveZonesResponse>>, ApiError> {
    let Query(query) = query.map_err(|e| map_query_rejection(req_id.0.clone(), &e))?;
    let raw = query
        .time_range
        .filter(|s| !s.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_TIME_RANGE.to_string());
    let range = raw
        .parse::<TimeRange>()
        .map_err(|e| ApiError::bad_request(req_id.0.clone(), e.to_string()))?;

    let params = ZoneParams::active_zones(range, Utc::now());
    let zones = state
        .zones
        .analyze(&params, &state.analysis_signal())
        .await
        .map_err(|e| map_geo_error(req_id.0.clone(), &e))?;

    let active_zones: Vec<ActiveZoneItem> = zones.into_iter().map(ActiveZoneItem::from).collect();
    Ok(Json(ApiResponse::ok(
        ActiveZonesResponse {
            time_range: raw,
            total_zones_analyzed: active_zones.len(),
            active_zones,
        },
        req_id.0,
    )))
}

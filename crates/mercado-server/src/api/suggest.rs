use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use chrono::Utc;
use mercado_geo::{CentroidOutcome, LocationSuggestion, ZoneParams, ZoneStats};
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_geo_error, map_json_rejection, money, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct SuggestRequest {
    pub seller_id: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct OptimalLocation {
    center_lat: f64,
    center_lng: f64,
    customer_count: usize,
}

#[derive(Debug, Serialize)]
pub(super) struct HighDemandZone {
    lat: f64,
    lng: f64,
    order_density: usize,
    avg_order_value: String,
    rank: usize,
}

impl From<ZoneStats> for HighDemandZone {
    fn from(zone: ZoneStats) -> Self {
        Self {
            lat: zone.cell.latitude().to_f64().unwrap_or_default(),
            lng: zone.cell.longitude().to_f64().unwrap_or_default(),
            order_density: zone.order_count,
            avg_order_value: money(zone.average_order_value),
            rank: zone.rank,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SuggestResponse {
    seller_id: i64,
    optimal_location: Option<OptimalLocation>,
    high_demand_zones: Vec<HighDemandZone>,
    recommendation: String,
}

impl From<LocationSuggestion> for SuggestResponse {
    fn from(suggestion: LocationSuggestion) -> Self {
        let recommendation = suggestion.recommendation();
        let optimal_location = match suggestion.centroid {
            CentroidOutcome::Found(c) => Some(OptimalLocation {
                center_lat: c.point.latitude(),
                center_lng: c.point.longitude(),
                customer_count: c.sample_size,
            }),
            CentroidOutcome::NoData => None,
        };
        Self {
            seller_id: suggestion.seller_id,
            optimal_location,
            high_demand_zones: suggestion
                .high_demand_zones
                .into_iter()
                .map(HighDemandZone::from)
                .collect(),
            recommendation,
        }
    }
}

pub(super) async fn suggest_optimal_locations(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<SuggestRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<SuggestResponse>>, ApiError> {
    let Json(request) = body.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let seller_id = request
        .seller_id
        .ok_or_else(|| ApiError::bad_request(req_id.0.clone(), "seller_id is required"))?;

    let suggestion = state
        .recommender
        .suggest_location(
            seller_id,
            &ZoneParams::hot_zones(Utc::now()),
            &state.analysis_signal(),
        )
        .await
        .map_err(|e| map_geo_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::ok(
        SuggestResponse::from(suggestion),
        req_id.0,
    )))
}

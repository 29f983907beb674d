use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use mercado_geo::{require_point, NearbyParams, NearbySeller};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_geo_error, map_json_rejection, ApiError, ApiResponse, AppState};

const DEFAULT_RADIUS_KM: f64 = 5.0;

#[derive(Debug, Deserialize)]
pub(super) struct NearbyRequest {
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    #[serde(alias = "radius")]
    pub radius_km: Option<f64>,
}

#[derive(Debug, Serialize)]
pub(super) struct NearbySellerItem {
    id: i64,
    name: String,
    email: Option<String>,
    phone: Option<String>,
    address: Option<String>,
    latitude: f64,
    longitude: f64,
    product_count: i64,
    distance_km: f64,
}

impl From<NearbySeller> for NearbySellerItem {
    fn from(hit: NearbySeller) -> Self {
        Self {
            distance_km: (hit.distance_km() * 1_000.0).round() / 1_000.0,
            product_count: hit.product_count(),
            latitude: hit.location.latitude(),
            longitude: hit.location.longitude(),
            id: hit.seller.id,
            name: hit.seller.name,
            email: hit.seller.email,
            phone: hit.seller.phone,
            address: hit.seller.address,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct SearchParams {
    latitude: f64,
    longitude: f64,
    radius_km: f64,
}

#[derive(Debug, Serialize)]
pub(super) struct NearbyResponse {
    sellers: Vec<NearbySellerItem>,
    total: usize,
    search_params: SearchParams,
}

pub(super) async fn find_nearby_sellers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<NearbyRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<NearbyResponse>>, ApiError> {
    let Json(request) = body.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let origin = require_point(request.latitude, request.longitude)
        .map_err(|e| map_geo_error(req_id.0.clone(), &e))?;
    let radius_km = request.radius_km.unwrap_or(DEFAULT_RADIUS_KM);

    let hits = state
        .proximity
        .find_nearby(origin, &NearbyParams::from_km(radius_km))
        .await
        .map_err(|e| map_geo_error(req_id.0.clone(), &e))?;

    let sellers: Vec<NearbySellerItem> = hits.into_iter().map(NearbySellerItem::from).collect();
    Ok(Json(ApiResponse::ok(
        NearbyResponse {
            total: sellers.len(),
            sellers,
            search_params: SearchParams {
                latitude: origin.latitude(),
                longitude: origin.longitude(),
                radius_km,
            },
        },
        req_id.0,
    )))
}

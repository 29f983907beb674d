mod nearby;
mod products;
mod statistics;
mod suggest;
mod zones;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        State,
    },
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use mercado_db::PgMarketSource;
use mercado_geo::{
    CancelSignal, CentroidRecommender, GeoError, MarketDataSource, ProximitySearch, ZoneAggregator,
};
use serde::Serialize;
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{enforce_rate_limit, request_id, RateLimitState, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub proximity: ProximitySearch,
    pub zones: ZoneAggregator,
    pub recommender: CentroidRecommender,
    pub analysis_timeout: Duration,
}

impl AppState {
    /// Wire the analytics services to Postgres.
    #[must_use]
    pub fn new(pool: PgPool, analysis_timeout: Duration) -> Self {
        let source: Arc<dyn MarketDataSource> = Arc::new(PgMarketSource::new(pool.clone()));
        Self {
            proximity: ProximitySearch::new(Arc::clone(&source)),
            zones: ZoneAggregator::new(Arc::clone(&source)),
            recommender: CentroidRecommender::new(source),
            analysis_timeout,
            pool,
        }
    }

    /// Fresh cancellation signal bounded by the configured analysis deadline.
    pub(super) fn analysis_signal(&self) -> CancelSignal {
        CancelSignal::with_timeout(self.analysis_timeout)
    }
}

/// Success envelope: `{ "success": true, ...payload, "meta": {...} }`.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub success: bool,
    #[serde(flatten)]
    pub data: T,
    pub meta: ResponseMeta,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T, request_id: String) -> Self {
        Self {
            success: true,
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

/// Failure envelope: `{ "success": false, "error": ..., "code": ..., "meta": {...} }`.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub success: bool,
    pub error: String,
    pub code: String,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    service: &'static str,
    database: &'static str,
    timestamp: DateTime<Utc>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            success: false,
            error: message.into(),
            code: code.into(),
            meta: ResponseMeta::new(request_id.into()),
        }
    }

    pub fn bad_request(request_id: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(request_id, "bad_request", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.code.as_str() {
            "bad_request" => StatusCode::BAD_REQUEST,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "cancelled" => StatusCode::GATEWAY_TIMEOUT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &mercado_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

pub(super) fn map_geo_error(request_id: String, error: &GeoError) -> ApiError {
    match error {
        GeoError::InvalidArgument(message) => ApiError::bad_request(request_id, message.clone()),
        GeoError::Upstream(e) => {
            tracing::error!(error = %e, "market data source failed");
            ApiError::new(request_id, "internal_error", "data source unavailable")
        }
        GeoError::Cancelled => {
            tracing::warn!(request_id = %request_id, "analysis cancelled before completion");
            ApiError::new(request_id, "cancelled", "analysis did not finish in time")
        }
    }
}

pub(super) fn map_json_rejection(request_id: String, rejection: &JsonRejection) -> ApiError {
    ApiError::bad_request(request_id, rejection.body_text())
}

pub(super) fn map_query_rejection(request_id: String, rejection: &QueryRejection) -> ApiError {
    ApiError::bad_request(request_id, rejection.body_text())
}

/// Two decimal places for money and averages in responses.
pub(super) fn money(value: f64) -> String {
    format!("{value:.2}")
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

fn tool_router(rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route("/tools/find-nearby-sellers", post(nearby::find_nearby_sellers))
        .route(
            "/tools/get-available-products",
            post(products::get_available_products),
        )
        .route("/tools/filter-by-category", post(products::filter_by_category))
        .route("/tools/get-statistics", get(statistics::get_statistics))
        .route(
            "/tools/suggest-optimal-locations",
            post(suggest::suggest_optimal_locations),
        )
        .route("/tools/analyze-active-zones", get(zones::analyze_active_zones))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ))
}

pub fn build_app(state: AppState, rate_limit: RateLimitState) -> Router {
    let public_routes = Router::new()
        .route("/health", get(health))
        .route("/tools", get(list_tools));

    Router::new()
        .merge(public_routes)
        .merge(tool_router(rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    match mercado_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse::ok(
                HealthData {
                    status: "ok",
                    service: "mercado",
                    database: "connected",
                    timestamp: Utc::now(),
                },
                req_id.0,
            )),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::ok(
                    HealthData {
                        status: "degraded",
                        service: "mercado",
                        database: "disconnected",
                        timestamp: Utc::now(),
                    },
                    req_id.0,
                )),
            )
        }
    }
}

async fn list_tools(Extension(req_id): Extension<RequestId>) -> impl IntoResponse {
    Json(ApiResponse::ok(
        serde_json::json!({
            "available_tools": [
                {
                    "name": "find-nearby-sellers",
                    "method": "POST",
                    "endpoint": "/tools/find-nearby-sellers",
                    "description": "Find sellers near a location, nearest first",
                    "parameters": {
                        "latitude": "number (required)",
                        "longitude": "number (required)",
                        "radius_km": "number (optional, default: 5)"
                    }
                },
                {
                    "name": "get-available-products",
                    "method": "POST",
                    "endpoint": "/tools/get-available-products",
                    "description": "List in-stock products with optional filters",
                    "parameters": {
                        "category": "string (optional)",
                        "min_price": "number (optional)",
                        "max_price": "number (optional)",
                        "seller_id": "integer (optional)",
                        "limit": "integer (optional, default: 50, max: 200)"
                    }
                },
                {
                    "name": "filter-by-category",
                    "method": "POST",
                    "endpoint": "/tools/filter-by-category",
                    "description": "List in-stock products of one category, cheapest first",
                    "parameters": {
                        "category": "string (required)"
                    }
                },
                {
                    "name": "get-statistics",
                    "method": "GET",
                    "endpoint": "/tools/get-statistics",
                    "description": "Platform-wide counters and per-category statistics",
                    "parameters": {}
                },
                {
                    "name": "suggest-optimal-locations",
                    "method": "POST",
                    "endpoint": "/tools/suggest-optimal-locations",
                    "description": "Suggest a location for a seller from where their buyers are",
                    "parameters": {
                        "seller_id": "integer (required)"
                    }
                },
                {
                    "name": "analyze-active-zones",
                    "method": "GET",
                    "endpoint": "/tools/analyze-active-zones",
                    "description": "Rank grid zones by order activity",
                    "parameters": {
                        "time_range": "string (optional, default: \"30 days\")"
                    }
                }
            ]
        }),
        req_id.0,
    ))
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;

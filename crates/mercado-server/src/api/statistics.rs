use axum::{extract::State, Extension, Json};
use mercado_db::{CategoryStatsRow, MarketplaceStatistics};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct GeneralStatistics {
    total_sellers: i64,
    total_buyers: i64,
    total_products: i64,
    available_products: i64,
    total_orders: i64,
    total_revenue: String,
    avg_product_price: Option<String>,
    most_popular_category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryStatistics {
    category: String,
    product_count: i64,
    avg_price: String,
    total_stock: i64,
}

#[derive(Debug, Serialize)]
pub(super) struct StatisticsResponse {
    general_statistics: GeneralStatistics,
    category_statistics: Vec<CategoryStatistics>,
}

impl From<CategoryStatsRow> for CategoryStatistics {
    fn from(row: CategoryStatsRow) -> Self {
        Self {
            category: row.category,
            product_count: row.product_count,
            avg_price: format!("{:.2}", row.avg_price),
            total_stock: row.total_stock,
        }
    }
}

impl From<MarketplaceStatistics> for StatisticsResponse {
    fn from(stats: MarketplaceStatistics) -> Self {
        let most_popular_category = stats.most_popular_category().map(str::to_string);
        Self {
            general_statistics: GeneralStatistics {
                total_sellers: stats.total_sellers,
                total_buyers: stats.total_buyers,
                total_products: stats.total_products,
                available_products: stats.available_products,
                total_orders: stats.total_orders,
                total_revenue: format!("{:.2}", stats.total_revenue),
                avg_product_price: stats.avg_product_price.map(|p| format!("{p:.2}")),
                most_popular_category,
            },
            category_statistics: stats
                .categories
                .into_iter()
                .map(CategoryStatistics::from)
                .collect(),
        }
    }
}

pub(super) async fn get_statistics(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<StatisticsResponse>>, ApiError> {
    let stats = mercado_db::load_statistics(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse::ok(
        StatisticsResponse::from(stats),
        req_id.0,
    )))
}

use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use mercado_core::ProductCategory;
use mercado_db::{AvailableProductFilters, ProductRow};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;

use super::{map_db_error, map_json_rejection, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: i64,
    name: String,
    description: Option<String>,
    price: Decimal,
    stock: i32,
    category: String,
    unit: String,
    image_url: Option<String>,
    created_at: DateTime<Utc>,
    seller_id: i64,
    seller_name: String,
    seller_address: Option<String>,
    seller_phone: Option<String>,
}

impl From<ProductRow> for ProductItem {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            category: row.category,
            unit: row.unit,
            image_url: row.image_url,
            created_at: row.created_at,
            seller_id: row.seller_id,
            seller_name: row.seller_name,
            seller_address: row.seller_address,
            seller_phone: row.seller_phone,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct AvailableProductsRequest {
    pub category: Option<String>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub seller_id: Option<i64>,
    pub limit: Option<i64>,
}

#[derive(Debug, Serialize)]
pub(super) struct PriceRange {
    min: String,
    max: String,
}

#[derive(Debug, Serialize)]
pub(super) struct FiltersApplied {
    category: String,
    price_range: PriceRange,
}

#[derive(Debug, Serialize)]
pub(super) struct AvailableProductsResponse {
    products: Vec<ProductItem>,
    total: usize,
    filters_applied: FiltersApplied,
}

#[derive(Debug, Deserialize)]
pub(super) struct CategoryRequest {
    pub category: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryResponse {
    category: ProductCategory,
    products: Vec<ProductItem>,
    total: usize,
}

/// Blank strings count as "no filter".
fn parse_category(raw: Option<&str>) -> Result<Option<ProductCategory>, String> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => s.parse::<ProductCategory>().map(Some).map_err(|e| e.to_string()),
    }
}

fn build_filters(request: &AvailableProductsRequest) -> Result<AvailableProductFilters, String> {
    let category = parse_category(request.category.as_deref())?;
    if let (Some(min), Some(max)) = (request.min_price, request.max_price) {
        if min > max {
            return Err(format!("min_price {min} is greater than max_price {max}"));
        }
    }
    Ok(AvailableProductFilters {
        category,
        min_price: request.min_price,
        max_price: request.max_price,
        seller_id: request.seller_id,
        limit: request.limit,
    })
}

fn describe_filters(filters: &AvailableProductFilters) -> FiltersApplied {
    FiltersApplied {
        category: filters
            .category
            .map_or_else(|| "all".to_string(), |c| c.as_str().to_string()),
        price_range: PriceRange {
            min: filters
                .min_price
                .map_or_else(|| "0".to_string(), |d| d.to_string()),
            max: filters
                .max_price
                .map_or_else(|| "unlimited".to_string(), |d| d.to_string()),
        },
    }
}

pub(super) async fn get_available_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<AvailableProductsRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<AvailableProductsResponse>>, ApiError> {
    let Json(request) = body.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let filters =
        build_filters(&request).map_err(|msg| ApiError::bad_request(req_id.0.clone(), msg))?;

    let rows = mercado_db::list_available_products(&state.pool, filters)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let products: Vec<ProductItem> = rows.into_iter().map(ProductItem::from).collect();
    Ok(Json(ApiResponse::ok(
        AvailableProductsResponse {
            total: products.len(),
            products,
            filters_applied: describe_filters(&filters),
        },
        req_id.0,
    )))
}

pub(super) async fn filter_by_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    body: Result<Json<CategoryRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<CategoryResponse>>, ApiError> {
    let Json(request) = body.map_err(|e| map_json_rejection(req_id.0.clone(), &e))?;
    let category = parse_category(request.category.as_deref())
        .map_err(|msg| ApiError::bad_request(req_id.0.clone(), msg))?
        .ok_or_else(|| ApiError::bad_request(req_id.0.clone(), "category is required"))?;

    let rows = mercado_db::list_products_by_category(&state.pool, category)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let products: Vec<ProductItem> = rows.into_iter().map(ProductItem::from).collect();
    Ok(Json(ApiResponse::ok(
        CategoryResponse {
            category,
            total: products.len(),
            products,
        },
        req_id.0,
    )))
}

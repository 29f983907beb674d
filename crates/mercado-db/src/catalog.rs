//! Read queries over the product catalog.

use chrono::{DateTime, Utc};
use mercado_core::ProductCategory;
use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

pub const DEFAULT_PRODUCT_LIMIT: i64 = 50;
pub const MAX_PRODUCT_LIMIT: i64 = 200;

/// An in-stock product with the seller details buyers need to reach them.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub stock: i32,
    pub category: String,
    pub unit: String,
    pub image_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub seller_id: i64,
    pub seller_name: String,
    pub seller_address: Option<String>,
    pub seller_phone: Option<String>,
}

/// Optional filters for [`list_available_products`].
#[derive(Debug, Clone, Copy, Default)]
pub struct AvailableProductFilters {
    pub category: Option<ProductCategory>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub seller_id: Option<i64>,
    /// Clamped with [`clamp_limit`] before querying.
    pub limit: Option<i64>,
}

/// Page size for product listings: default 50, kept within `[1, 200]`.
#[must_use]
pub fn clamp_limit(limit: Option<i64>) -> i64 {
    limit
        .unwrap_or(DEFAULT_PRODUCT_LIMIT)
        .clamp(1, MAX_PRODUCT_LIMIT)
}

/// Products with stock, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_available_products(
    pool: &PgPool,
    filters: AvailableProductFilters,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT \
             p.id, p.name, p.description, p.price, p.stock, p.category, p.unit, \
             p.image_url, p.created_at, \
             u.id AS seller_id, u.name AS seller_name, \
             u.address AS seller_address, u.phone AS seller_phone \
         FROM products p \
         JOIN users u ON u.id = p.seller_id \
         WHERE p.stock > 0 \
           AND ($1::TEXT IS NULL OR p.category = $1) \
           AND ($2::NUMERIC IS NULL OR p.price >= $2) \
           AND ($3::NUMERIC IS NULL OR p.price <= $3) \
           AND ($4::BIGINT IS NULL OR p.seller_id = $4) \
         ORDER BY p.created_at DESC, p.id DESC \
         LIMIT $5",
    )
    .bind(filters.category.map(ProductCategory::as_str))
    .bind(filters.min_price)
    .bind(filters.max_price)
    .bind(filters.seller_id)
    .bind(clamp_limit(filters.limit))
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

/// In-stock products of one category, cheapest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_by_category(
    pool: &PgPool,
    category: ProductCategory,
) -> Result<Vec<ProductRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductRow>(
        "SELECT \
             p.id, p.name, p.description, p.price, p.stock, p.category, p.unit, \
             p.image_url, p.created_at, \
             u.id AS seller_id, u.name AS seller_name, \
             u.address AS seller_address, u.phone AS seller_phone \
         FROM products p \
         JOIN users u ON u.id = p.seller_id \
         WHERE p.stock > 0 AND p.category = $1 \
         ORDER BY p.price ASC, p.id ASC",
    )
    .bind(category.as_str())
    .fetch_all(pool)
    .await?;

    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_defaults_and_clamps() {
        assert_eq!(clamp_limit(None), 50);
        assert_eq!(clamp_limit(Some(0)), 1);
        assert_eq!(clamp_limit(Some(-3)), 1);
        assert_eq!(clamp_limit(Some(75)), 75);
        assert_eq!(clamp_limit(Some(10_000)), 200);
    }
}

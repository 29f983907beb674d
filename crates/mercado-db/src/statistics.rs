//! Platform-wide counters for the statistics tool.

use rust_decimal::Decimal;
use sqlx::PgPool;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
struct CountsRow {
    total_sellers: i64,
    total_buyers: i64,
    total_products: i64,
    available_products: i64,
    total_orders: i64,
    total_revenue: Decimal,
    avg_product_price: Option<Decimal>,
}

/// Aggregates over in-stock products of one category.
#[derive(Debug, Clone, PartialEq, sqlx::FromRow)]
pub struct CategoryStatsRow {
    pub category: String,
    pub product_count: i64,
    pub avg_price: Decimal,
    pub total_stock: i64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MarketplaceStatistics {
    pub total_sellers: i64,
    pub total_buyers: i64,
    pub total_products: i64,
    pub available_products: i64,
    pub total_orders: i64,
    /// Sum over completed orders, two decimal places.
    pub total_revenue: Decimal,
    /// Mean price of in-stock products, two decimal places.
    pub avg_product_price: Option<Decimal>,
    /// Busiest category first, ties by name.
    pub categories: Vec<CategoryStatsRow>,
}

impl MarketplaceStatistics {
    #[must_use]
    pub fn most_popular_category(&self) -> Option<&str> {
        self.categories.first().map(|c| c.category.as_str())
    }
}

/// Load every counter the statistics tool reports.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if any query fails.
pub async fn load_statistics(pool: &PgPool) -> Result<MarketplaceStatistics, DbError> {
    let counts = sqlx::query_as::<_, CountsRow>(
        "SELECT \
             (SELECT COUNT(*) FROM users WHERE role = 'seller') AS total_sellers, \
             (SELECT COUNT(*) FROM users WHERE role = 'buyer') AS total_buyers, \
             (SELECT COUNT(*) FROM products) AS total_products, \
             (SELECT COUNT(*) FROM products WHERE stock > 0) AS available_products, \
             (SELECT COUNT(*) FROM orders) AS total_orders, \
             (SELECT COALESCE(SUM(total_amount), 0) FROM orders \
                 WHERE LOWER(TRIM(status)) = 'completed') AS total_revenue, \
             (SELECT ROUND(AVG(price), 2) FROM products WHERE stock > 0) AS avg_product_price",
    )
    .fetch_one(pool)
    .await?;

    let categories = sqlx::query_as::<_, CategoryStatsRow>(
        "SELECT \
             category, \
             COUNT(*) AS product_count, \
             ROUND(AVG(price), 2) AS avg_price, \
             SUM(stock)::BIGINT AS total_stock \
         FROM products \
         WHERE stock > 0 \
         GROUP BY category \
         ORDER BY product_count DESC, category ASC",
    )
    .fetch_all(pool)
    .await?;

    Ok(MarketplaceStatistics {
        total_sellers: counts.total_sellers,
        total_buyers: counts.total_buyers,
        total_products: counts.total_products,
        available_products: counts.available_products,
        total_orders: counts.total_orders,
        total_revenue: counts.total_revenue.round_dp(2),
        avg_product_price: counts.avg_product_price,
        categories,
    })
}

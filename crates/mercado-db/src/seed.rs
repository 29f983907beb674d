use std::collections::HashMap;
use std::str::FromStr;

use mercado_core::{GeoPoint, SeedFile, UserRole};
use rust_decimal::Decimal;
use sqlx::{PgPool, Postgres, Transaction};

use crate::DbError;

/// Row counts written by [`seed_marketplace`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub sellers: usize,
    pub buyers: usize,
    pub products: usize,
    pub orders: usize,
}

/// Replace all marketplace data with the contents of `seed`.
///
/// Existing users, products and orders are wiped first. Everything runs in a
/// single transaction; if any insert fails nothing is changed.
///
/// # Errors
///
/// Returns [`DbError::InvalidSeed`] for unparseable amounts or dangling order
/// references, and [`DbError::Sqlx`] if any database operation fails.
pub async fn seed_marketplace(pool: &PgPool, seed: &SeedFile) -> Result<SeedSummary, DbError> {
    let mut tx = pool.begin().await?;
    let mut summary = SeedSummary::default();
    let mut ids: HashMap<String, i64> = HashMap::new();

    sqlx::query("TRUNCATE orders, products, users RESTART IDENTITY CASCADE")
        .execute(&mut *tx)
        .await?;

    for seller in &seed.sellers {
        let seller_id = insert_user(
            &mut tx,
            UserRole::Seller,
            &seller.name,
            &seller.email,
            seller.phone.as_deref(),
            seller.address.as_deref(),
            seller.location,
            seller.is_available,
        )
        .await?;
        ids.insert(seller.email.to_lowercase(), seller_id);
        summary.sellers += 1;

        for product in &seller.products {
            let price = parse_amount(&product.price, &product.name)?;
            sqlx::query(
                "INSERT INTO products (seller_id, name, description, price, stock, category, unit) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7)",
            )
            .bind(seller_id)
            .bind(&product.name)
            .bind(&product.description)
            .bind(price)
            .bind(product.stock)
            .bind(product.category.as_str())
            .bind(&product.unit)
            .execute(&mut *tx)
            .await?;
            summary.products += 1;
        }
    }

    for buyer in &seed.buyers {
        let buyer_id = insert_user(
            &mut tx,
            UserRole::Buyer,
            &buyer.name,
            &buyer.email,
            buyer.phone.as_deref(),
            buyer.address.as_deref(),
            buyer.location,
            true,
        )
        .await?;
        ids.insert(buyer.email.to_lowercase(), buyer_id);
        summary.buyers += 1;
    }

    for order in &seed.orders {
        let lookup = |email: &str| {
            ids.get(&email.to_lowercase())
                .copied()
                .ok_or_else(|| DbError::InvalidSeed(format!("unknown account '{email}'")))
        };
        let buyer_id = lookup(&order.buyer)?;
        let seller_id = lookup(&order.seller)?;
        let amount = parse_amount(&order.total_amount, "order total")?;

        sqlx::query(
            "INSERT INTO orders (buyer_id, seller_id, total_amount, status, created_at) \
             VALUES ($1, $2, $3, $4, NOW() - make_interval(days => $5))",
        )
        .bind(buyer_id)
        .bind(seller_id)
        .bind(amount)
        .bind(order.status.as_str())
        .bind(i32::try_from(order.days_ago).unwrap_or(i32::MAX))
        .execute(&mut *tx)
        .await?;
        summary.orders += 1;
    }

    tx.commit().await?;
    tracing::info!(
        sellers = summary.sellers,
        buyers = summary.buyers,
        products = summary.products,
        orders = summary.orders,
        "marketplace seeded"
    );
    Ok(summary)
}

#[allow(clippy::too_many_arguments)]
async fn insert_user(
    tx: &mut Transaction<'_, Postgres>,
    role: UserRole,
    name: &str,
    email: &str,
    phone: Option<&str>,
    address: Option<&str>,
    location: Option<GeoPoint>,
    is_available: bool,
) -> Result<i64, DbError> {
    let id: i64 = sqlx::query_scalar(
        "INSERT INTO users (name, email, phone, address, role, latitude, longitude, is_available) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8) \
         RETURNING id",
    )
    .bind(name)
    .bind(email)
    .bind(phone)
    .bind(address)
    .bind(role.to_string())
    .bind(location.map(|p| p.latitude()))
    .bind(location.map(|p| p.longitude()))
    .bind(is_available)
    .fetch_one(&mut **tx)
    .await?;
    Ok(id)
}

fn parse_amount(value: &str, what: &str) -> Result<Decimal, DbError> {
    Decimal::from_str(value.trim())
        .map_err(|e| DbError::InvalidSeed(format!("{what}: '{value}' is not a decimal ({e})")))
}

use std::collections::HashSet;
use std::path::Path;
use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, GeoPoint, OrderStatus, ProductCategory};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedProduct {
    pub name: String,
    pub description: Option<String>,
    pub category: ProductCategory,
    /// Unit price as a decimal string, e.g. `"12.50"`.
    pub price: String,
    pub stock: i32,
    /// Sale unit such as `kg`, `unit` or `dozen`.
    pub unit: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedSeller {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
    #[serde(default = "default_true")]
    pub is_available: bool,
    #[serde(default)]
    pub products: Vec<SeedProduct>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedBuyer {
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub location: Option<GeoPoint>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SeedOrder {
    pub buyer: String,
    pub seller: String,
    /// Order total as a decimal string.
    pub total_amount: String,
    pub status: OrderStatus,
    /// How many days before seeding the order was placed.
    #[serde(default)]
    pub days_ago: u32,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub sellers: Vec<SeedSeller>,
    #[serde(default)]
    pub buyers: Vec<SeedBuyer>,
    #[serde(default)]
    pub orders: Vec<SeedOrder>,
}

fn default_true() -> bool {
    true
}

/// Load and validate a marketplace seed fixture from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_seed(path: &Path) -> Result<SeedFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SeedFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    parse_seed(&content)
}

/// Parse and validate seed YAML already in memory.
///
/// # Errors
///
/// Returns `ConfigError` if the YAML is malformed or fails validation.
pub fn parse_seed(content: &str) -> Result<SeedFile, ConfigError> {
    let seed: SeedFile = serde_yaml::from_str(content)?;
    validate_seed(&seed)?;
    Ok(seed)
}

fn validate_seed(seed: &SeedFile) -> Result<(), ConfigError> {
    let mut emails = HashSet::new();
    let mut seller_emails = HashSet::new();
    let mut buyer_emails = HashSet::new();

    for seller in &seed.sellers {
        check_identity(&seller.name, &seller.email, &mut emails)?;
        seller_emails.insert(seller.email.to_lowercase());

        for product in &seller.products {
            if product.name.trim().is_empty() {
                return Err(ConfigError::Validation(format!(
                    "seller '{}' has a product with an empty name",
                    seller.email
                )));
            }
            check_non_negative_amount(&product.price, &format!("price of '{}'", product.name))?;
            if product.stock < 0 {
                return Err(ConfigError::Validation(format!(
                    "product '{}' has negative stock {}",
                    product.name, product.stock
                )));
            }
        }
    }

    for buyer in &seed.buyers {
        check_identity(&buyer.name, &buyer.email, &mut emails)?;
        buyer_emails.insert(buyer.email.to_lowercase());
    }

    for (idx, order) in seed.orders.iter().enumerate() {
        if !buyer_emails.contains(&order.buyer.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "order #{idx} references unknown buyer '{}'",
                order.buyer
            )));
        }
        if !seller_emails.contains(&order.seller.to_lowercase()) {
            return Err(ConfigError::Validation(format!(
                "order #{idx} references unknown seller '{}'",
                order.seller
            )));
        }
        check_non_negative_amount(&order.total_amount, &format!("total of order #{idx}"))?;
    }

    Ok(())
}

fn check_identity(name: &str, email: &str, seen: &mut HashSet<String>) -> Result<(), ConfigError> {
    if name.trim().is_empty() {
        return Err(ConfigError::Validation("user name must be non-empty".to_string()));
    }
    if !email.contains('@') {
        return Err(ConfigError::Validation(format!("invalid email: '{email}'")));
    }
    if !seen.insert(email.to_lowercase()) {
        return Err(ConfigError::Validation(format!("duplicate email: '{email}'")));
    }
    Ok(())
}

fn check_non_negative_amount(raw: &str, what: &str) -> Result<(), ConfigError> {
    match Decimal::from_str(raw.trim()) {
        Ok(v) if v >= Decimal::ZERO => Ok(()),
        _ => Err(ConfigError::Validation(format!(
            "{what} must be a non-negative number, got '{raw}'"
        ))),
    }
}

#[cfg(test)]
#[path = "seed_test.rs"]
mod tests;

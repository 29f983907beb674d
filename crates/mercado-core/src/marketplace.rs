use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::CoreError;

/// The fixed set of product categories a seller can list under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductCategory {
    Fruits,
    Vegetables,
    PreparedFood,
    Beverages,
    Crafts,
    Clothing,
    Flowers,
    Other,
}

impl ProductCategory {
    pub const ALL: [ProductCategory; 8] = [
        ProductCategory::Fruits,
        ProductCategory::Vegetables,
        ProductCategory::PreparedFood,
        ProductCategory::Beverages,
        ProductCategory::Crafts,
        ProductCategory::Clothing,
        ProductCategory::Flowers,
        ProductCategory::Other,
    ];

    /// Stable storage/wire name, e.g. `"prepared_food"`.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ProductCategory::Fruits => "fruits",
            ProductCategory::Vegetables => "vegetables",
            ProductCategory::PreparedFood => "prepared_food",
            ProductCategory::Beverages => "beverages",
            ProductCategory::Crafts => "crafts",
            ProductCategory::Clothing => "clothing",
            ProductCategory::Flowers => "flowers",
            ProductCategory::Other => "other",
        }
    }
}

impl std::fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductCategory {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let needle = s.trim().to_lowercase().replace([' ', '-'], "_");
        ProductCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == needle)
            .ok_or_else(|| CoreError::UnknownCategory(s.to_string()))
    }
}

/// Lifecycle state of an order. Anything the store holds that is not one of
/// the known states is carried as [`OrderStatus::Other`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrderStatus {
    Pending,
    Completed,
    Cancelled,
    #[serde(untagged)]
    Other(String),
}

impl OrderStatus {
    /// Whether the order should count as real demand. Cancelled orders do not.
    #[must_use]
    pub fn is_relevant(&self) -> bool {
        !matches!(self, OrderStatus::Cancelled)
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Completed => "completed",
            OrderStatus::Cancelled => "cancelled",
            OrderStatus::Other(s) => s,
        }
    }
}

impl From<&str> for OrderStatus {
    fn from(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "pending" => OrderStatus::Pending,
            "completed" => OrderStatus::Completed,
            "cancelled" | "canceled" => OrderStatus::Cancelled,
            _ => OrderStatus::Other(s.to_string()),
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    Buyer,
    Seller,
    Admin,
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            UserRole::Buyer => write!(f, "buyer"),
            UserRole::Seller => write!(f, "seller"),
            UserRole::Admin => write!(f, "admin"),
        }
    }
}

impl FromStr for UserRole {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" => Ok(UserRole::Buyer),
            "seller" => Ok(UserRole::Seller),
            "admin" => Ok(UserRole::Admin),
            other => Err(CoreError::UnknownRole(other.to_string())),
        }
    }
}

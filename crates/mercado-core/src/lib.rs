pub mod app_config;
pub mod config;
pub mod error;
pub mod geo;
pub mod marketplace;
pub mod seed;
pub mod time_range;

pub use app_config::{AppConfig, Environment};
pub use config::{load_app_config, load_app_config_from_env};
pub use error::{ConfigError, CoreError};
pub use geo::{GeoPoint, EARTH_RADIUS_M};
pub use marketplace::{OrderStatus, ProductCategory, UserRole};
pub use seed::{load_seed, parse_seed, SeedBuyer, SeedFile, SeedOrder, SeedProduct, SeedSeller};
pub use time_range::TimeRange;

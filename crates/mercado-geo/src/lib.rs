//! Geospatial search and demand analytics for the marketplace.
//!
//! Every service here is a read-only query over a [`MarketDataSource`]; none
//! holds mutable state, so a single instance can serve concurrent requests.

pub mod cancel;
pub mod centroid;
pub mod error;
pub mod proximity;
pub mod source;
pub mod zones;

pub use cancel::CancelSignal;
pub use centroid::{
    compute_centroid, Centroid, CentroidOutcome, CentroidRecommender, LocationSuggestion,
};
pub use error::{GeoError, SourceError};
pub use proximity::{find_nearby, require_point, NearbyParams, NearbySeller, ProximitySearch};
pub use source::{MarketDataSource, OrderEvent, SellerLocation};
pub use zones::{
    aggregate_zones, ZoneAggregator, ZoneKey, ZoneParams, ZoneStats, MAX_GRID_PRECISION,
};

//! Radius search over seller positions.
//!
//! Distances are meters everywhere inside this module. Callers that speak
//! kilometers convert at the boundary with [`NearbyParams::from_km`] and
//! [`NearbySeller::distance_km`].

use std::sync::Arc;

use mercado_core::GeoPoint;

use crate::{GeoError, MarketDataSource, SellerLocation};

const DEFAULT_RADIUS_M: f64 = 5_000.0;

/// Options for a nearby-seller query.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearbyParams {
    pub radius_m: f64,
    /// Ask the source for active accounts only.
    pub active_only: bool,
    /// Additionally require the seller to have flagged themselves available.
    pub available_only: bool,
}

impl Default for NearbyParams {
    fn default() -> Self {
        Self {
            radius_m: DEFAULT_RADIUS_M,
            active_only: true,
            available_only: false,
        }
    }
}

impl NearbyParams {
    #[must_use]
    pub fn from_km(radius_km: f64) -> Self {
        Self {
            radius_m: radius_km * 1_000.0,
            ..Self::default()
        }
    }

    fn admits(&self, seller: &SellerLocation) -> bool {
        (!self.active_only || seller.is_active) && (!self.available_only || seller.is_available)
    }
}

/// A seller inside the search radius.
#[derive(Debug, Clone, PartialEq)]
pub struct NearbySeller {
    pub seller: SellerLocation,
    pub location: GeoPoint,
    pub distance_m: f64,
}

impl NearbySeller {
    #[must_use]
    pub fn distance_km(&self) -> f64 {
        self.distance_m / 1_000.0
    }

    #[must_use]
    pub fn product_count(&self) -> i64 {
        self.seller.product_count
    }
}

/// Build a query origin from optional request coordinates.
///
/// # Errors
///
/// Returns [`GeoError::InvalidArgument`] if either coordinate is missing or
/// out of range.
pub fn require_point(latitude: Option<f64>, longitude: Option<f64>) -> Result<GeoPoint, GeoError> {
    let (Some(lat), Some(lng)) = (latitude, longitude) else {
        return Err(GeoError::InvalidArgument(
            "latitude and longitude are required".to_string(),
        ));
    };
    GeoPoint::from_lat_lng(lat, lng).map_err(|e| GeoError::InvalidArgument(e.to_string()))
}

/// Select the sellers within `radius_m` of `origin`, nearest first.
///
/// Sellers without a location or rejected by `eligible` are skipped. Equal
/// distances keep their input order. A non-positive radius yields nothing.
pub fn find_nearby<P>(
    origin: &GeoPoint,
    radius_m: f64,
    sellers: Vec<SellerLocation>,
    eligible: P,
) -> Vec<NearbySeller>
where
    P: Fn(&SellerLocation) -> bool,
{
    if radius_m.is_nan() || radius_m <= 0.0 {
        return Vec::new();
    }

    let mut hits: Vec<NearbySeller> = sellers
        .into_iter()
        .filter(|seller| eligible(seller))
        .filter_map(|seller| {
            let location = seller.location?;
            let distance_m = origin.distance_m(&location);
            (distance_m <= radius_m).then_some(NearbySeller {
                seller,
                location,
                distance_m,
            })
        })
        .collect();

    // sort_by is stable, which is what gives ties their input order.
    hits.sort_by(|a, b| a.distance_m.total_cmp(&b.distance_m));
    hits
}

/// Nearby-seller queries against a data source.
#[derive(Clone)]
pub struct ProximitySearch {
    source: Arc<dyn MarketDataSource>,
}

impl ProximitySearch {
    pub fn new(source: Arc<dyn MarketDataSource>) -> Self {
        Self { source }
    }

    /// # Errors
    ///
    /// Returns [`GeoError::InvalidArgument`] for a NaN radius and
    /// [`GeoError::Upstream`] if the source fails.
    pub async fn find_nearby(
        &self,
        origin: GeoPoint,
        params: &NearbyParams,
    ) -> Result<Vec<NearbySeller>, GeoError> {
        if params.radius_m.is_nan() {
            return Err(GeoError::InvalidArgument("radius must be a number".to_string()));
        }
        if params.radius_m <= 0.0 {
            return Ok(Vec::new());
        }

        let sellers = self
            .source
            .list_sellers_with_location(params.active_only)
            .await?;
        let scanned = sellers.len();
        let hits = find_nearby(&origin, params.radius_m, sellers, |s| params.admits(s));

        tracing::debug!(
            latitude = origin.latitude(),
            longitude = origin.longitude(),
            radius_m = params.radius_m,
            scanned,
            matched = hits.len(),
            "proximity search complete"
        );
        Ok(hits)
    }
}

//! Service-level tests for mercado-geo against an in-memory data source.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use mercado_core::{GeoPoint, OrderStatus};
use mercado_geo::{
    CancelSignal, CentroidOutcome, CentroidRecommender, GeoError, MarketDataSource, NearbyParams,
    OrderEvent, ProximitySearch, SellerLocation, SourceError, ZoneAggregator, ZoneParams,
};

// ---------------------------------------------------------------------------
// Fake source
// ---------------------------------------------------------------------------

#[derive(Default)]
struct FakeSource {
    sellers: Vec<SellerLocation>,
    orders: Vec<OrderEvent>,
    fail: bool,
    delay: Option<Duration>,
    calls: AtomicUsize,
}

impl FakeSource {
    async fn enter(&self) -> Result<(), SourceError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        if self.fail {
            return Err(SourceError::new("database unavailable"));
        }
        Ok(())
    }
}

#[async_trait]
impl MarketDataSource for FakeSource {
    async fn list_sellers_with_location(
        &self,
        active_only: bool,
    ) -> Result<Vec<SellerLocation>, SourceError> {
        self.enter().await?;
        Ok(self
            .sellers
            .iter()
            .filter(|s| !active_only || s.is_active)
            .cloned()
            .collect())
    }

    async fn list_orders(
        &self,
        since: DateTime<Utc>,
        seller_id: Option<i64>,
    ) -> Result<Vec<OrderEvent>, SourceError> {
        self.enter().await?;
        Ok(self
            .orders
            .iter()
            .filter(|o| o.placed_at >= since)
            .filter(|o| seller_id.is_none_or(|id| o.seller_id == id))
            .cloned()
            .collect())
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
}

fn point(lat: f64, lng: f64) -> GeoPoint {
    GeoPoint::from_lat_lng(lat, lng).expect("valid point")
}

fn seller(id: i64, lat: f64, lng: f64) -> SellerLocation {
    SellerLocation {
        id,
        name: format!("Puesto {id}"),
        email: Some(format!("puesto{id}@example.com")),
        phone: None,
        address: Some("Zona 1, Ciudad de Guatemala".to_string()),
        location: Some(point(lat, lng)),
        is_active: true,
        is_available: true,
        product_count: 3,
    }
}

fn order(id: i64, buyer: i64, seller: i64, at: Option<(f64, f64)>, amount: f64) -> OrderEvent {
    OrderEvent {
        order_id: id,
        buyer_id: buyer,
        seller_id: seller,
        buyer_location: at.map(|(lat, lng)| point(lat, lng)),
        amount,
        placed_at: now() - chrono::Duration::days(2),
        status: OrderStatus::Completed,
    }
}

fn as_source(fake: FakeSource) -> Arc<dyn MarketDataSource> {
    Arc::new(fake)
}

// ---------------------------------------------------------------------------
// Proximity
// ---------------------------------------------------------------------------

#[tokio::test]
async fn nearby_returns_sellers_nearest_first() {
    let source = as_source(FakeSource {
        sellers: vec![
            seller(2, 14.6300, -90.5100),
            seller(1, 14.6349, -90.5069),
            seller(3, 14.9000, -90.9000),
        ],
        ..FakeSource::default()
    });
    let search = ProximitySearch::new(source);

    let hits = search
        .find_nearby(point(14.6349, -90.5069), &NearbyParams::from_km(2.0))
        .await
        .expect("search succeeds");

    let ids: Vec<i64> = hits.iter().map(|h| h.seller.id).collect();
    assert_eq!(ids, vec![1, 2]);
    assert!(hits[0].distance_km() < 0.001);
    assert!(hits[1].distance_km() > 0.5 && hits[1].distance_km() < 0.8);
}

#[tokio::test]
async fn nearby_skips_inactive_and_optionally_unavailable_sellers() {
    let mut inactive = seller(1, 14.6349, -90.5069);
    inactive.is_active = false;
    let mut busy = seller(2, 14.6350, -90.5070);
    busy.is_available = false;
    let open = seller(3, 14.6351, -90.5071);
    let source = as_source(FakeSource {
        sellers: vec![inactive, busy, open],
        ..FakeSource::default()
    });
    let search = ProximitySearch::new(source);
    let origin = point(14.6349, -90.5069);

    let default_hits = search
        .find_nearby(origin, &NearbyParams::default())
        .await
        .unwrap();
    assert_eq!(
        default_hits.iter().map(|h| h.seller.id).collect::<Vec<_>>(),
        vec![2, 3]
    );

    let strict = NearbyParams {
        available_only: true,
        ..NearbyParams::default()
    };
    let strict_hits = search.find_nearby(origin, &strict).await.unwrap();
    assert_eq!(strict_hits.len(), 1);
    assert_eq!(strict_hits[0].seller.id, 3);
}

#[tokio::test]
async fn zero_radius_does_not_touch_the_source() {
    let fake = Arc::new(FakeSource {
        sellers: vec![seller(1, 14.6349, -90.5069)],
        ..FakeSource::default()
    });
    let search = ProximitySearch::new(fake.clone());

    let hits = search
        .find_nearby(point(14.6349, -90.5069), &NearbyParams::from_km(0.0))
        .await
        .unwrap();
    assert!(hits.is_empty());
    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn nan_radius_is_invalid() {
    let search = ProximitySearch::new(as_source(FakeSource::default()));
    let result = search
        .find_nearby(point(0.0, 0.0), &NearbyParams::from_km(f64::NAN))
        .await;
    assert!(matches!(result, Err(GeoError::InvalidArgument(_))));
}

#[tokio::test]
async fn source_failure_surfaces_as_upstream() {
    let search = ProximitySearch::new(as_source(FakeSource {
        fail: true,
        ..FakeSource::default()
    }));
    let err = search
        .find_nearby(point(14.6, -90.5), &NearbyParams::default())
        .await
        .unwrap_err();
    assert!(matches!(err, GeoError::Upstream(_)));
    assert!(!err.is_client_error());
}

// ---------------------------------------------------------------------------
// Zones
// ---------------------------------------------------------------------------

#[tokio::test]
async fn zone_analysis_reads_window_from_source() {
    let mut stale = order(9, 9, 100, Some((14.61, -90.51)), 500.0);
    stale.placed_at = now() - chrono::Duration::days(120);
    let source = as_source(FakeSource {
        orders: vec![
            order(1, 1, 100, Some((14.61, -90.51)), 10.0),
            order(2, 2, 100, Some((14.62, -90.49)), 20.0),
            order(3, 2, 101, Some((14.58, -90.52)), 30.0),
            order(4, 3, 102, Some((14.64, -90.46)), 40.0),
            stale,
        ],
        ..FakeSource::default()
    });
    let params = ZoneParams {
        since: now() - chrono::Duration::days(30),
        grid_precision: 1,
        min_count: 3,
        top_n: 20,
    };

    let zones = ZoneAggregator::new(source)
        .analyze(&params, &CancelSignal::new())
        .await
        .expect("analysis succeeds");

    assert_eq!(zones.len(), 1);
    assert_eq!(zones[0].order_count, 4);
    assert!((zones[0].revenue - 100.0).abs() < 1e-9);
    assert!((zones[0].average_order_value - 25.0).abs() < 1e-9);
}

#[tokio::test]
async fn zone_analysis_times_out_on_slow_source() {
    let source = as_source(FakeSource {
        delay: Some(Duration::from_secs(5)),
        ..FakeSource::default()
    });
    let result = ZoneAggregator::new(source)
        .analyze(
            &ZoneParams::hot_zones(now()),
            &CancelSignal::with_timeout(Duration::from_millis(20)),
        )
        .await;
    assert!(matches!(result, Err(GeoError::Cancelled)));
}

#[tokio::test]
async fn zone_analysis_honours_prior_cancel() {
    let fake = Arc::new(FakeSource::default());
    let signal = CancelSignal::new();
    signal.cancel();

    let result = ZoneAggregator::new(fake.clone())
        .analyze(&ZoneParams::hot_zones(now()), &signal)
        .await;
    assert!(matches!(result, Err(GeoError::Cancelled)));
    assert_eq!(fake.calls.load(Ordering::SeqCst), 0);
}

// ---------------------------------------------------------------------------
// Centroid
// ---------------------------------------------------------------------------

#[tokio::test]
async fn seller_without_locatable_orders_gets_no_data() {
    let source = as_source(FakeSource {
        orders: vec![
            order(1, 1, 7, None, 10.0),
            order(2, 2, 7, None, 15.0),
            order(3, 3, 8, Some((14.6, -90.5)), 20.0),
        ],
        ..FakeSource::default()
    });
    let suggestion = CentroidRecommender::new(source)
        .suggest_location(7, &ZoneParams::hot_zones(now()), &CancelSignal::new())
        .await
        .expect("suggestion succeeds");

    assert_eq!(suggestion.centroid, CentroidOutcome::NoData);
    assert!(suggestion.recommendation().starts_with("Not enough data"));
}

#[tokio::test]
async fn suggestion_combines_centroid_and_hot_zones() {
    let mut orders: Vec<OrderEvent> = (1..=6)
        .map(|i| order(i, i, 50, Some((14.601, -90.511)), 12.5))
        .collect();
    orders.push(order(100, 200, 7, Some((14.60, -90.50)), 30.0));
    orders.push(order(101, 201, 7, Some((14.62, -90.52)), 30.0));

    let source = as_source(FakeSource {
        orders,
        ..FakeSource::default()
    });
    let suggestion = CentroidRecommender::new(source)
        .suggest_location(7, &ZoneParams::hot_zones(now()), &CancelSignal::new())
        .await
        .unwrap();

    let centroid = suggestion.centroid.centroid().expect("centroid");
    assert_eq!(centroid.sample_size, 2);
    assert!((centroid.point.latitude() - 14.61).abs() < 1e-9);
    assert!((centroid.point.longitude() - -90.51).abs() < 1e-9);

    // Hot zones are city-wide: seller 50's cluster shows up for seller 7.
    assert_eq!(suggestion.high_demand_zones.len(), 1);
    assert_eq!(suggestion.high_demand_zones[0].order_count, 6);
    assert_eq!(
        suggestion.high_demand_zones[0].cell.latitude().to_string(),
        "14.60"
    );
}

#[tokio::test]
async fn suggestion_fails_when_source_fails() {
    let source = as_source(FakeSource {
        fail: true,
        ..FakeSource::default()
    });
    let result = CentroidRecommender::new(source)
        .suggest_location(7, &ZoneParams::hot_zones(now()), &CancelSignal::new())
        .await;
    assert!(matches!(result, Err(GeoError::Upstream(_))));
}

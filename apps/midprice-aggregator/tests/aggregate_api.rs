//! HTTP API Integration Tests
//!
//! Exercises the axum router in-process against stub market data
//! sources: the mid-price JSON contract, health reporting, and the
//! readiness probe.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::DateTime;
use midprice_aggregator::infrastructure::http::{ApiServerState, router};
use midprice_aggregator::{ConnectionState, MarketDataSource, Quote, SourceDirectory, VenueId};
use tower::ServiceExt;

// =============================================================================
// Stubs
// =============================================================================

struct StubSource {
    venue: VenueId,
    quote: Quote,
    state: ConnectionState,
}

impl StubSource {
    fn streaming(venue: VenueId, bid: f64, ask: f64) -> Arc<dyn MarketDataSource> {
        Arc::new(Self {
            venue,
            quote: Quote::from_bid_ask(bid, ask, DateTime::UNIX_EPOCH),
            state: ConnectionState::Streaming,
        })
    }

    fn silent(venue: VenueId) -> Arc<dyn MarketDataSource> {
        Arc::new(Self {
            venue,
            quote: Quote::ZERO,
            state: ConnectionState::Reconnecting,
        })
    }
}

impl MarketDataSource for StubSource {
    fn venue(&self) -> VenueId {
        self.venue
    }

    fn current_quote(&self) -> Quote {
        self.quote
    }

    fn connection_state(&self) -> ConnectionState {
        self.state
    }

    fn frames_received(&self) -> u64 {
        0
    }

    fn reconnect_attempts(&self) -> u32 {
        0
    }

    fn shutdown(&self) {}
}

struct StubDirectory(Vec<Arc<dyn MarketDataSource>>);

impl SourceDirectory for StubDirectory {
    fn sources(&self) -> Vec<Arc<dyn MarketDataSource>> {
        self.0.clone()
    }
}

fn app(sources: Vec<Arc<dyn MarketDataSource>>) -> axum::Router {
    let state = Arc::new(ApiServerState::new(
        "test".to_string(),
        Arc::new(StubDirectory(sources)),
    ));
    router(state)
}

async fn get_json(app: axum::Router, uri: &str) -> (StatusCode, serde_json::Value) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let json = serde_json::from_slice(&bytes).unwrap();
    (status, json)
}

// =============================================================================
// /mid-price
// =============================================================================

#[tokio::test]
async fn mid_price_averages_across_venues() {
    let app = app(vec![
        StubSource::streaming(VenueId::Binance, 100.0, 200.0), // mid 150
        StubSource::streaming(VenueId::Huobi, 100.0, 300.0),   // mid 200
        StubSource::streaming(VenueId::Kraken, 100.0, 250.0),  // mid 175
    ]);

    let (status, json) = get_json(app, "/mid-price").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["averagedMidPrice"], "175.00000000");

    let sources = json["midPriceSources"].as_array().unwrap();
    assert_eq!(sources.len(), 3);
    assert_eq!(sources[0]["marketDataSource"], "Binance");
    assert_eq!(sources[0]["midPrice"], 150.0);
    assert_eq!(
        sources[0]["exchangeTimeStamp"],
        "Thu, 01 Jan 1970 00:00:00 GMT"
    );
}

#[tokio::test]
async fn mid_price_excludes_silent_venues() {
    let app = app(vec![
        StubSource::streaming(VenueId::Binance, 100.0, 200.0),
        StubSource::silent(VenueId::Huobi),
        StubSource::silent(VenueId::Kraken),
    ]);

    let (status, json) = get_json(app, "/mid-price").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["averagedMidPrice"], "150.00000000");
    assert_eq!(json["midPriceSources"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn mid_price_with_no_data_reports_nan() {
    let app = app(vec![
        StubSource::silent(VenueId::Binance),
        StubSource::silent(VenueId::Huobi),
        StubSource::silent(VenueId::Kraken),
    ]);

    let (status, json) = get_json(app, "/mid-price").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["success"], true);
    assert_eq!(json["averagedMidPrice"], "NaN");
    assert!(json["midPriceSources"].as_array().unwrap().is_empty());
}

// =============================================================================
// Health and probes
// =============================================================================

#[tokio::test]
async fn health_reports_degraded_when_some_venues_down() {
    let app = app(vec![
        StubSource::streaming(VenueId::Binance, 100.0, 200.0),
        StubSource::silent(VenueId::Huobi),
        StubSource::silent(VenueId::Kraken),
    ]);

    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "degraded");
    let venues = json["venues"].as_array().unwrap();
    assert_eq!(venues.len(), 3);
    assert_eq!(venues[0]["venue"], "Binance");
    assert_eq!(venues[0]["streaming"], true);
    assert_eq!(venues[1]["state"], "reconnecting");
}

#[tokio::test]
async fn health_is_unavailable_with_no_streaming_venues() {
    let app = app(vec![
        StubSource::silent(VenueId::Binance),
        StubSource::silent(VenueId::Huobi),
    ]);

    let (status, json) = get_json(app, "/health").await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(json["status"], "unhealthy");
}

#[tokio::test]
async fn liveness_is_always_ok() {
    let app = app(vec![]);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/healthz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn readiness_requires_one_streaming_venue() {
    let not_ready = app(vec![StubSource::silent(VenueId::Binance)]);
    let response = not_ready
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

    let ready = app(vec![
        StubSource::silent(VenueId::Binance),
        StubSource::streaming(VenueId::Kraken, 100.0, 250.0),
    ]);
    let response = ready
        .oneshot(
            Request::builder()
                .uri("/readyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode},
};
use chrono::{DateTime, Utc};
use serde_json::Value;
use tower::ServiceExt;

use backend::api::{ApiState, create_api_router};
use engine::{AnomalyEngine, EngineConfig, MarketEvent, Trade};

// -----------------------
// helpers
// -----------------------

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(secs, 0).unwrap()
}

fn trade(sym: &str, secs: i64, price: f64) -> MarketEvent {
    MarketEvent::trade(
        sym,
        ts(secs),
        Trade {
            price,
            size: 10.0,
            ..Default::default()
        },
    )
}

/// Engine with two symbols and one price anomaly on AAPL.
fn seeded_engine() -> Arc<AnomalyEngine> {
    let engine = AnomalyEngine::new(EngineConfig::default()).unwrap();

    let baseline: Vec<_> = (0..20)
        .map(|i| trade("AAPL", i, if i % 2 == 0 { 99.0 } else { 101.0 }))
        .collect();
    engine.ingest(&baseline);
    engine.ingest(&[trade("MSFT", 0, 410.0)]);
    let raised = engine.ingest(&[trade("AAPL", 100, 105.0)]);
    assert_eq!(raised.len(), 1);

    Arc::new(engine)
}

fn app(engine: Arc<AnomalyEngine>) -> Router {
    create_api_router(ApiState::new(engine))
}

async fn get(app: Router, uri: &str) -> (StatusCode, Value) {
    let res = app
        .oneshot(Request::get(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();

    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

// -----------------------
// routes
// -----------------------

#[tokio::test]
async fn health_reports_counters() {
    let (status, body) = get(app(seeded_engine()), "/api/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["ok"], true);
    assert_eq!(body["counters"]["batches"], 3);
    assert_eq!(body["counters"]["events"], 22);
    assert_eq!(body["counters"]["anomalies"], 1);
    assert_eq!(body["counters"]["sink_panics"], 0);
}

#[tokio::test]
async fn symbols_are_sorted() {
    let (status, body) = get(app(seeded_engine()), "/api/symbols").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, serde_json::json!(["AAPL", "MSFT"]));
}

#[tokio::test]
async fn anomalies_expose_structured_fields() {
    let (status, body) = get(app(seeded_engine()), "/api/anomalies").await;

    assert_eq!(status, StatusCode::OK);
    let items = body.as_array().unwrap();
    assert_eq!(items.len(), 1);

    let a = &items[0];
    assert_eq!(a["type"], "price");
    assert_eq!(a["source"], "trade");
    assert_eq!(a["direction"], "up");
    assert_eq!(a["symbol"], "AAPL");
    assert_eq!(a["value"], 105.0);
    assert_eq!(a["k"], 2.0);
    assert!(a["zscore"].as_f64().unwrap() > 2.0);
    assert!(a["timestamp"].as_str().unwrap().starts_with("1970-01-01T00:01:40"));
    assert!(a["note"].as_str().unwrap().contains("Upward price anomaly"));
}

#[tokio::test]
async fn anomalies_respect_limit() {
    let engine = seeded_engine();
    engine.ingest(&[trade("AAPL", 101, 105.0)]);

    let (_, all) = get(app(engine.clone()), "/api/anomalies").await;
    let (_, one) = get(app(engine.clone()), "/api/anomalies?limit=1").await;
    let (_, none) = get(app(engine), "/api/anomalies?limit=0").await;

    assert_eq!(all.as_array().unwrap().len(), 2);
    assert_eq!(one.as_array().unwrap().len(), 1);
    // newest last: the single item is the latest anomaly
    assert_eq!(one[0], all[1]);
    assert!(none.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn invalid_limit_is_a_client_error() {
    let res = app(seeded_engine())
        .oneshot(
            Request::get("/api/anomalies?limit=lots")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn symbol_stats_for_known_symbol() {
    let (status, body) = get(app(seeded_engine()), "/api/symbols/AAPL/stats").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["events_seen"], 21);
    assert_eq!(body["price"]["samples"], 21);
    assert_eq!(body["price"]["capacity"], 200);
    assert_eq!(body["price"]["latest"], 105.0);
    assert_eq!(body["spread"]["samples"], 0);
    assert!(body["last_quote_ts"].is_null());
}

#[tokio::test]
async fn unknown_symbol_is_404() {
    let (status, body) = get(app(seeded_engine()), "/api/symbols/TSLA/stats").await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
    assert!(body["message"].as_str().unwrap().contains("TSLA"));
}

#[tokio::test]
async fn empty_engine_serves_empty_lists() {
    let engine = Arc::new(AnomalyEngine::new(EngineConfig::default()).unwrap());

    let (_, symbols) = get(app(engine.clone()), "/api/symbols").await;
    let (_, anomalies) = get(app(engine), "/api/anomalies").await;

    assert_eq!(symbols, serde_json::json!([]));
    assert_eq!(anomalies, serde_json::json!([]));
}

#[tokio::test]
async fn cors_allows_any_origin() {
    let res = app(seeded_engine())
        .oneshot(
            Request::get("/api/symbols")
                .header("origin", "http://localhost:5173")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        res.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}

//! Read-only HTTP surface over the anomaly engine.
//!
//! - `GET /api/health` - liveness plus engine counters
//! - `GET /api/symbols` - tracked symbols, sorted
//! - `GET /api/anomalies?limit=N` - recent anomalies, newest last
//! - `GET /api/symbols/{symbol}/stats` - rolling baselines of one symbol

use std::future::Future;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::Method,
    routing::get,
};
use engine::{Anomaly, AnomalyEngine, CountersSnapshot, SymbolStats};
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tracing::info;

use crate::error::AppError;

/// Shared state for API handlers.
#[derive(Clone)]
pub struct ApiState {
    pub engine: Arc<AnomalyEngine>,
}

impl ApiState {
    pub fn new(engine: Arc<AnomalyEngine>) -> Self {
        Self { engine }
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub ok: bool,
    pub counters: CountersSnapshot,
}

#[derive(Debug, Default, Deserialize)]
pub struct AnomalyQuery {
    /// Maximum number of anomalies; the whole history when absent.
    pub limit: Option<usize>,
}

async fn health(State(state): State<ApiState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        ok: true,
        counters: state.engine.counters(),
    })
}

async fn list_symbols(State(state): State<ApiState>) -> Json<Vec<String>> {
    Json(state.engine.symbols())
}

async fn list_anomalies(
    State(state): State<ApiState>,
    Query(query): Query<AnomalyQuery>,
) -> Json<Vec<Anomaly>> {
    Json(state.engine.recent_anomalies(query.limit))
}

async fn symbol_stats(
    State(state): State<ApiState>,
    Path(symbol): Path<String>,
) -> Result<Json<SymbolStats>, AppError> {
    state
        .engine
        .symbol_stats(&symbol)
        .map(Json)
        .ok_or(AppError::UnknownSymbol(symbol))
}

/// Create the API router with all endpoints and a permissive CORS policy.
pub fn create_api_router(state: ApiState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET])
        .allow_headers(Any);

    Router::new()
        .route("/api/health", get(health))
        .route("/api/symbols", get(list_symbols))
        .route("/api/anomalies", get(list_anomalies))
        .route("/api/symbols/{symbol}/stats", get(symbol_stats))
        .with_state(state)
        .layer(cors)
}

/// Serve the API on `addr` until `shutdown` resolves.
pub async fn run_api_server(
    addr: SocketAddr,
    engine: Arc<AnomalyEngine>,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    let app = create_api_router(ApiState::new(engine));

    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!(addr = %listener.local_addr()?, "HTTP API server started");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await?;

    info!("HTTP API server stopped");
    Ok(())
}

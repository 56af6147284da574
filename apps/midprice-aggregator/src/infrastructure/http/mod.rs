//! HTTP API Server
//!
//! The service's read surface: the aggregated mid-price plus health
//! checks and Prometheus metrics, served from one axum router. Used by
//! API consumers, container orchestrators, and monitoring systems.
//!
//! # Endpoints
//!
//! - `GET /mid-price` - Aggregated mid-price across all venues (JSON)
//! - `GET /health` - Detailed JSON health status
//! - `GET /healthz` - Kubernetes liveness probe (simple OK)
//! - `GET /readyz` - Kubernetes readiness probe (checks venue streams)
//! - `GET /metrics` - Prometheus metrics in text format

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;

use axum::{Json, Router, extract::State, http::StatusCode, response::IntoResponse, routing::get};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{MarketDataSource, SourceDirectory};
use crate::application::services::Aggregator;
use crate::domain::connection::ConnectionState;
use crate::infrastructure::metrics::{get_metrics_handle, record_aggregate_read};

// =============================================================================
// Health Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Overall status: "healthy", "degraded", or "unhealthy".
    pub status: HealthStatus,
    /// Service version.
    pub version: String,
    /// Server uptime in seconds.
    pub uptime_secs: u64,
    /// Current time.
    pub current_time: DateTime<Utc>,
    /// Per-venue connection status, in registration order.
    pub venues: Vec<VenueInfo>,
}

/// Overall health status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// Every venue is streaming.
    Healthy,
    /// Some venues streaming, some not.
    Degraded,
    /// No venue is streaming.
    Unhealthy,
}

/// Individual venue connection status.
#[derive(Debug, Clone, Serialize)]
pub struct VenueInfo {
    /// Venue name.
    pub venue: String,
    /// Connection lifecycle state.
    pub state: String,
    /// Whether this venue is currently streaming.
    pub streaming: bool,
    /// Frames received count.
    pub frames_received: u64,
    /// Reconnection attempts since startup.
    pub reconnect_attempts: u32,
}

// =============================================================================
// API Server State
// =============================================================================

/// Shared state for the API server.
pub struct ApiServerState {
    version: String,
    started_at: Instant,
    directory: Arc<dyn SourceDirectory>,
    aggregator: Aggregator,
}

impl ApiServerState {
    /// Create new API server state.
    #[must_use]
    pub fn new(version: String, directory: Arc<dyn SourceDirectory>) -> Self {
        let aggregator = Aggregator::new(Arc::clone(&directory));
        Self {
            version,
            started_at: Instant::now(),
            directory,
            aggregator,
        }
    }
}

// =============================================================================
// API Server
// =============================================================================

/// The HTTP API server.
pub struct ApiServer {
    port: u16,
    state: Arc<ApiServerState>,
    cancel: CancellationToken,
}

impl ApiServer {
    /// Create a new API server.
    #[must_use]
    pub const fn new(port: u16, state: Arc<ApiServerState>, cancel: CancellationToken) -> Self {
        Self {
            port,
            state,
            cancel,
        }
    }

    /// Run the API server until cancelled.
    ///
    /// # Errors
    ///
    /// Returns `ApiServerError` if binding fails or the HTTP server
    /// encounters a fatal error while running.
    pub async fn run(self) -> Result<(), ApiServerError> {
        let app = router(self.state);

        let addr = SocketAddr::from(([0, 0, 0, 0], self.port));
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|e| ApiServerError::BindFailed(self.port, e.to_string()))?;

        tracing::info!(port = self.port, "API server listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(self.cancel.cancelled_owned())
            .await
            .map_err(|e| ApiServerError::ServerFailed(e.to_string()))?;

        tracing::info!("API server stopped");
        Ok(())
    }
}

/// Build the API router over the given state.
pub fn router(state: Arc<ApiServerState>) -> Router {
    Router::new()
        .route("/mid-price", get(mid_price_handler))
        .route("/health", get(health_handler))
        .route("/healthz", get(liveness_handler))
        .route("/readyz", get(readiness_handler))
        .route("/metrics", get(metrics_handler))
        .with_state(state)
}

// =============================================================================
// HTTP Handlers
// =============================================================================

async fn mid_price_handler(State(state): State<Arc<ApiServerState>>) -> impl IntoResponse {
    record_aggregate_read();
    let result = state.aggregator.compute_aggregate();
    (StatusCode::OK, Json(result))
}

async fn health_handler(State(state): State<Arc<ApiServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);
    let status_code = match response.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status_code, Json(response))
}

async fn liveness_handler() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

async fn readiness_handler(State(state): State<Arc<ApiServerState>>) -> impl IntoResponse {
    let response = build_health_response(&state);

    // Ready if at least one venue is streaming
    let is_ready = response.venues.iter().any(|v| v.streaming);

    if is_ready {
        (StatusCode::OK, "READY")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "NOT READY")
    }
}

async fn metrics_handler() -> impl IntoResponse {
    get_metrics_handle().map_or_else(
        || {
            (
                StatusCode::SERVICE_UNAVAILABLE,
                [("content-type", "text/plain")],
                "Metrics not initialized".to_string(),
            )
        },
        |handle| {
            let body = handle.render();
            (
                StatusCode::OK,
                [("content-type", "text/plain; version=0.0.4; charset=utf-8")],
                body,
            )
        },
    )
}

fn build_health_response(state: &ApiServerState) -> HealthResponse {
    let venues: Vec<VenueInfo> = state
        .directory
        .sources()
        .iter()
        .map(|source| source_to_info(source.as_ref()))
        .collect();

    let status = determine_health_status(&venues);

    HealthResponse {
        status,
        version: state.version.clone(),
        uptime_secs: state.started_at.elapsed().as_secs(),
        current_time: Utc::now(),
        venues,
    }
}

fn source_to_info(source: &dyn MarketDataSource) -> VenueInfo {
    let connection_state = source.connection_state();

    VenueInfo {
        venue: source.venue().as_str().to_string(),
        state: connection_state.as_str().to_string(),
        streaming: connection_state == ConnectionState::Streaming,
        frames_received: source.frames_received(),
        reconnect_attempts: source.reconnect_attempts(),
    }
}

fn determine_health_status(venues: &[VenueInfo]) -> HealthStatus {
    let streaming_count = venues.iter().filter(|v| v.streaming).count();

    if venues.is_empty() || streaming_count == 0 {
        HealthStatus::Unhealthy
    } else if streaming_count == venues.len() {
        HealthStatus::Healthy
    } else {
        HealthStatus::Degraded
    }
}

// =============================================================================
// Errors
// =============================================================================

/// API server errors.
#[derive(Debug, thiserror::Error)]
pub enum ApiServerError {
    /// Failed to bind to port.
    #[error("failed to bind to port {0}: {1}")]
    BindFailed(u16, String),

    /// Server error.
    #[error("server error: {0}")]
    ServerFailed(String),
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn health_status_serialization() {
        assert_eq!(
            serde_json::to_string(&HealthStatus::Healthy).unwrap(),
            "\"healthy\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Degraded).unwrap(),
            "\"degraded\""
        );
        assert_eq!(
            serde_json::to_string(&HealthStatus::Unhealthy).unwrap(),
            "\"unhealthy\""
        );
    }

    fn info(venue: &str, streaming: bool) -> VenueInfo {
        VenueInfo {
            venue: venue.to_string(),
            state: if streaming { "streaming" } else { "reconnecting" }.to_string(),
            streaming,
            frames_received: 0,
            reconnect_attempts: 0,
        }
    }

    #[test]
    fn all_streaming_is_healthy() {
        let venues = vec![info("Binance", true), info("Huobi", true), info("Kraken", true)];
        assert_eq!(determine_health_status(&venues), HealthStatus::Healthy);
    }

    #[test]
    fn partial_streaming_is_degraded() {
        let venues = vec![info("Binance", true), info("Huobi", false), info("Kraken", false)];
        assert_eq!(determine_health_status(&venues), HealthStatus::Degraded);
    }

    #[test]
    fn none_streaming_is_unhealthy() {
        let venues = vec![info("Binance", false), info("Huobi", false)];
        assert_eq!(determine_health_status(&venues), HealthStatus::Unhealthy);
    }

    #[test]
    fn no_venues_is_unhealthy() {
        assert_eq!(determine_health_status(&[]), HealthStatus::Unhealthy);
    }
}

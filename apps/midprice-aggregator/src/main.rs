//! Mid-Price Aggregator Binary
//!
//! Starts the cross-venue mid-price aggregation service.
//!
//! # Usage
//!
//! ```bash
//! cargo run --bin midprice-aggregator
//! ```
//!
//! # Environment Variables
//!
//! All optional:
//! - `MIDPRICE_HTTP_PORT`: API server port (default: 3000)
//! - `MIDPRICE_RECONNECT_DELAY_INITIAL_MS`: Backoff floor (default: 1000)
//! - `MIDPRICE_RECONNECT_DELAY_MAX_SECS`: Backoff ceiling (default: 60)
//! - `MIDPRICE_BINANCE_WS_URL`: Binance stream URL override
//! - `MIDPRICE_HUOBI_WS_URL`: Huobi stream URL override
//! - `MIDPRICE_KRAKEN_WS_URL`: Kraken stream URL override
//! - `OTEL_ENABLED`: Enable OpenTelemetry (default: true)
//! - `OTEL_EXPORTER_OTLP_ENDPOINT`: OTLP endpoint (default: <http://localhost:4318>)
//! - `OTEL_SERVICE_NAME`: Service name (default: midprice-aggregator)
//! - `RUST_LOG`: Log level (default: info)

use std::sync::Arc;

use midprice_aggregator::infrastructure::telemetry;
use midprice_aggregator::{
    ApiServer, ApiServerState, ServiceConfig, VenueId, VenueRegistry, init_metrics,
};
use tokio::signal;
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    rustls::crypto::ring::default_provider()
        .install_default()
        .expect("Failed to install rustls crypto provider");

    load_dotenv();

    // Initialize telemetry (OpenTelemetry + tracing)
    let _telemetry_guard = telemetry::init();

    tracing::info!("Starting Mid-Price Aggregator");

    // Initialize Prometheus metrics
    let _metrics_handle = init_metrics();

    let config = ServiceConfig::from_env();
    log_config(&config);

    let shutdown_token = CancellationToken::new();

    // Start one client per venue; the registry spawns each connection
    // loop and enforces singleton-per-venue.
    let registry = Arc::new(VenueRegistry::new(shutdown_token.clone()));
    for venue in VenueId::ALL {
        registry.get_or_create(venue, &config);
    }

    // Start the API server
    let api_state = Arc::new(ApiServerState::new(
        env!("CARGO_PKG_VERSION").to_string(),
        Arc::clone(&registry) as Arc<dyn midprice_aggregator::SourceDirectory>,
    ));
    let api_server = ApiServer::new(
        config.server.http_port,
        api_state,
        shutdown_token.clone(),
    );

    let api_shutdown = shutdown_token.clone();
    tokio::spawn(async move {
        if let Err(e) = api_server.run().await {
            tracing::error!(error = %e, "API server error");
            api_shutdown.cancel();
        }
    });

    tracing::info!("Mid-price aggregator ready");

    await_shutdown(shutdown_token).await;

    registry.shutdown_all();

    tracing::info!("Mid-price aggregator stopped");
    Ok(())
}

/// Load .env file from current or ancestor directories.
fn load_dotenv() {
    if dotenvy::dotenv().is_err() {
        load_dotenv_from_ancestors();
    }
}

/// Log the parsed configuration.
fn log_config(config: &ServiceConfig) {
    tracing::info!(
        http_port = config.server.http_port,
        reconnect_delay_initial_ms = config.reconnect.delay_initial.as_millis(),
        reconnect_delay_max_secs = config.reconnect.delay_max.as_secs(),
        "Configuration loaded"
    );
    tracing::debug!(
        binance_url = %config.endpoints.binance_url,
        huobi_url = %config.endpoints.huobi_url,
        kraken_url = %config.endpoints.kraken_url,
        "WebSocket endpoints"
    );
}

/// Load .env file from current directory or any ancestor directory.
fn load_dotenv_from_ancestors() {
    if dotenvy::dotenv().is_ok() {
        return;
    }

    if let Ok(cwd) = std::env::current_dir() {
        let mut dir = cwd.as_path();
        while let Some(parent) = dir.parent() {
            let env_path = parent.join(".env");
            if env_path.exists() {
                let _ = dotenvy::from_path(&env_path);
                return;
            }
            dir = parent;
        }
    }
}

/// Wait for shutdown signal (SIGTERM, SIGINT, or internal fatal error).
#[allow(clippy::expect_used)]
async fn await_shutdown(shutdown_token: CancellationToken) {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("signal handler installation is critical for graceful shutdown");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("SIGTERM handler installation is critical for graceful shutdown")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {
            tracing::info!("Received Ctrl+C, initiating shutdown");
        }
        () = terminate => {
            tracing::info!("Received SIGTERM, initiating shutdown");
        }
        () = shutdown_token.cancelled() => {
            tracing::error!("Internal fatal error, initiating shutdown");
        }
    }

    shutdown_token.cancel();

    tracing::info!("Graceful shutdown started");
}

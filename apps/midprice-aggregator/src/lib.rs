#![cfg_attr(
    test,
    allow(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::float_cmp,
        clippy::too_many_lines,
        clippy::needless_pass_by_value,
        clippy::default_trait_access,
        clippy::items_after_statements
    )
)]

//! Mid-Price Aggregator - Cross-Venue Price Averaging Service
//!
//! Maintains one persistent WebSocket connection per crypto venue
//! (Binance, Huobi, Kraken), tracks each venue's best bid/ask in
//! memory, and serves the averaged mid-price across all venues over
//! HTTP on demand.
//!
//! # Layers (inside → outside)
//!
//! - **Domain**: Core quote and lifecycle types
//!   - `quote`: Venue identity, quote snapshots, the per-venue store
//!   - `connection`: Connection lifecycle state machine and tracker
//!   - `aggregate`: Aggregate result shape and averaging math
//!
//! - **Application**: Use cases and port definitions
//!   - `ports`: Market data source and source directory interfaces
//!   - `services`: Cross-venue aggregation
//!
//! - **Infrastructure**: Adapters and external integrations
//!   - `venues`: WebSocket clients for Binance, Huobi, Kraken
//!   - `registry`: Singleton-per-venue client registry
//!   - `http`: HTTP API server (mid-price, health, metrics)
//!   - `config`: Environment-driven configuration
//!   - `telemetry`: OpenTelemetry tracing integration
//!
//! # Data Flow
//!
//! ```text
//! Binance WS ──┐
//!              │     ┌─────────────┐     ┌─────────────┐
//!              ├────►│ Quote Store │────►│ Aggregator  │──► GET /mid-price
//! Huobi WS   ──┤     │ (per venue) │     │  (average)  │
//!              │     └─────────────┘     └─────────────┘
//! Kraken WS  ──┘
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::pedantic)]

// =============================================================================
// Module Declarations
// =============================================================================

/// Domain layer - Core quote and lifecycle types with no external dependencies.
pub mod domain;

/// Application layer - Use cases and port definitions.
pub mod application;

/// Infrastructure layer - Adapters and external integrations.
pub mod infrastructure;

// =============================================================================
// Re-exports
// =============================================================================

// Domain types
pub use domain::aggregate::{AggregateResult, MidPriceSource};
pub use domain::connection::{ConnectionState, VenueConnectionState};
pub use domain::quote::{Quote, QuoteStore, VenueId};

// Application services and ports
pub use application::ports::{MarketDataSource, SourceDirectory};
pub use application::services::aggregator::Aggregator;

// Infrastructure config
pub use infrastructure::config::{
    ReconnectSettings, ServerSettings, ServiceConfig, VenueEndpoints,
};

// API server
pub use infrastructure::http::{ApiServer, ApiServerError, ApiServerState};

// Venue registry
pub use infrastructure::registry::VenueRegistry;

// Metrics
pub use infrastructure::metrics::init_metrics;

// Telemetry
pub use infrastructure::telemetry::{TelemetryConfig, TelemetryGuard, init as init_telemetry};

//! Prometheus Metrics Module
//!
//! Exposes application metrics via Prometheus format for monitoring.
//!
//! # Metrics Categories
//!
//! - **Frames**: counts of frames received and dropped per venue
//! - **Connections**: per-venue connected gauge and reconnect counts
//! - **Aggregation**: mid-price reads served
//!
//! # Integration
//!
//! Metrics are exposed at `GET /metrics` on the API server port.

use std::sync::OnceLock;

use metrics::{counter, describe_counter, describe_gauge, gauge};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

use crate::domain::quote::VenueId;

// =============================================================================
// Global Metrics Handle
// =============================================================================

static PROMETHEUS_HANDLE: OnceLock<PrometheusHandle> = OnceLock::new();

/// Initialize the Prometheus metrics recorder.
///
/// # Panics
///
/// Panics if the recorder cannot be installed.
#[allow(clippy::expect_used)]
pub fn init_metrics() -> PrometheusHandle {
    PROMETHEUS_HANDLE
        .get_or_init(|| {
            let builder = PrometheusBuilder::new();
            let handle = builder
                .install_recorder()
                .expect("failed to install Prometheus recorder");

            register_metrics();
            handle
        })
        .clone()
}

/// Get the Prometheus handle for rendering metrics.
///
/// Returns `None` if metrics have not been initialized.
#[must_use]
pub fn get_metrics_handle() -> Option<PrometheusHandle> {
    PROMETHEUS_HANDLE.get().cloned()
}

// =============================================================================
// Metric Registration
// =============================================================================

fn register_metrics() {
    describe_counter!(
        "midprice_frames_received_total",
        "Total WebSocket frames received, by venue"
    );
    describe_counter!(
        "midprice_frames_dropped_total",
        "Total malformed or undecodable frames dropped, by venue"
    );
    describe_counter!(
        "midprice_reconnects_total",
        "Total reconnection attempts, by venue"
    );
    describe_counter!(
        "midprice_aggregate_reads_total",
        "Total aggregate mid-price reads served"
    );
    describe_gauge!(
        "midprice_venue_connected",
        "Whether the venue connection is currently streaming (1) or not (0)"
    );
}

// =============================================================================
// Recording Helpers
// =============================================================================

/// Count one received frame for a venue.
pub fn record_frame_received(venue: VenueId) {
    counter!("midprice_frames_received_total", "venue" => venue.as_str()).increment(1);
}

/// Count one dropped (malformed) frame for a venue.
pub fn record_frame_dropped(venue: VenueId) {
    counter!("midprice_frames_dropped_total", "venue" => venue.as_str()).increment(1);
}

/// Count one reconnection attempt for a venue.
pub fn record_reconnect(venue: VenueId) {
    counter!("midprice_reconnects_total", "venue" => venue.as_str()).increment(1);
}

/// Record whether a venue is currently streaming.
pub fn set_venue_connected(venue: VenueId, connected: bool) {
    let value = if connected { 1.0 } else { 0.0 };
    gauge!("midprice_venue_connected", "venue" => venue.as_str()).set(value);
}

/// Count one served aggregate read.
pub fn record_aggregate_read() {
    counter!("midprice_aggregate_reads_total").increment(1);
}

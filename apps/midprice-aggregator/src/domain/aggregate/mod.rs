//! Aggregate Result Types
//!
//! The consumer-facing shape of a cross-venue mid-price read, plus the
//! averaging and formatting rules. Field names are a fixed external
//! contract (the JSON served on `GET /mid-price`), so serde renames are
//! explicit rather than relying on a container attribute.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::domain::quote::{Quote, VenueId};

/// Decimal digits used when formatting the averaged mid-price.
const AVERAGE_PRECISION: usize = 8;

// =============================================================================
// Result Types
// =============================================================================

/// One venue's contribution to an aggregate read.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MidPriceSource {
    /// The venue's current mid-price.
    #[serde(rename = "midPrice")]
    pub mid_price: f64,
    /// Venue display name.
    #[serde(rename = "marketDataSource")]
    pub market_data_source: String,
    /// Display-formatted time of the venue's last update.
    #[serde(rename = "exchangeTimeStamp")]
    pub exchange_time_stamp: String,
}

impl MidPriceSource {
    /// Build a source entry from a venue's quote snapshot.
    #[must_use]
    pub fn from_quote(venue: VenueId, quote: &Quote) -> Self {
        Self {
            mid_price: quote.mid_price,
            market_data_source: venue.as_str().to_string(),
            exchange_time_stamp: utc_display(quote.last_update),
        }
    }
}

/// A read-only snapshot of the cross-venue average.
///
/// Recomputed fresh on every request; never cached. When no venue has
/// ever produced data the average is the non-finite sentinel (`"NaN"`)
/// and `success` stays `true` - insufficient venues is a degraded but
/// structurally valid result, not an error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggregateResult {
    /// Per-venue snapshots that participated in the average, in
    /// registration order.
    #[serde(rename = "midPriceSources")]
    pub mid_price_sources: Vec<MidPriceSource>,
    /// Whether the enumeration itself succeeded.
    pub success: bool,
    /// The averaged mid-price, formatted to 8 decimal digits.
    #[serde(rename = "averagedMidPrice")]
    pub averaged_mid_price: String,
}

// =============================================================================
// Averaging and Formatting
// =============================================================================

/// Arithmetic mean of the given mid-prices.
///
/// Returns `f64::NAN` for an empty slice: with zero participating
/// venues the average is mathematically undefined, and callers must
/// treat a non-finite value as "insufficient venues available".
#[must_use]
pub fn average_mid(mids: &[f64]) -> f64 {
    if mids.is_empty() {
        return f64::NAN;
    }
    #[allow(clippy::cast_precision_loss)]
    let count = mids.len() as f64;
    mids.iter().sum::<f64>() / count
}

/// Format a mid-price to the fixed 8-decimal display contract.
///
/// Non-finite inputs render as `"NaN"` / `"inf"`, which callers use as
/// the explicit "no usable price" marker.
#[must_use]
pub fn format_average(value: f64) -> String {
    format!("{value:.prec$}", prec = AVERAGE_PRECISION)
}

/// Format a timestamp the way the consumer contract expects
/// (`Thu, 01 Jan 1970 00:00:00 GMT`).
#[must_use]
pub fn utc_display(timestamp: DateTime<Utc>) -> String {
    timestamp.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

// =============================================================================
// Tests
// =============================================================================

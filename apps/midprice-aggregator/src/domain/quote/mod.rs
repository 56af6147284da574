//! Quote Types
//!
//! The per-venue quote snapshot and the store that holds the latest one.
//!
//! Each venue client owns exactly one [`QuoteStore`] and is its only
//! writer (the decode path). Any number of readers (the aggregator, the
//! health endpoint) take consistent snapshots concurrently.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;

// =============================================================================
// Venue Identity
// =============================================================================

/// Identifies a streaming price venue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VenueId {
    /// Binance spot (bookTicker stream).
    Binance,
    /// Huobi spot (BBO channel, gzip-framed).
    Huobi,
    /// Kraken spot (v2 ticker channel).
    Kraken,
}

impl VenueId {
    /// All known venues, in registration (and aggregation) order.
    pub const ALL: [Self; 3] = [Self::Binance, Self::Huobi, Self::Kraken];

    /// Venue display name, as reported in aggregate results.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Binance => "Binance",
            Self::Huobi => "Huobi",
            Self::Kraken => "Kraken",
        }
    }
}

impl std::fmt::Display for VenueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Quote
// =============================================================================

/// Latest decoded top-of-book state for one venue.
///
/// The all-zero value (see [`Quote::ZERO`]) is a sentinel meaning "this
/// venue has never produced a real quote"; it is excluded from
/// aggregation so it cannot bias the mean toward zero.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quote {
    /// Best bid price in the venue's native units.
    pub best_bid: f64,
    /// Best ask price in the venue's native units.
    pub best_ask: f64,
    /// Arithmetic mean of best bid and best ask.
    pub mid_price: f64,
    /// When the quote was decoded (venue-supplied when the protocol
    /// provides one, otherwise local receive time).
    pub last_update: DateTime<Utc>,
}

impl Quote {
    /// The "no data yet" sentinel.
    pub const ZERO: Self = Self {
        best_bid: 0.0,
        best_ask: 0.0,
        mid_price: 0.0,
        last_update: DateTime::UNIX_EPOCH,
    };

    /// Build a quote from a decoded bid/ask pair, deriving the mid.
    #[must_use]
    pub fn from_bid_ask(best_bid: f64, best_ask: f64, last_update: DateTime<Utc>) -> Self {
        Self {
            best_bid,
            best_ask,
            mid_price: (best_bid + best_ask) / 2.0,
            last_update,
        }
    }

    /// Whether this venue has ever produced a real quote.
    #[must_use]
    pub fn is_participating(&self) -> bool {
        self.mid_price != 0.0
    }
}

impl Default for Quote {
    fn default() -> Self {
        Self::ZERO
    }
}

// =============================================================================
// Quote Store
// =============================================================================

/// Holds the latest [`Quote`] for one venue.
///
/// Single writer (the owning venue client's decode path), many readers.
/// Writes replace the whole snapshot under the lock so a reader never
/// observes a half-updated bid/ask/mid triple.
#[derive(Debug, Default)]
pub struct QuoteStore {
    current: RwLock<Quote>,
}

impl QuoteStore {
    /// Create a store holding the zero sentinel.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a decoded bid/ask pair as one atomic update.
    pub fn record(&self, best_bid: f64, best_ask: f64, timestamp: DateTime<Utc>) {
        *self.current.write() = Quote::from_bid_ask(best_bid, best_ask, timestamp);
    }

    /// Take a consistent snapshot of the latest quote. Non-blocking in
    /// practice: writers hold the lock only for a struct copy.
    #[must_use]
    pub fn snapshot(&self) -> Quote {
        *self.current.read()
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_sentinel_is_not_participating() {
        assert!(!Quote::ZERO.is_participating());
        assert_eq!(Quote::ZERO.best_bid, 0.0);
        assert_eq!(Quote::ZERO.best_ask, 0.0);
        assert_eq!(Quote::ZERO.last_update, DateTime::UNIX_EPOCH);
    }

    #[test]
    fn mid_is_arithmetic_mean_of_bid_and_ask() {
        let quote = Quote::from_bid_ask(100.0, 200.0, Utc::now());
        assert_eq!(quote.mid_price, 150.0);

        let quote = Quote::from_bid_ask(0.1, 0.3, Utc::now());
        assert_eq!(quote.mid_price, (0.1 + 0.3) / 2.0);
    }

    #[test]
    fn store_starts_at_zero_sentinel() {
        let store = QuoteStore::new();
        assert_eq!(store.snapshot(), Quote::ZERO);
    }

    #[test]
    fn record_replaces_whole_snapshot() {
        let store = QuoteStore::new();
        let ts = Utc::now();

        store.record(100.0, 200.0, ts);
        let quote = store.snapshot();
        assert_eq!(quote.best_bid, 100.0);
        assert_eq!(quote.best_ask, 200.0);
        assert_eq!(quote.mid_price, 150.0);
        assert_eq!(quote.last_update, ts);

        store.record(110.0, 210.0, ts);
        assert_eq!(store.snapshot().mid_price, 160.0);
    }

    #[test]
    fn venue_names() {
        assert_eq!(VenueId::Binance.as_str(), "Binance");
        assert_eq!(VenueId::Huobi.as_str(), "Huobi");
        assert_eq!(VenueId::Kraken.as_str(), "Kraken");
        assert_eq!(VenueId::ALL.len(), 3);
    }
}

//! Cross-Venue Aggregation
//!
//! Computes the averaged mid-price across every currently registered
//! venue. Pure and synchronous: it only reads in-memory quote
//! snapshots the venue clients already maintain, never performing I/O
//! and never blocking on the network.

use std::sync::Arc;

use crate::application::ports::{MarketDataSource, SourceDirectory};
use crate::domain::aggregate::{AggregateResult, MidPriceSource, average_mid, format_average};

/// Aggregates mid-prices across all registered venues.
pub struct Aggregator {
    directory: Arc<dyn SourceDirectory>,
}

impl Aggregator {
    /// Create an aggregator over the given source directory.
    #[must_use]
    pub fn new(directory: Arc<dyn SourceDirectory>) -> Self {
        Self { directory }
    }

    /// Compute a fresh aggregate snapshot.
    ///
    /// Venues still at the zero sentinel are excluded so they cannot
    /// bias the mean toward zero. With no participating venues the
    /// average is the non-finite sentinel and the source list is
    /// empty; `success` remains `true` because the enumeration itself
    /// succeeded.
    #[must_use]
    pub fn compute_aggregate(&self) -> AggregateResult {
        compute_over(&self.directory.sources())
    }
}

/// Aggregate over an explicit source list, in order.
#[must_use]
pub fn compute_over(sources: &[Arc<dyn MarketDataSource>]) -> AggregateResult {
    let mut included = Vec::with_capacity(sources.len());

    for source in sources {
        let quote = source.current_quote();
        if quote.is_participating() {
            included.push(MidPriceSource::from_quote(source.venue(), &quote));
        }
    }

    let mids: Vec<f64> = included.iter().map(|s| s.mid_price).collect();
    let average = average_mid(&mids);

    AggregateResult {
        mid_price_sources: included,
        success: true,
        averaged_mid_price: format_average(average),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockMarketDataSource;
    use crate::domain::connection::ConnectionState;
    use crate::domain::quote::{Quote, VenueId};
    use chrono::Utc;

    fn source_with_mid(venue: VenueId, bid: f64, ask: f64) -> Arc<dyn MarketDataSource> {
        let mut mock = MockMarketDataSource::new();
        let quote = Quote::from_bid_ask(bid, ask, Utc::now());
        mock.expect_venue().return_const(venue);
        mock.expect_current_quote().return_const(quote);
        mock.expect_connection_state()
            .return_const(ConnectionState::Streaming);
        Arc::new(mock)
    }

    fn silent_source(venue: VenueId) -> Arc<dyn MarketDataSource> {
        let mut mock = MockMarketDataSource::new();
        mock.expect_venue().return_const(venue);
        mock.expect_current_quote().return_const(Quote::ZERO);
        mock.expect_connection_state()
            .return_const(ConnectionState::Connecting);
        Arc::new(mock)
    }

    #[test]
    fn averages_all_participating_venues() {
        let sources = vec![
            source_with_mid(VenueId::Binance, 100.0, 200.0), // mid 150
            source_with_mid(VenueId::Huobi, 100.0, 300.0),   // mid 200
            source_with_mid(VenueId::Kraken, 100.0, 250.0),  // mid 175
        ];

        let result = compute_over(&sources);
        assert!(result.success);
        assert_eq!(result.mid_price_sources.len(), 3);
        assert_eq!(result.averaged_mid_price, "175.00000000");
    }

    #[test]
    fn excludes_zero_sentinel_venues() {
        let sources = vec![
            source_with_mid(VenueId::Binance, 100.0, 200.0),
            silent_source(VenueId::Huobi),
            silent_source(VenueId::Kraken),
        ];

        let result = compute_over(&sources);
        assert_eq!(result.mid_price_sources.len(), 1);
        assert_eq!(result.mid_price_sources[0].market_data_source, "Binance");
        assert_eq!(result.averaged_mid_price, "150.00000000");
    }

    #[test]
    fn empty_set_yields_nan_marker_and_success() {
        let sources = vec![
            silent_source(VenueId::Binance),
            silent_source(VenueId::Huobi),
            silent_source(VenueId::Kraken),
        ];

        let result = compute_over(&sources);
        assert!(result.success);
        assert!(result.mid_price_sources.is_empty());
        assert_eq!(result.averaged_mid_price, "NaN");
    }

    #[test]
    fn result_preserves_source_order() {
        let sources = vec![
            source_with_mid(VenueId::Binance, 1.0, 3.0),
            source_with_mid(VenueId::Huobi, 2.0, 4.0),
            source_with_mid(VenueId::Kraken, 3.0, 5.0),
        ];

        let result = compute_over(&sources);
        let names: Vec<&str> = result
            .mid_price_sources
            .iter()
            .map(|s| s.market_data_source.as_str())
            .collect();
        assert_eq!(names, vec!["Binance", "Huobi", "Kraken"]);
    }

    #[test]
    fn aggregator_reads_through_directory() {
        struct FixedDirectory(Vec<Arc<dyn MarketDataSource>>);
        impl SourceDirectory for FixedDirectory {
            fn sources(&self) -> Vec<Arc<dyn MarketDataSource>> {
                self.0.clone()
            }
        }

        let directory = Arc::new(FixedDirectory(vec![source_with_mid(
            VenueId::Kraken,
            100.0,
            250.0,
        )]));
        let aggregator = Aggregator::new(directory);

        let result = aggregator.compute_aggregate();
        assert_eq!(result.averaged_mid_price, "175.00000000");
        assert_eq!(result.mid_price_sources.len(), 1);
    }
}

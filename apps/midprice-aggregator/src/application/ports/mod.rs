//! Port Interfaces
//!
//! The capability every venue adapter exposes to the rest of the
//! system. Infrastructure clients (Binance, Huobi, Kraken) implement
//! this; the aggregator and the HTTP shell only ever see the trait.
//!
//! Every method is non-blocking by contract: reads return in-memory
//! state the adapter's connection task maintains, and `shutdown` only
//! requests cancellation.

use crate::domain::connection::ConnectionState;
use crate::domain::quote::{Quote, VenueId};

/// A streaming source of top-of-book quotes for one venue.
#[cfg_attr(test, mockall::automock)]
pub trait MarketDataSource: Send + Sync {
    /// Which venue this source streams from.
    fn venue(&self) -> VenueId;

    /// Latest quote snapshot. Returns the zero sentinel if the venue
    /// has never produced a price-bearing frame; absence of data is
    /// not an error.
    fn current_quote(&self) -> Quote;

    /// Current connection lifecycle state.
    fn connection_state(&self) -> ConnectionState;

    /// Total frames received across all connections.
    fn frames_received(&self) -> u64;

    /// Total reconnection attempts since startup.
    fn reconnect_attempts(&self) -> u32;

    /// Request graceful termination. Idempotent; after this call the
    /// source closes its connection with a normal-closure code and
    /// never reconnects.
    fn shutdown(&self);
}

/// Enumerates the currently registered market data sources.
///
/// Implemented by the venue registry; the aggregator depends on this
/// seam rather than on the registry type itself.
pub trait SourceDirectory: Send + Sync {
    /// All registered sources, in registration order.
    fn sources(&self) -> Vec<std::sync::Arc<dyn MarketDataSource>>;
}

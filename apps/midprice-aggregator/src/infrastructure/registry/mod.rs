//! Venue Client Registry
//!
//! Guarantees at most one live client (and therefore one WebSocket
//! connection) per venue. Creating a client spawns its connection loop
//! on a dedicated task; asking again for the same venue returns the
//! existing instance. Registration order is preserved and defines the
//! ordering of aggregate output.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::application::ports::{MarketDataSource, SourceDirectory};
use crate::domain::quote::VenueId;
use crate::infrastructure::config::ServiceConfig;
use crate::infrastructure::venues::{BinanceClient, HuobiClient, KrakenClient};

struct RegistryEntry {
    venue: VenueId,
    source: Arc<dyn MarketDataSource>,
}

/// Singleton-per-venue client registry.
pub struct VenueRegistry {
    /// Cancelled when any client hits a fatal error; the rest of the
    /// process observes this and shuts down.
    shutdown: CancellationToken,
    entries: Mutex<Vec<RegistryEntry>>,
}

impl VenueRegistry {
    /// Create an empty registry tied to the process shutdown token.
    #[must_use]
    pub fn new(shutdown: CancellationToken) -> Self {
        Self {
            shutdown,
            entries: Mutex::new(Vec::new()),
        }
    }

    /// Get the client for a venue, creating and starting it on first
    /// use.
    pub fn get_or_create(&self, venue: VenueId, config: &ServiceConfig) -> Arc<dyn MarketDataSource> {
        let mut entries = self.entries.lock();

        if let Some(entry) = entries.iter().find(|e| e.venue == venue) {
            return Arc::clone(&entry.source);
        }

        tracing::info!(venue = venue.as_str(), "Starting venue client");
        let source = self.spawn_client(venue, config);
        entries.push(RegistryEntry {
            venue,
            source: Arc::clone(&source),
        });
        source
    }

    /// Get the client for a venue without creating one.
    #[must_use]
    pub fn get(&self, venue: VenueId) -> Option<Arc<dyn MarketDataSource>> {
        self.entries
            .lock()
            .iter()
            .find(|e| e.venue == venue)
            .map(|e| Arc::clone(&e.source))
    }

    /// Signal every registered client to shut down. Safe to call more
    /// than once.
    pub fn shutdown_all(&self) {
        for entry in self.entries.lock().iter() {
            entry.source.shutdown();
        }
    }

    fn spawn_client(&self, venue: VenueId, config: &ServiceConfig) -> Arc<dyn MarketDataSource> {
        match venue {
            VenueId::Binance => {
                let client = Arc::new(BinanceClient::new(config.binance_config()));
                self.spawn_run(venue, Arc::clone(&client), BinanceClient::run);
                client
            }
            VenueId::Huobi => {
                let client = Arc::new(HuobiClient::new(config.huobi_config()));
                self.spawn_run(venue, Arc::clone(&client), HuobiClient::run);
                client
            }
            VenueId::Kraken => {
                let client = Arc::new(KrakenClient::new(config.kraken_config()));
                self.spawn_run(venue, Arc::clone(&client), KrakenClient::run);
                client
            }
        }
    }

    fn spawn_run<C, F>(&self, venue: VenueId, client: Arc<C>, run: impl FnOnce(Arc<C>) -> F + Send + 'static)
    where
        C: Send + Sync + 'static,
        F: Future<Output = Result<(), crate::infrastructure::venues::VenueClientError>>
            + Send
            + 'static,
    {
        let shutdown = self.shutdown.clone();
        tokio::spawn(async move {
            if let Err(e) = run(client).await {
                // Fatal client errors take the whole process down
                // rather than leaving the aggregate silently stale.
                tracing::error!(venue = venue.as_str(), error = %e, "Venue client failed fatally");
                shutdown.cancel();
            }
        });
    }
}

impl SourceDirectory for VenueRegistry {
    fn sources(&self) -> Vec<Arc<dyn MarketDataSource>> {
        self.entries
            .lock()
            .iter()
            .map(|e| Arc::clone(&e.source))
            .collect()
    }
}

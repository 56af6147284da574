//! Binance WebSocket Client
//!
//! Connects to the Binance spot bookTicker stream, which pushes the
//! best bid/ask for the tracked pair in real time.
//!
//! # Stream URL
//!
//! `wss://stream.binance.com:9443/ws/btcusdt@bookTicker`
//!
//! # Protocol
//!
//! JSON text frames; bid and ask arrive as decimal-formatted strings.
//! Keepalives are transport-level WebSocket pings, answered with pongs
//! before any other processing. The subscription acknowledgment is an
//! object with a null `result`.

use std::sync::Arc;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;

use super::codec::{BinanceFrame, decode_binance};
use super::messages::BinanceSubscribeRequest;
use super::reconnect::{BackoffConfig, BackoffPolicy};
use super::VenueClientError;
use crate::application::ports::MarketDataSource;
use crate::domain::connection::{ConnectionState, VenueConnectionState};
use crate::domain::quote::{Quote, QuoteStore, VenueId};
use crate::infrastructure::metrics;

/// Default Binance stream endpoint.
pub const DEFAULT_URL: &str = "wss://stream.binance.com:9443/ws/btcusdt@bookTicker";

/// Configuration for the Binance client.
#[derive(Debug, Clone)]
pub struct BinanceClientConfig {
    /// WebSocket URL.
    pub url: String,
    /// Reconnection backoff bounds.
    pub backoff: BackoffConfig,
}

impl BinanceClientConfig {
    /// Create a configuration for the given endpoint.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl Default for BinanceClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

/// Binance market data client.
///
/// Owns the venue's quote store (single writer) and drives the
/// connect / subscribe / stream / reconnect lifecycle on its own task.
pub struct BinanceClient {
    config: BinanceClientConfig,
    store: QuoteStore,
    state: VenueConnectionState,
    cancel: CancellationToken,
}

impl BinanceClient {
    /// Create a new client. It does nothing until [`Self::run`] is
    /// spawned.
    #[must_use]
    pub fn new(config: BinanceClientConfig) -> Self {
        Self {
            config,
            store: QuoteStore::new(),
            state: VenueConnectionState::new(),
            cancel: CancellationToken::new(),
        }
    }

    /// Run the connection loop until shut down or a fatal error.
    ///
    /// # Errors
    ///
    /// Returns only fatal errors (broken local invariants); everything
    /// transport-level is absorbed by reconnect-with-backoff.
    pub async fn run(self: Arc<Self>) -> Result<(), VenueClientError> {
        let mut backoff = BackoffPolicy::new(self.config.backoff.clone());

        loop {
            if self.cancel.is_cancelled() {
                self.enter_terminated();
                return Ok(());
            }

            match self.connect_and_stream(&mut backoff).await {
                Ok(()) => {
                    self.enter_terminated();
                    tracing::info!("Binance connection closed gracefully");
                    return Ok(());
                }
                Err(e) if e.is_fatal() => {
                    self.enter_terminated();
                    tracing::error!(error = %e, "Binance client fatal error");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Binance connection error");
                    self.state.set_state(ConnectionState::Closing);
                    metrics::set_venue_connected(VenueId::Binance, false);

                    // Never resurrect after shutdown, even if the
                    // backoff timer would otherwise fire.
                    if self.cancel.is_cancelled() {
                        self.enter_terminated();
                        return Ok(());
                    }

                    self.state.set_state(ConnectionState::Reconnecting);
                    self.state.record_reconnect_attempt();
                    metrics::record_reconnect(VenueId::Binance);

                    let delay = backoff.next_delay();
                    tracing::info!(
                        attempt = backoff.attempt_count(),
                        delay_ms = delay.as_millis(),
                        "Reconnecting to Binance stream"
                    );

                    tokio::select! {
                        () = self.cancel.cancelled() => {
                            self.enter_terminated();
                            return Ok(());
                        }
                        () = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }
    }

    /// Connect, subscribe, and stream until close or cancellation.
    async fn connect_and_stream(
        &self,
        backoff: &mut BackoffPolicy,
    ) -> Result<(), VenueClientError> {
        self.state.set_state(ConnectionState::Connecting);
        tracing::info!(url = %self.config.url, "Connecting to Binance stream");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        self.state.set_state(ConnectionState::Subscribing);
        let request = BinanceSubscribeRequest::book_ticker();
        let json = serde_json::to_string(&request).map_err(VenueClientError::SubscribeEncode)?;
        write.send(Message::Text(json.into())).await?;

        loop {
            tokio::select! {
                () = self.cancel.cancelled() => {
                    self.state.set_state(ConnectionState::Closing);
                    let _ = write
                        .send(Message::Close(Some(CloseFrame {
                            code: CloseCode::Normal,
                            reason: "shutdown".into(),
                        })))
                        .await;
                    return Ok(());
                }
                msg = read.next() => {
                    match msg {
                        Some(Ok(Message::Text(text))) => {
                            self.state.record_frame();
                            metrics::record_frame_received(VenueId::Binance);
                            self.handle_frame(&text, backoff);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            // Keepalive reply comes before anything else.
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Binance server sent close frame");
                            return Err(VenueClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ignore other message types
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::info!("Binance WebSocket stream ended");
                            return Err(VenueClientError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Classify and apply one text frame.
    fn handle_frame(&self, text: &str, backoff: &mut BackoffPolicy) {
        match decode_binance(text) {
            Ok(BinanceFrame::Ack) => {
                tracing::info!("Binance subscription acknowledged");
                backoff.reset();
                self.state.set_state(ConnectionState::Streaming);
                metrics::set_venue_connected(VenueId::Binance, true);
            }
            Ok(BinanceFrame::BookTicker { bid, ask }) => {
                self.state.set_state(ConnectionState::Streaming);
                // Binance supplies no usable timestamp here; local
                // receive time stands in.
                self.store.record(bid, ask, Utc::now());
            }
            Ok(BinanceFrame::Other) => {
                tracing::trace!("Ignoring unhandled Binance frame");
            }
            Err(e) => {
                metrics::record_frame_dropped(VenueId::Binance);
                tracing::warn!(error = %e, "Dropping malformed Binance frame");
            }
        }
    }

    fn enter_terminated(&self) {
        self.state.set_state(ConnectionState::Terminated);
        metrics::set_venue_connected(VenueId::Binance, false);
    }
}

impl MarketDataSource for BinanceClient {
    fn venue(&self) -> VenueId {
        VenueId::Binance
    }

    fn current_quote(&self) -> Quote {
        self.store.snapshot()
    }

    fn connection_state(&self) -> ConnectionState {
        self.state.state()
    }

    fn frames_received(&self) -> u64 {
        self.state.frames_received()
    }

    fn reconnect_attempts(&self) -> u32 {
        self.state.reconnect_attempts()
    }

    fn shutdown(&self) {
        self.cancel.cancel();
    }
}

//! Kraken WebSocket Client
//!
//! Connects to the Kraken v2 ticker channel for the tracked pair.
//!
//! # Stream URL
//!
//! `wss://ws.kraken.com/v2`
//!
//! # Protocol
//!
//! JSON text frames. The subscription acknowledgment carries
//! `"success": true`; status and heartbeat channel chatter is
//! recognized and discarded. Ticker updates carry an array of
//! per-instrument records, of which only the first matters for the
//! single tracked pair. Kraken supplies no per-update timestamp, so
//! local receive time stands in.

use std::sync::Arc;

use chrono::Utc;
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;

use super::codec::{KrakenFrame, decode_kraken};
use super::messages::KrakenSubscribeRequest;
use super::reconnect::{BackoffConfig, BackoffPolicy};
use super::VenueClientError;
use crate::application::ports::MarketDataSource;
use crate::domain::connection::{ConnectionState, VenueConnectionState};
use crate::domain::quote::{Quote, QuoteStore, VenueId};
use crate::infrastructure::metrics;

/// Default Kraken stream endpoint.
pub const DEFAULT_URL: &str = "wss://ws.kraken.com/v2";

/// Configuration for the Kraken client.
#[derive(Debug, Clone)]
pub struct KrakenClientConfig {
    /// WebSocket URL.
    pub url: String,
    /// Reconnection backoff bounds.
    pub backoff: BackoffConfig,
}

impl KrakenClientConfig {
    /// Create a configuration for the given endpoint.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl Default for KrakenClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

/// Kraken market data client.
pub struct KrakenClient {
    config: KrakenClientConfig,
    store: QuoteStore,
    state: VenueConnectionState,
    cancel: CancellationToken,
}

impl KrakenClient {
    /// Create a new client. It does nothing until [`Self::run`] is
    /// spawned.
    #[must_use]
    pub fn new(config: KrakenClientConfig) -> Self {
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
    /// Returns only fatal errors; transport failures are absorbed by
    /// reconnect-with-backoff.
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
                    tracing::info!("Kraken connection closed gracefully");
                    return Ok(());
                }
                Err(e) if e.is_fatal() => {
                    self.enter_terminated();
                    tracing::error!(error = %e, "Kraken client fatal error");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Kraken connection error");
                    self.state.set_state(ConnectionState::Closing);
                    metrics::set_venue_connected(VenueId::Kraken, false);

                    if self.cancel.is_cancelled() {
                        self.enter_terminated();
                        return Ok(());
                    }

                    self.state.set_state(ConnectionState::Reconnecting);
                    self.state.record_reconnect_attempt();
                    metrics::record_reconnect(VenueId::Kraken);

                    let delay = backoff.next_delay();
                    tracing::info!(
                        attempt = backoff.attempt_count(),
                        delay_ms = delay.as_millis(),
                        "Reconnecting to Kraken stream"
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
        tracing::info!(url = %self.config.url, "Connecting to Kraken stream");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        self.state.set_state(ConnectionState::Subscribing);
        let request = KrakenSubscribeRequest::ticker();
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
                            metrics::record_frame_received(VenueId::Kraken);
                            self.handle_frame(&text, backoff);
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Kraken server sent close frame");
                            return Err(VenueClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ignore other message types
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::info!("Kraken WebSocket stream ended");
                            return Err(VenueClientError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Classify and apply one text frame.
    fn handle_frame(&self, text: &str, backoff: &mut BackoffPolicy) {
        match decode_kraken(text) {
            Ok(KrakenFrame::Ack) => {
                tracing::info!("Kraken subscription acknowledged");
                backoff.reset();
                self.state.set_state(ConnectionState::Streaming);
                metrics::set_venue_connected(VenueId::Kraken, true);
            }
            Ok(KrakenFrame::Ticker { bid, ask }) => {
                self.state.set_state(ConnectionState::Streaming);
                self.store.record(bid, ask, Utc::now());
            }
            Ok(KrakenFrame::Status) => {
                tracing::trace!("Ignoring Kraken channel chatter");
            }
            Ok(KrakenFrame::Other) => {
                tracing::trace!("Ignoring unhandled Kraken frame");
            }
            Err(e) => {
                metrics::record_frame_dropped(VenueId::Kraken);
                tracing::warn!(error = %e, "Dropping malformed Kraken frame");
            }
        }
    }

    fn enter_terminated(&self) {
        self.state.set_state(ConnectionState::Terminated);
        metrics::set_venue_connected(VenueId::Kraken, false);
    }
}

impl MarketDataSource for KrakenClient {
    fn venue(&self) -> VenueId {
        VenueId::Kraken
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

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> KrakenClient {
        KrakenClient::new(KrakenClientConfig::default())
    }

    #[test]
    fn ack_resets_backoff_and_enters_streaming() {
        let client = client();
        let mut backoff = BackoffPolicy::new(BackoffConfig::default());
        let _ = backoff.next_delay();

        client.handle_frame(
            r#"{"method":"subscribe","success":true,"req_id":1}"#,
            &mut backoff,
        );

        assert_eq!(backoff.attempt_count(), 0);
        assert_eq!(client.connection_state(), ConnectionState::Streaming);
    }

    #[test]
    fn ticker_frame_updates_store() {
        let client = client();
        let mut backoff = BackoffPolicy::new(BackoffConfig::default());

        client.handle_frame(
            r#"{"channel":"ticker","type":"update",
                "data":[{"symbol":"BTC/USD","bid":100.0,"ask":250.0}]}"#,
            &mut backoff,
        );

        let quote = client.current_quote();
        assert_eq!(quote.mid_price, 175.0);
    }

    #[test]
    fn chatter_does_not_touch_the_store() {
        let client = client();
        let mut backoff = BackoffPolicy::new(BackoffConfig::default());

        client.handle_frame(r#"{"channel":"heartbeat"}"#, &mut backoff);
        client.handle_frame(r#"{"channel":"status","data":[{"system":"online"}]}"#, &mut backoff);

        assert_eq!(client.current_quote(), Quote::ZERO);
    }

    #[tokio::test]
    async fn run_after_shutdown_terminates_without_connecting() {
        let client = Arc::new(KrakenClient::new(KrakenClientConfig::new(
            "wss://127.0.0.1:1/unreachable",
        )));
        client.shutdown();
        Arc::clone(&client).run().await.unwrap();
        assert_eq!(client.connection_state(), ConnectionState::Terminated);
    }
}

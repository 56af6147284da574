//! Huobi WebSocket Client
//!
//! Connects to the Huobi BBO (best bid/offer) channel for the tracked
//! pair.
//!
//! # Stream URL
//!
//! `wss://api.huobi.pro/ws`
//!
//! # Protocol
//!
//! Every inbound frame is a gzip-compressed JSON envelope delivered as
//! a binary WebSocket message. Heartbeats are application-level:
//! `{"ping": <nonce>}` must be answered with `{"pong": <nonce>}` before
//! any other processing. BBO updates carry a venue timestamp (`ts`,
//! epoch milliseconds) which is preserved on the quote verbatim.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use futures_util::{SinkExt, StreamExt};
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::tungstenite::protocol::CloseFrame;
use tokio_tungstenite::tungstenite::protocol::frame::coding::CloseCode;
use tokio_util::sync::CancellationToken;

use super::codec::{HuobiFrame, decode_huobi};
use super::messages::{HuobiPong, HuobiSubscribeRequest};
use super::reconnect::{BackoffConfig, BackoffPolicy};
use super::VenueClientError;
use crate::application::ports::MarketDataSource;
use crate::domain::connection::{ConnectionState, VenueConnectionState};
use crate::domain::quote::{Quote, QuoteStore, VenueId};
use crate::infrastructure::metrics;

/// Default Huobi stream endpoint.
pub const DEFAULT_URL: &str = "wss://api.huobi.pro/ws";

/// Configuration for the Huobi client.
#[derive(Debug, Clone)]
pub struct HuobiClientConfig {
    /// WebSocket URL.
    pub url: String,
    /// Reconnection backoff bounds.
    pub backoff: BackoffConfig,
}

impl HuobiClientConfig {
    /// Create a configuration for the given endpoint.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            backoff: BackoffConfig::default(),
        }
    }
}

impl Default for HuobiClientConfig {
    fn default() -> Self {
        Self::new(DEFAULT_URL)
    }
}

/// Huobi market data client.
pub struct HuobiClient {
    config: HuobiClientConfig,
    store: QuoteStore,
    state: VenueConnectionState,
    cancel: CancellationToken,
}

impl HuobiClient {
    /// Create a new client. It does nothing until [`Self::run`] is
    /// spawned.
    #[must_use]
    pub fn new(config: HuobiClientConfig) -> Self {
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
                    tracing::info!("Huobi connection closed gracefully");
                    return Ok(());
                }
                Err(e) if e.is_fatal() => {
                    self.enter_terminated();
                    tracing::error!(error = %e, "Huobi client fatal error");
                    return Err(e);
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Huobi connection error");
                    self.state.set_state(ConnectionState::Closing);
                    metrics::set_venue_connected(VenueId::Huobi, false);

                    if self.cancel.is_cancelled() {
                        self.enter_terminated();
                        return Ok(());
                    }

                    self.state.set_state(ConnectionState::Reconnecting);
                    self.state.record_reconnect_attempt();
                    metrics::record_reconnect(VenueId::Huobi);

                    let delay = backoff.next_delay();
                    tracing::info!(
                        attempt = backoff.attempt_count(),
                        delay_ms = delay.as_millis(),
                        "Reconnecting to Huobi stream"
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
        tracing::info!(url = %self.config.url, "Connecting to Huobi stream");

        let (ws_stream, _response) = tokio_tungstenite::connect_async(&self.config.url).await?;
        let (mut write, mut read) = ws_stream.split();

        self.state.set_state(ConnectionState::Subscribing);
        let request = HuobiSubscribeRequest::bbo();
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
                        Some(Ok(Message::Binary(bytes))) => {
                            self.state.record_frame();
                            metrics::record_frame_received(VenueId::Huobi);
                            if let Some(nonce) = self.apply_frame(decode_huobi(&bytes), backoff) {
                                let pong = serde_json::to_string(&HuobiPong { pong: nonce })
                                    .map_err(VenueClientError::HeartbeatEncode)?;
                                write.send(Message::Text(pong.into())).await?;
                            }
                        }
                        Some(Ok(Message::Ping(data))) => {
                            write.send(Message::Pong(data)).await?;
                        }
                        Some(Ok(Message::Close(frame))) => {
                            tracing::info!(?frame, "Huobi server sent close frame");
                            return Err(VenueClientError::ConnectionClosed);
                        }
                        Some(Ok(_)) => {
                            // Ignore other message types
                        }
                        Some(Err(e)) => return Err(e.into()),
                        None => {
                            tracing::info!("Huobi WebSocket stream ended");
                            return Err(VenueClientError::ConnectionClosed);
                        }
                    }
                }
            }
        }
    }

    /// Apply one decoded frame. Returns the nonce to echo when the
    /// frame was an application heartbeat.
    fn apply_frame(
        &self,
        decoded: Result<HuobiFrame, super::CodecError>,
        backoff: &mut BackoffPolicy,
    ) -> Option<u64> {
        match decoded {
            Ok(HuobiFrame::Ping(nonce)) => {
                tracing::trace!(nonce, "Answering Huobi heartbeat");
                return Some(nonce);
            }
            Ok(HuobiFrame::Subbed) => {
                tracing::info!("Huobi subscription acknowledged");
                backoff.reset();
                self.state.set_state(ConnectionState::Streaming);
                metrics::set_venue_connected(VenueId::Huobi, true);
            }
            Ok(HuobiFrame::Bbo { bid, ask, ts }) => {
                self.state.set_state(ConnectionState::Streaming);
                let at = DateTime::from_timestamp_millis(ts).unwrap_or_else(Utc::now);
                self.store.record(bid, ask, at);
            }
            Ok(HuobiFrame::Other) => {
                tracing::trace!("Ignoring unhandled Huobi frame");
            }
            Err(e) => {
                metrics::record_frame_dropped(VenueId::Huobi);
                tracing::warn!(error = %e, "Dropping malformed Huobi frame");
            }
        }
        None
    }

    fn enter_terminated(&self) {
        self.state.set_state(ConnectionState::Terminated);
        metrics::set_venue_connected(VenueId::Huobi, false);
    }
}

impl MarketDataSource for HuobiClient {
    fn venue(&self) -> VenueId {
        VenueId::Huobi
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
    use crate::infrastructure::venues::codec::decode_huobi_text;

    fn client() -> HuobiClient {
        HuobiClient::new(HuobiClientConfig::default())
    }

    #[test]
    fn ping_frame_yields_echo_nonce() {
        let client = client();
        let mut backoff = BackoffPolicy::new(BackoffConfig::default());

        let nonce = client.apply_frame(decode_huobi_text(r#"{"ping":42}"#), &mut backoff);

        assert_eq!(nonce, Some(42));
        // A heartbeat alone is not a price update.
        assert_eq!(client.current_quote(), Quote::ZERO);
    }

    #[test]
    fn subbed_resets_backoff_and_enters_streaming() {
        let client = client();
        let mut backoff = BackoffPolicy::new(BackoffConfig::default());
        let _ = backoff.next_delay();

        let nonce = client.apply_frame(
            decode_huobi_text(r#"{"subbed":"market.btcusdt.bbo","status":"ok"}"#),
            &mut backoff,
        );

        assert_eq!(nonce, None);
        assert_eq!(backoff.attempt_count(), 0);
        assert_eq!(client.connection_state(), ConnectionState::Streaming);
    }

    #[test]
    fn bbo_frame_preserves_venue_timestamp() {
        let client = client();
        let mut backoff = BackoffPolicy::new(BackoffConfig::default());

        client.apply_frame(
            decode_huobi_text(
                r#"{"ch":"market.btcusdt.bbo","ts":1700000000000,
                    "tick":{"bid":100.0,"ask":300.0}}"#,
            ),
            &mut backoff,
        );

        let quote = client.current_quote();
        assert_eq!(quote.mid_price, 200.0);
        assert_eq!(quote.last_update.timestamp_millis(), 1_700_000_000_000);
    }

    #[test]
    fn malformed_frame_is_dropped_not_applied() {
        let client = client();
        let mut backoff = BackoffPolicy::new(BackoffConfig::default());

        client.apply_frame(decode_huobi_text("not json"), &mut backoff);

        assert_eq!(client.current_quote(), Quote::ZERO);
    }

    #[tokio::test]
    async fn run_after_shutdown_terminates_without_connecting() {
        let client = Arc::new(HuobiClient::new(HuobiClientConfig::new(
            "wss://127.0.0.1:1/unreachable",
        )));
        client.shutdown();
        Arc::clone(&client).run().await.unwrap();
        assert_eq!(client.connection_state(), ConnectionState::Terminated);
    }
}

//! Venue WebSocket Clients
//!
//! One client per streaming price venue, each owning a persistent
//! connection and driving the same lifecycle state machine; only the
//! payload format of each transition differs:
//!
//! - **Binance**: bookTicker stream, string-encoded prices, transport
//!   ping/pong (JSON codec)
//! - **Huobi**: BBO channel, gzip envelopes, application-level
//!   ping/pong nonces
//! - **Kraken**: v2 ticker channel, array-of-records data frames,
//!   status/heartbeat chatter

pub mod binance;
pub mod codec;
pub mod huobi;
pub mod kraken;
pub mod messages;
pub mod reconnect;

pub use binance::{BinanceClient, BinanceClientConfig};
pub use codec::{BinanceFrame, CodecError, HuobiFrame, KrakenFrame};
pub use huobi::{HuobiClient, HuobiClientConfig};
pub use kraken::{KrakenClient, KrakenClientConfig};
pub use reconnect::{BackoffConfig, BackoffPolicy};

/// Errors that can occur in a venue client's connection loop.
///
/// Only [`VenueClientError::SubscribeEncode`] is fatal: it indicates a
/// broken local invariant rather than network flakiness, and the
/// process must stop rather than silently serve stale data forever.
/// Everything else is recovered by the reconnect path.
#[derive(Debug, thiserror::Error)]
pub enum VenueClientError {
    /// WebSocket connection failed.
    #[error("WebSocket connection failed: {0}")]
    ConnectionFailed(String),

    /// WebSocket error.
    #[error("WebSocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    /// The constant subscription payload failed to serialize right
    /// after the connection opened. Structural, fatal.
    #[error("failed to encode subscribe request: {0}")]
    SubscribeEncode(#[source] serde_json::Error),

    /// A heartbeat reply failed to serialize. The connection is torn
    /// down and retried like any transport error.
    #[error("failed to encode heartbeat reply: {0}")]
    HeartbeatEncode(#[source] serde_json::Error),

    /// Connection closed by the server or the stream ended.
    #[error("connection closed")]
    ConnectionClosed,
}

impl VenueClientError {
    /// Whether this error must stop the process instead of triggering
    /// a reconnect.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::SubscribeEncode(_))
    }
}

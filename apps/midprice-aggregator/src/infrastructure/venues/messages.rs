//! Venue Wire Messages
//!
//! Serde types for each venue's fixed wire contract: the outbound
//! subscription requests (reproduced exactly, including the required
//! correlation identifiers) and the inbound frame payloads. Decoders
//! ignore unknown fields everywhere so new venue fields never break
//! the stream.

use serde::{Deserialize, Serialize};

/// The single tracked instrument on Binance and Huobi.
pub const BINANCE_BOOK_TICKER_STREAM: &str = "btcusdt@bookTicker";
/// The BBO channel for the tracked instrument on Huobi.
pub const HUOBI_BBO_CHANNEL: &str = "market.btcusdt.bbo";
/// The single tracked instrument on Kraken.
pub const KRAKEN_TICKER_SYMBOL: &str = "BTC/USD";

// =============================================================================
// Binance
// =============================================================================

/// Binance stream subscription request.
///
/// `{"method":"SUBSCRIBE","params":["btcusdt@bookTicker"],"id":1}`
#[derive(Debug, Clone, Serialize)]
pub struct BinanceSubscribeRequest {
    /// Always `SUBSCRIBE`.
    pub method: &'static str,
    /// Stream names to subscribe to.
    pub params: Vec<&'static str>,
    /// Fixed request correlation id.
    pub id: u32,
}

impl BinanceSubscribeRequest {
    /// Subscribe to the top-of-book stream for the tracked pair.
    #[must_use]
    pub fn book_ticker() -> Self {
        Self {
            method: "SUBSCRIBE",
            params: vec![BINANCE_BOOK_TICKER_STREAM],
            id: 1,
        }
    }
}

/// Binance `bookTicker` price frame. Bid and ask arrive as
/// decimal-formatted strings.
#[derive(Debug, Clone, Deserialize)]
pub struct BinanceBookTicker {
    /// Best bid price, decimal string.
    #[serde(rename = "b")]
    pub best_bid: String,
    /// Best ask price, decimal string.
    #[serde(rename = "a")]
    pub best_ask: String,
}

// =============================================================================
// Huobi
// =============================================================================

/// Huobi channel subscription request.
///
/// `{"sub":["market.btcusdt.bbo"],"id":"id1"}`
#[derive(Debug, Clone, Serialize)]
pub struct HuobiSubscribeRequest {
    /// Channels to subscribe to.
    pub sub: Vec<&'static str>,
    /// Fixed request correlation id.
    pub id: &'static str,
}

impl HuobiSubscribeRequest {
    /// Subscribe to the BBO channel for the tracked pair.
    #[must_use]
    pub fn bbo() -> Self {
        Self {
            sub: vec![HUOBI_BBO_CHANNEL],
            id: "id1",
        }
    }
}

/// Application-level heartbeat reply. Huobi requires echoing the ping
/// nonce back as `{"pong": <nonce>}`.
#[derive(Debug, Clone, Serialize)]
pub struct HuobiPong {
    /// The nonce from the ping being answered.
    pub pong: u64,
}

/// The `tick` payload inside a Huobi BBO update.
#[derive(Debug, Clone, Deserialize)]
pub struct HuobiTick {
    /// Best bid price.
    pub bid: f64,
    /// Best ask price.
    pub ask: f64,
}

/// A Huobi BBO market update (after gzip decompression).
#[derive(Debug, Clone, Deserialize)]
pub struct HuobiBboMessage {
    /// Venue-supplied timestamp in epoch milliseconds, used verbatim
    /// as the quote update time.
    pub ts: i64,
    /// The price payload.
    pub tick: HuobiTick,
}

// =============================================================================
// Kraken
// =============================================================================

/// Parameters of a Kraken v2 subscription request.
#[derive(Debug, Clone, Serialize)]
pub struct KrakenSubscribeParams {
    /// Channel name (`ticker`).
    pub channel: &'static str,
    /// Symbols to track.
    pub symbol: Vec<&'static str>,
}

/// Kraken v2 subscription request.
///
/// `{"method":"subscribe","params":{"channel":"ticker","symbol":["BTC/USD"]},"req_id":1}`
#[derive(Debug, Clone, Serialize)]
pub struct KrakenSubscribeRequest {
    /// Always `subscribe`.
    pub method: &'static str,
    /// Channel and symbol selection.
    pub params: KrakenSubscribeParams,
    /// Fixed request correlation id.
    pub req_id: u32,
}

impl KrakenSubscribeRequest {
    /// Subscribe to the ticker channel for the tracked pair.
    #[must_use]
    pub fn ticker() -> Self {
        Self {
            method: "subscribe",
            params: KrakenSubscribeParams {
                channel: "ticker",
                symbol: vec![KRAKEN_TICKER_SYMBOL],
            },
            req_id: 1,
        }
    }
}

/// One instrument record inside a Kraken ticker frame.
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenTickerRecord {
    /// Best bid price.
    pub bid: f64,
    /// Best ask price.
    pub ask: f64,
}

/// A Kraken ticker channel frame carrying per-instrument records.
#[derive(Debug, Clone, Deserialize)]
pub struct KrakenTickerMessage {
    /// Per-instrument records; only the first (and only) one is used.
    pub data: Vec<KrakenTickerRecord>,
}

// =============================================================================
// Tests
// =============================================================================

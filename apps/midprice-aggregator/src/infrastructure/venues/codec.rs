//! Venue Frame Codecs
//!
//! Classifies and decodes each venue's inbound frames. Every decoder
//! distinguishes four kinds of frame: heartbeat pings that must be
//! answered, acknowledgments and status chatter that are recognized
//! and discarded, price updates, and anything else (ignored for
//! forward compatibility rather than treated as an error).
//!
//! Huobi wraps every frame in a gzip envelope, so its decoder
//! decompresses before classifying.

use std::io::Read;

use flate2::read::GzDecoder;

use super::messages::{BinanceBookTicker, HuobiBboMessage, KrakenTickerMessage};

// =============================================================================
// Error Type
// =============================================================================

/// Frame decode errors. All of these are frame-level: the caller logs
/// and drops the frame, never tears down the connection for them.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The frame was not valid JSON, or a recognized shape failed to
    /// deserialize.
    #[error("JSON codec error: {0}")]
    Json(#[from] serde_json::Error),

    /// Gzip decompression of a Huobi envelope failed.
    #[error("gzip decompression failed: {0}")]
    Decompress(#[from] std::io::Error),

    /// A decimal-string price field did not parse as a number.
    #[error("invalid price string {field} = {value:?}")]
    InvalidPrice {
        /// Which wire field held the bad value.
        field: &'static str,
        /// The offending string.
        value: String,
    },
}

// =============================================================================
// Binance
// =============================================================================

/// A classified Binance frame.
#[derive(Debug, Clone, PartialEq)]
pub enum BinanceFrame {
    /// Subscription acknowledgment (`{"result":null,"id":1}`).
    Ack,
    /// Top-of-book update; prices already parsed from their string
    /// encoding.
    BookTicker {
        /// Best bid price.
        bid: f64,
        /// Best ask price.
        ask: f64,
    },
    /// Anything else; recognized and discarded.
    Other,
}

/// Decode one Binance text frame.
///
/// # Errors
///
/// Returns an error for invalid JSON or unparsable price strings.
pub fn decode_binance(text: &str) -> Result<BinanceFrame, CodecError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    // The ack carries "result": null alongside the correlation id.
    if let Some(result) = value.get("result") {
        if result.is_null() {
            return Ok(BinanceFrame::Ack);
        }
        return Ok(BinanceFrame::Other);
    }

    // Price frames are discriminated by the presence of the string
    // bid/ask fields.
    if value.get("b").is_some() && value.get("a").is_some() {
        let ticker: BinanceBookTicker = serde_json::from_value(value)?;
        let bid = parse_price("b", &ticker.best_bid)?;
        let ask = parse_price("a", &ticker.best_ask)?;
        return Ok(BinanceFrame::BookTicker { bid, ask });
    }

    Ok(BinanceFrame::Other)
}

fn parse_price(field: &'static str, value: &str) -> Result<f64, CodecError> {
    value.parse().map_err(|_| CodecError::InvalidPrice {
        field,
        value: value.to_string(),
    })
}

// =============================================================================
// Huobi
// =============================================================================

/// A classified Huobi frame (after decompression).
#[derive(Debug, Clone, PartialEq)]
pub enum HuobiFrame {
    /// Application heartbeat; the nonce must be echoed back as a pong
    /// before any other processing.
    Ping(u64),
    /// Subscription acknowledgment (`{"subbed": ...}`).
    Subbed,
    /// BBO update with venue-supplied timestamp.
    Bbo {
        /// Best bid price.
        bid: f64,
        /// Best ask price.
        ask: f64,
        /// Venue timestamp, epoch milliseconds.
        ts: i64,
    },
    /// Anything else; recognized and discarded.
    Other,
}

/// Decode one gzip-compressed Huobi binary frame.
///
/// # Errors
///
/// Returns an error if decompression fails or the decompressed bytes
/// are not valid JSON.
pub fn decode_huobi(compressed: &[u8]) -> Result<HuobiFrame, CodecError> {
    let mut decoder = GzDecoder::new(compressed);
    let mut text = String::new();
    decoder.read_to_string(&mut text)?;
    decode_huobi_text(&text)
}

/// Decode an already-decompressed Huobi frame.
///
/// # Errors
///
/// Returns an error for invalid JSON.
pub fn decode_huobi_text(text: &str) -> Result<HuobiFrame, CodecError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    if let Some(nonce) = value.get("ping").and_then(serde_json::Value::as_u64) {
        return Ok(HuobiFrame::Ping(nonce));
    }

    if value.get("tick").is_some() {
        let message: HuobiBboMessage = serde_json::from_value(value)?;
        return Ok(HuobiFrame::Bbo {
            bid: message.tick.bid,
            ask: message.tick.ask,
            ts: message.ts,
        });
    }

    if value.get("subbed").is_some() {
        return Ok(HuobiFrame::Subbed);
    }

    Ok(HuobiFrame::Other)
}

// =============================================================================
// Kraken
// =============================================================================

/// A classified Kraken frame.
#[derive(Debug, Clone, PartialEq)]
pub enum KrakenFrame {
    /// Positive subscription acknowledgment (`"success": true`).
    Ack,
    /// Status or heartbeat channel chatter; discarded.
    Status,
    /// Ticker update; only the first record of the `data` array is
    /// meaningful for the single tracked pair.
    Ticker {
        /// Best bid price.
        bid: f64,
        /// Best ask price.
        ask: f64,
    },
    /// Anything else; recognized and discarded.
    Other,
}

/// Decode one Kraken text frame.
///
/// # Errors
///
/// Returns an error for invalid JSON.
pub fn decode_kraken(text: &str) -> Result<KrakenFrame, CodecError> {
    let value: serde_json::Value = serde_json::from_str(text)?;

    if let Some(success) = value.get("success").and_then(serde_json::Value::as_bool) {
        return Ok(if success {
            KrakenFrame::Ack
        } else {
            KrakenFrame::Other
        });
    }

    match value.get("channel").and_then(serde_json::Value::as_str) {
        Some("status" | "heartbeat") => Ok(KrakenFrame::Status),
        Some("ticker") => {
            let message: KrakenTickerMessage = serde_json::from_value(value)?;
            message.data.first().map_or(Ok(KrakenFrame::Other), |record| {
                Ok(KrakenFrame::Ticker {
                    bid: record.bid,
                    ask: record.ask,
                })
            })
        }
        _ => Ok(KrakenFrame::Other),
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;
    use test_case::test_case;

    fn gzip(text: &str) -> Vec<u8> {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(text.as_bytes()).unwrap();
        encoder.finish().unwrap()
    }

    // -------------------------------------------------------------------------
    // Binance
    // -------------------------------------------------------------------------

    #[test]
    fn binance_ack_frame() {
        let frame = decode_binance(r#"{"result":null,"id":1}"#).unwrap();
        assert_eq!(frame, BinanceFrame::Ack);
    }

    #[test]
    fn binance_book_ticker_parses_price_strings() {
        let frame = decode_binance(
            r#"{"u":400900217,"s":"BTCUSDT","b":"100.0","B":"31.2","a":"200.0","A":"40.1"}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            BinanceFrame::BookTicker {
                bid: 100.0,
                ask: 200.0
            }
        );
    }

    #[test]
    fn binance_unparsable_price_is_an_error() {
        let err = decode_binance(r#"{"b":"not-a-number","a":"200.0"}"#).unwrap_err();
        assert!(matches!(err, CodecError::InvalidPrice { field: "b", .. }));
    }

    #[test_case(r#"{"e":"something","x":1}"# ; "unknown object")]
    #[test_case(r#"{"result":42,"id":1}"# ; "non null result")]
    fn binance_unrecognized_frames_are_other(text: &str) {
        assert_eq!(decode_binance(text).unwrap(), BinanceFrame::Other);
    }

    #[test]
    fn binance_invalid_json_is_an_error() {
        assert!(decode_binance("not json").is_err());
    }

    // -------------------------------------------------------------------------
    // Huobi
    // -------------------------------------------------------------------------

    #[test]
    fn huobi_ping_carries_nonce() {
        let frame = decode_huobi(&gzip(r#"{"ping":1700000000123}"#)).unwrap();
        assert_eq!(frame, HuobiFrame::Ping(1_700_000_000_123));
    }

    #[test]
    fn huobi_bbo_round_trips_gzip_envelope() {
        let payload = r#"{"ch":"market.btcusdt.bbo","ts":1700000000000,
                          "tick":{"bid":100.0,"ask":300.0,"seqId":7}}"#;
        let frame = decode_huobi(&gzip(payload)).unwrap();
        assert_eq!(
            frame,
            HuobiFrame::Bbo {
                bid: 100.0,
                ask: 300.0,
                ts: 1_700_000_000_000
            }
        );
    }

    #[test]
    fn huobi_subbed_ack() {
        let frame =
            decode_huobi(&gzip(r#"{"subbed":"market.btcusdt.bbo","status":"ok"}"#)).unwrap();
        assert_eq!(frame, HuobiFrame::Subbed);
    }

    #[test]
    fn huobi_unknown_frame_is_other() {
        let frame = decode_huobi(&gzip(r#"{"rep":"something"}"#)).unwrap();
        assert_eq!(frame, HuobiFrame::Other);
    }

    #[test]
    fn huobi_uncompressed_bytes_are_an_error() {
        let err = decode_huobi(br#"{"ping":1}"#).unwrap_err();
        assert!(matches!(err, CodecError::Decompress(_)));
    }

    // -------------------------------------------------------------------------
    // Kraken
    // -------------------------------------------------------------------------

    #[test]
    fn kraken_positive_ack() {
        let frame = decode_kraken(
            r#"{"method":"subscribe","success":true,"req_id":1,
                "result":{"channel":"ticker","symbol":"BTC/USD"}}"#,
        )
        .unwrap();
        assert_eq!(frame, KrakenFrame::Ack);
    }

    #[test]
    fn kraken_negative_ack_is_not_an_ack() {
        let frame =
            decode_kraken(r#"{"method":"subscribe","success":false,"error":"nope"}"#).unwrap();
        assert_eq!(frame, KrakenFrame::Other);
    }

    #[test_case(r#"{"channel":"status","data":[{"system":"online"}]}"# ; "status channel")]
    #[test_case(r#"{"channel":"heartbeat"}"# ; "heartbeat channel")]
    fn kraken_chatter_is_discarded(text: &str) {
        assert_eq!(decode_kraken(text).unwrap(), KrakenFrame::Status);
    }

    #[test]
    fn kraken_ticker_takes_first_record() {
        let frame = decode_kraken(
            r#"{"channel":"ticker","type":"update",
                "data":[{"symbol":"BTC/USD","bid":100.0,"ask":250.0,"last":170.0}]}"#,
        )
        .unwrap();
        assert_eq!(
            frame,
            KrakenFrame::Ticker {
                bid: 100.0,
                ask: 250.0
            }
        );
    }

    #[test]
    fn kraken_empty_data_array_is_other() {
        let frame = decode_kraken(r#"{"channel":"ticker","type":"update","data":[]}"#).unwrap();
        assert_eq!(frame, KrakenFrame::Other);
    }
}

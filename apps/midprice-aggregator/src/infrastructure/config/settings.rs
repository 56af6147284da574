//! Service Configuration Settings
//!
//! Configuration for the aggregator, loaded from environment
//! variables. Every value has a sensible default, so an empty
//! environment yields a working service.

use std::time::Duration;

use crate::infrastructure::venues::reconnect::BackoffConfig;
use crate::infrastructure::venues::{binance, huobi, kraken};
use crate::infrastructure::venues::{BinanceClientConfig, HuobiClientConfig, KrakenClientConfig};

/// HTTP server settings.
#[derive(Debug, Clone)]
pub struct ServerSettings {
    /// API server port.
    pub http_port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self { http_port: 3000 }
    }
}

/// WebSocket reconnection settings, shared by every venue client.
#[derive(Debug, Clone)]
pub struct ReconnectSettings {
    /// Initial reconnection delay.
    pub delay_initial: Duration,
    /// Maximum reconnection delay.
    pub delay_max: Duration,
}

impl Default for ReconnectSettings {
    fn default() -> Self {
        Self {
            delay_initial: Duration::from_secs(1),
            delay_max: Duration::from_secs(60),
        }
    }
}

/// Per-venue WebSocket endpoints.
#[derive(Debug, Clone)]
pub struct VenueEndpoints {
    /// Binance stream URL.
    pub binance_url: String,
    /// Huobi stream URL.
    pub huobi_url: String,
    /// Kraken stream URL.
    pub kraken_url: String,
}

impl Default for VenueEndpoints {
    fn default() -> Self {
        Self {
            binance_url: binance::DEFAULT_URL.to_string(),
            huobi_url: huobi::DEFAULT_URL.to_string(),
            kraken_url: kraken::DEFAULT_URL.to_string(),
        }
    }
}

/// Complete service configuration.
#[derive(Debug, Clone, Default)]
pub struct ServiceConfig {
    /// HTTP server settings.
    pub server: ServerSettings,
    /// Reconnection settings.
    pub reconnect: ReconnectSettings,
    /// Venue endpoints.
    pub endpoints: VenueEndpoints,
}

impl ServiceConfig {
    /// Load configuration from environment variables, falling back to
    /// defaults for anything unset or unparsable.
    #[must_use]
    pub fn from_env() -> Self {
        let server = ServerSettings {
            http_port: parse_env_u16("MIDPRICE_HTTP_PORT", ServerSettings::default().http_port),
        };

        let reconnect = ReconnectSettings {
            delay_initial: parse_env_duration_millis(
                "MIDPRICE_RECONNECT_DELAY_INITIAL_MS",
                ReconnectSettings::default().delay_initial,
            ),
            delay_max: parse_env_duration_secs(
                "MIDPRICE_RECONNECT_DELAY_MAX_SECS",
                ReconnectSettings::default().delay_max,
            ),
        };

        let defaults = VenueEndpoints::default();
        let endpoints = VenueEndpoints {
            binance_url: parse_env_string("MIDPRICE_BINANCE_WS_URL", defaults.binance_url),
            huobi_url: parse_env_string("MIDPRICE_HUOBI_WS_URL", defaults.huobi_url),
            kraken_url: parse_env_string("MIDPRICE_KRAKEN_WS_URL", defaults.kraken_url),
        };

        Self {
            server,
            reconnect,
            endpoints,
        }
    }

    fn backoff(&self) -> BackoffConfig {
        BackoffConfig {
            initial_delay: self.reconnect.delay_initial,
            max_delay: self.reconnect.delay_max,
        }
    }

    /// Build the Binance client configuration.
    #[must_use]
    pub fn binance_config(&self) -> BinanceClientConfig {
        BinanceClientConfig {
            url: self.endpoints.binance_url.clone(),
            backoff: self.backoff(),
        }
    }

    /// Build the Huobi client configuration.
    #[must_use]
    pub fn huobi_config(&self) -> HuobiClientConfig {
        HuobiClientConfig {
            url: self.endpoints.huobi_url.clone(),
            backoff: self.backoff(),
        }
    }

    /// Build the Kraken client configuration.
    #[must_use]
    pub fn kraken_config(&self) -> KrakenClientConfig {
        KrakenClientConfig {
            url: self.endpoints.kraken_url.clone(),
            backoff: self.backoff(),
        }
    }
}

fn parse_env_u16(key: &str, default: u16) -> u16 {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

fn parse_env_string(key: &str, default: String) -> String {
    std::env::var(key)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or(default)
}

fn parse_env_duration_secs(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_secs)
}

fn parse_env_duration_millis(key: &str, default: Duration) -> Duration {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .map_or(default, Duration::from_millis)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn server_settings_defaults() {
        let settings = ServerSettings::default();
        assert_eq!(settings.http_port, 3000);
    }

    #[test]
    fn reconnect_settings_defaults() {
        let settings = ReconnectSettings::default();
        assert_eq!(settings.delay_initial, Duration::from_secs(1));
        assert_eq!(settings.delay_max, Duration::from_secs(60));
    }

    #[test]
    fn default_endpoints_are_production_streams() {
        let endpoints = VenueEndpoints::default();
        assert!(endpoints.binance_url.starts_with("wss://stream.binance.com"));
        assert!(endpoints.huobi_url.starts_with("wss://api.huobi.pro"));
        assert!(endpoints.kraken_url.starts_with("wss://ws.kraken.com"));
    }

    #[test]
    fn client_configs_inherit_reconnect_settings() {
        let config = ServiceConfig {
            reconnect: ReconnectSettings {
                delay_initial: Duration::from_millis(250),
                delay_max: Duration::from_secs(10),
            },
            ..ServiceConfig::default()
        };

        let binance = config.binance_config();
        assert_eq!(binance.backoff.initial_delay, Duration::from_millis(250));
        assert_eq!(binance.backoff.max_delay, Duration::from_secs(10));

        let huobi = config.huobi_config();
        assert_eq!(huobi.backoff.max_delay, Duration::from_secs(10));

        let kraken = config.kraken_config();
        assert_eq!(kraken.backoff.initial_delay, Duration::from_millis(250));
    }
}

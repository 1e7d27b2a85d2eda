//! WebSocket transport configuration.

use duedex_core::config::{ClientConfig, ReconnectConfig};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the feed's physical connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WebSocketConfig {
    /// WebSocket endpoint URL.
    pub url: String,

    /// Connection timeout in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Ping interval in milliseconds.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// Pong timeout in milliseconds: how long the peer may stay silent after
    /// a ping before the connection is dropped.
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,

    /// Reconnection policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_pong_timeout_ms() -> u64 {
    10_000
}

impl WebSocketConfig {
    /// Creates a configuration with defaults for everything but the URL.
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            connect_timeout_ms: default_connect_timeout_ms(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            reconnect: ReconnectConfig::default(),
        }
    }

    /// Derives the transport settings from the client configuration.
    #[must_use]
    pub fn from_client(config: &ClientConfig) -> Self {
        Self {
            url: config.ws_endpoint().to_string(),
            connect_timeout_ms: config.connect_timeout_ms,
            heartbeat_interval_ms: config.heartbeat_interval_ms,
            pong_timeout_ms: config.pong_timeout_ms,
            reconnect: config.reconnect.clone(),
        }
    }

    /// Returns the connection timeout as a Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the heartbeat interval as a Duration.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms.max(1))
    }

    /// Returns the pong timeout as a Duration.
    #[must_use]
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms.max(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duedex_core::config::Network;

    #[test]
    fn test_from_client() {
        let client = ClientConfig::builder()
            .network(Network::Testnet)
            .heartbeat_interval(Duration::from_secs(5))
            .pong_timeout(Duration::from_secs(2))
            .build();
        let config = WebSocketConfig::from_client(&client);
        assert_eq!(config.url, "wss://feed.testnet.duedex.com/v1/feed");
        assert_eq!(config.heartbeat_interval(), Duration::from_secs(5));
        assert_eq!(config.pong_timeout(), Duration::from_secs(2));
        assert_eq!(config.reconnect, client.reconnect);
    }

    #[test]
    fn test_deserialize_defaults() {
        let config: WebSocketConfig =
            serde_json::from_str(r#"{"url": "ws://127.0.0.1:1"}"#).unwrap();
        assert_eq!(config.connect_timeout(), Duration::from_secs(10));
        assert_eq!(config.pong_timeout(), Duration::from_secs(10));
        assert_eq!(config.reconnect.initial_delay_ms, 1_000);
    }
}

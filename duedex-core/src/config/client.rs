//! Client configuration.

use super::secret::ApiSecret;
use super::traits::{Configurable, Validatable};
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Venue deployment to connect to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Network {
    /// Production.
    #[default]
    Mainnet,
    /// Public test deployment.
    Testnet,
}

impl Network {
    /// Default REST base URL.
    #[must_use]
    pub const fn rest_base_url(&self) -> &'static str {
        match self {
            Self::Mainnet => "https://api.duedex.com",
            Self::Testnet => "https://api.testnet.duedex.com",
        }
    }

    /// Default streaming feed endpoint.
    #[must_use]
    pub const fn ws_endpoint(&self) -> &'static str {
        match self {
            Self::Mainnet => "wss://feed.duedex.com/v1/feed",
            Self::Testnet => "wss://feed.testnet.duedex.com/v1/feed",
        }
    }
}

impl fmt::Display for Network {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mainnet => write!(f, "mainnet"),
            Self::Testnet => write!(f, "testnet"),
        }
    }
}

impl FromStr for Network {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            other => Err(ConfigError::invalid_value(
                "network",
                format!("expected 'mainnet' or 'testnet', got '{other}'"),
            )),
        }
    }
}

/// API key pair used for feed authentication and REST signing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiCredentials {
    /// Public API key.
    pub key: String,
    /// Base64-encoded secret.
    pub secret: ApiSecret,
}

/// Reconnection policy for the streaming session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReconnectConfig {
    /// Delay before the first retry, in milliseconds.
    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    /// Upper bound for the backoff delay, in milliseconds.
    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,

    /// Factor applied to the delay after each failed attempt.
    #[serde(default = "default_multiplier")]
    pub multiplier: f64,

    /// Consecutive failed attempts before giving up (0 = unlimited).
    #[serde(default)]
    pub max_attempts: u32,
}

fn default_initial_delay_ms() -> u64 {
    1_000
}

fn default_max_delay_ms() -> u64 {
    60_000
}

fn default_multiplier() -> f64 {
    2.0
}

impl Default for ReconnectConfig {
    fn default() -> Self {
        Self {
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
            multiplier: default_multiplier(),
            max_attempts: 0,
        }
    }
}

impl ReconnectConfig {
    /// Delay before retry number `attempt` (0-based), capped at `max_delay_ms`.
    #[must_use]
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap
    )]
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(64) as i32;
        let delay = self.initial_delay_ms as f64 * self.multiplier.powi(exponent);
        let capped = delay.min(self.max_delay_ms as f64) as u64;
        Duration::from_millis(capped)
    }

    /// Returns whether another attempt is allowed after `failures` consecutive failures.
    #[must_use]
    pub fn should_retry(&self, failures: u32) -> bool {
        self.max_attempts == 0 || failures < self.max_attempts
    }
}

/// Top-level client configuration.
///
/// ```
/// use duedex_core::config::{ClientConfig, Network};
///
/// let config = ClientConfig::builder()
///     .network(Network::Testnet)
///     .credentials("key", "c2VjcmV0")
///     .build();
/// assert_eq!(config.ws_endpoint(), "wss://feed.testnet.duedex.com/v1/feed");
/// assert!(config.credentials().is_some());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ClientConfig {
    /// Deployment to connect to.
    #[serde(default)]
    pub network: Network,

    /// Overrides the network's REST base URL.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rest_base_url: Option<String>,

    /// Overrides the network's feed endpoint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ws_endpoint: Option<String>,

    /// Public API key.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    /// Base64-encoded API secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_secret: Option<ApiSecret>,

    /// Reconnection policy.
    #[serde(default)]
    pub reconnect: ReconnectConfig,

    /// Interval between client pings, in milliseconds.
    #[serde(default = "default_heartbeat_interval_ms")]
    pub heartbeat_interval_ms: u64,

    /// How long the feed may stay silent after a ping before the connection
    /// is considered dead, in milliseconds.
    #[serde(default = "default_pong_timeout_ms")]
    pub pong_timeout_ms: u64,

    /// Timeout for establishing the feed connection, in milliseconds.
    #[serde(default = "default_connect_timeout_ms")]
    pub connect_timeout_ms: u64,

    /// Timeout for a REST round trip, in milliseconds.
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,

    /// Validity window of a signed REST request, in milliseconds.
    #[serde(default = "default_request_expiration_ms")]
    pub request_expiration_ms: u64,

    /// Capacity of the event channel before slow subscribers start lagging.
    #[serde(default = "default_event_capacity")]
    pub event_capacity: usize,
}

fn default_heartbeat_interval_ms() -> u64 {
    30_000
}

fn default_pong_timeout_ms() -> u64 {
    10_000
}

fn default_connect_timeout_ms() -> u64 {
    10_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

fn default_request_expiration_ms() -> u64 {
    30_000
}

fn default_event_capacity() -> usize {
    1024
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            network: Network::default(),
            rest_base_url: None,
            ws_endpoint: None,
            api_key: None,
            api_secret: None,
            reconnect: ReconnectConfig::default(),
            heartbeat_interval_ms: default_heartbeat_interval_ms(),
            pong_timeout_ms: default_pong_timeout_ms(),
            connect_timeout_ms: default_connect_timeout_ms(),
            request_timeout_ms: default_request_timeout_ms(),
            request_expiration_ms: default_request_expiration_ms(),
            event_capacity: default_event_capacity(),
        }
    }
}

impl ClientConfig {
    /// Creates a new builder for `ClientConfig`.
    #[must_use]
    pub fn builder() -> ClientConfigBuilder {
        ClientConfigBuilder::default()
    }

    /// Effective REST base URL, without a trailing slash.
    #[must_use]
    pub fn rest_base_url(&self) -> &str {
        self.rest_base_url
            .as_deref()
            .unwrap_or_else(|| self.network.rest_base_url())
            .trim_end_matches('/')
    }

    /// Effective feed endpoint.
    #[must_use]
    pub fn ws_endpoint(&self) -> &str {
        self.ws_endpoint
            .as_deref()
            .unwrap_or_else(|| self.network.ws_endpoint())
    }

    /// Returns the key pair when both halves are configured.
    #[must_use]
    pub fn credentials(&self) -> Option<ApiCredentials> {
        match (&self.api_key, &self.api_secret) {
            (Some(key), Some(secret)) if !key.is_empty() && !secret.is_empty() => {
                Some(ApiCredentials {
                    key: key.clone(),
                    secret: secret.clone(),
                })
            }
            _ => None,
        }
    }

    /// Returns the heartbeat interval as a Duration.
    #[must_use]
    pub fn heartbeat_interval(&self) -> Duration {
        Duration::from_millis(self.heartbeat_interval_ms)
    }

    /// Returns the pong timeout as a Duration.
    #[must_use]
    pub fn pong_timeout(&self) -> Duration {
        Duration::from_millis(self.pong_timeout_ms)
    }

    /// Returns the connect timeout as a Duration.
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }

    /// Returns the REST timeout as a Duration.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

impl Validatable for ClientConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        let has_key = self.api_key.as_ref().is_some_and(|k| !k.is_empty());
        let has_secret = self.api_secret.as_ref().is_some_and(|s| !s.is_empty());
        match (has_key, has_secret) {
            (true, false) => return Err(ConfigError::missing_field("api_secret")),
            (false, true) => return Err(ConfigError::missing_field("api_key")),
            (true, true) => {
                if let Some(secret) = &self.api_secret {
                    secret.decode()?;
                }
            }
            (false, false) => {}
        }

        for (field, url, schemes) in [
            ("ws_endpoint", self.ws_endpoint(), &["ws://", "wss://"]),
            ("rest_base_url", self.rest_base_url(), &["http://", "https://"]),
        ] {
            if !schemes.iter().any(|s| url.starts_with(s)) {
                return Err(ConfigError::invalid_value(
                    field,
                    format!("'{url}' must start with {}", schemes.join(" or ")),
                ));
            }
        }

        let reconnect = &self.reconnect;
        if reconnect.initial_delay_ms == 0 {
            return Err(ConfigError::invalid_value(
                "reconnect.initial_delay_ms",
                "must be positive",
            ));
        }
        if reconnect.max_delay_ms < reconnect.initial_delay_ms {
            return Err(ConfigError::invalid_value(
                "reconnect.max_delay_ms",
                "must not be below initial_delay_ms",
            ));
        }
        if !reconnect.multiplier.is_finite() || reconnect.multiplier < 1.0 {
            return Err(ConfigError::invalid_value(
                "reconnect.multiplier",
                "must be a finite number >= 1",
            ));
        }
        if self.event_capacity == 0 {
            return Err(ConfigError::invalid_value("event_capacity", "must be non-zero"));
        }
        if self.heartbeat_interval_ms == 0 {
            return Err(ConfigError::invalid_value(
                "heartbeat_interval_ms",
                "must be positive",
            ));
        }
        if self.pong_timeout_ms == 0 {
            return Err(ConfigError::invalid_value("pong_timeout_ms", "must be positive"));
        }
        Ok(())
    }
}

impl Configurable for ClientConfig {
    fn apply_env_overrides(&mut self, prefix: &str) -> Result<(), ConfigError> {
        self.apply_overrides_with(prefix, |name| std::env::var(name).ok())
    }

    fn env_var_names(prefix: &str) -> Vec<String> {
        ["NETWORK", "WS_ENDPOINT", "REST_BASE_URL", "API_KEY", "API_SECRET"]
            .iter()
            .map(|name| format!("{prefix}_{name}"))
            .collect()
    }
}

impl ClientConfig {
    /// Applies overrides read through `lookup`, which receives full variable
    /// names such as `DUEDEX_API_KEY`.
    pub fn apply_overrides_with<F>(&mut self, prefix: &str, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let var = |name: &str| lookup(&format!("{prefix}_{name}"));

        if let Some(network) = var("NETWORK") {
            self.network = network.parse().map_err(|_| ConfigError::InvalidEnvVar {
                name: format!("{prefix}_NETWORK"),
                reason: format!("unknown network '{network}'"),
            })?;
        }
        if let Some(url) = var("WS_ENDPOINT") {
            self.ws_endpoint = Some(url);
        }
        if let Some(url) = var("REST_BASE_URL") {
            self.rest_base_url = Some(url);
        }
        if let Some(key) = var("API_KEY") {
            self.api_key = Some(key);
        }
        if let Some(secret) = var("API_SECRET") {
            self.api_secret = Some(ApiSecret::new(secret));
        }
        Ok(())
    }
}

/// Builder for `ClientConfig`.
#[derive(Debug, Default)]
pub struct ClientConfigBuilder {
    config: ClientConfig,
}

impl ClientConfigBuilder {
    /// Sets the network.
    #[must_use]
    pub fn network(mut self, network: Network) -> Self {
        self.config.network = network;
        self
    }

    /// Overrides the REST base URL.
    #[must_use]
    pub fn rest_base_url(mut self, url: impl Into<String>) -> Self {
        self.config.rest_base_url = Some(url.into());
        self
    }

    /// Overrides the feed endpoint.
    #[must_use]
    pub fn ws_endpoint(mut self, url: impl Into<String>) -> Self {
        self.config.ws_endpoint = Some(url.into());
        self
    }

    /// Sets the API key pair.
    #[must_use]
    pub fn credentials(mut self, key: impl Into<String>, secret: impl Into<String>) -> Self {
        self.config.api_key = Some(key.into());
        self.config.api_secret = Some(ApiSecret::new(secret));
        self
    }

    /// Sets the reconnection policy.
    #[must_use]
    pub fn reconnect(mut self, reconnect: ReconnectConfig) -> Self {
        self.config.reconnect = reconnect;
        self
    }

    /// Sets the heartbeat interval.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn heartbeat_interval(mut self, interval: Duration) -> Self {
        self.config.heartbeat_interval_ms = interval.as_millis() as u64;
        self
    }

    /// Sets how long the feed may stay silent after a ping.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn pong_timeout(mut self, timeout: Duration) -> Self {
        self.config.pong_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the connect timeout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn connect_timeout(mut self, timeout: Duration) -> Self {
        self.config.connect_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the REST request timeout.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn request_timeout(mut self, timeout: Duration) -> Self {
        self.config.request_timeout_ms = timeout.as_millis() as u64;
        self
    }

    /// Sets the signed request validity window.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn request_expiration(mut self, expiration: Duration) -> Self {
        self.config.request_expiration_ms = expiration.as_millis() as u64;
        self
    }

    /// Sets the event channel capacity.
    #[must_use]
    pub fn event_capacity(mut self, capacity: usize) -> Self {
        self.config.event_capacity = capacity;
        self
    }

    /// Builds the configuration.
    #[must_use]
    pub fn build(self) -> ClientConfig {
        self.config
    }
}

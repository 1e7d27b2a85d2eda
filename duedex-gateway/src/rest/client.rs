//! Signed REST client.

use duedex_core::config::ClientConfig;
use duedex_core::error::{ExchangeError, NetworkError, Result};
use duedex_telemetry::masking::SensitiveDataMasker;
use duedex_telemetry::spans::rest_request_span;
use reqwest::{Client, Method, header};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{Instrument, debug, trace};

use super::signer::{RequestSigner, build_query_string, timestamp_ms};

/// Response envelope shared by every endpoint.
#[derive(Debug, Clone, Deserialize)]
struct ApiResponse {
    code: i64,
    #[serde(default)]
    data: serde_json::Value,
    #[serde(default)]
    message: String,
}

/// Source of request timestamps in Unix milliseconds.
pub type TimestampFn = Arc<dyn Fn() -> i64 + Send + Sync>;

struct SigningKey {
    key: String,
    signer: RequestSigner,
}

/// HTTP client for the venue's REST interface.
///
/// Requests marked `signed` carry the `Ddx-*` authentication headers.
/// Failures are returned to the caller and never retried.
pub struct RestClient {
    base_url: String,
    http_client: Client,
    signing: Option<SigningKey>,
    timeout_ms: u64,
    expiration_ms: u64,
    timestamp_fn: TimestampFn,
}

impl RestClient {
    /// Creates a client from the client configuration.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .build()
            .map_err(|e| NetworkError::ConnectionFailed {
                reason: format!("Failed to create HTTP client: {e}"),
            })?;

        let signing = config
            .credentials()
            .map(|c| {
                RequestSigner::from_secret(&c.secret).map(|signer| SigningKey { key: c.key, signer })
            })
            .transpose()?;

        Ok(Self {
            base_url: config.rest_base_url().to_string(),
            http_client,
            signing,
            timeout_ms: config.request_timeout_ms,
            expiration_ms: config.request_expiration_ms,
            timestamp_fn: Arc::new(timestamp_ms),
        })
    }

    /// Replaces the clock used for `Ddx-Timestamp`.
    #[must_use]
    pub fn with_timestamp_fn(mut self, timestamp_fn: TimestampFn) -> Self {
        self.timestamp_fn = timestamp_fn;
        self
    }

    /// Returns true if signed requests can be made.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.signing.is_some()
    }

    /// Creates a GET request builder.
    #[must_use]
    pub fn get(&self, path: &str) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::GET, path)
    }

    /// Creates a POST request builder.
    #[must_use]
    pub fn post(&self, path: &str) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::POST, path)
    }

    /// Creates a DELETE request builder.
    #[must_use]
    pub fn delete(&self, path: &str) -> RequestBuilder<'_> {
        RequestBuilder::new(self, Method::DELETE, path)
    }

    /// Builds the full URL for a path.
    #[must_use]
    pub fn build_url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    async fn execute(
        &self,
        method: Method,
        path: &str,
        query: &str,
        body: &str,
        sign: bool,
    ) -> Result<serde_json::Value> {
        let url = if query.is_empty() {
            self.build_url(path)
        } else {
            format!("{}?{query}", self.build_url(path))
        };

        let mut request = self.http_client.request(method.clone(), &url);

        if !body.is_empty() {
            request = request
                .header(header::CONTENT_TYPE, "application/json")
                .body(body.to_string());
        }

        if sign {
            let signing = self
                .signing
                .as_ref()
                .ok_or(ExchangeError::MissingCredentials)?;
            let timestamp = (self.timestamp_fn)();
            let expiration = timestamp.saturating_add(i64::try_from(self.expiration_ms).unwrap_or(i64::MAX));
            let signature = signing
                .signer
                .sign(method.as_str(), path, timestamp, expiration, query, body);
            let masker = SensitiveDataMasker::new();
            trace!(
                key = %masker.mask_value(&signing.key),
                signature = %masker.mask_value(&signature),
                "Request signed"
            );
            request = request
                .header("Ddx-Timestamp", timestamp.to_string())
                .header("Ddx-Expiration", expiration.to_string())
                .header("Ddx-Key", signing.key.as_str())
                .header("Ddx-Signature", signature);
        }

        debug!(method = %method, url = %url, signed = sign, "Sending request");

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                NetworkError::Timeout {
                    timeout_ms: self.timeout_ms,
                }
            } else if e.is_connect() {
                NetworkError::ConnectionFailed {
                    reason: e.to_string(),
                }
            } else {
                NetworkError::Http {
                    status_code: e.status().map_or(0, |s| s.as_u16()),
                    reason: e.to_string(),
                }
            }
        })?;

        let status = response.status();
        let text = response.text().await.map_err(|e| NetworkError::Http {
            status_code: status.as_u16(),
            reason: format!("Failed to read body: {e}"),
        })?;
        trace!(status = status.as_u16(), body = %text, "Response received");

        let envelope: ApiResponse = match serde_json::from_str(&text) {
            Ok(envelope) => envelope,
            Err(_) if !status.is_success() => {
                return Err(NetworkError::Http {
                    status_code: status.as_u16(),
                    reason: text.chars().take(200).collect(),
                }
                .into());
            }
            Err(e) => {
                return Err(ExchangeError::InvalidResponse {
                    reason: e.to_string(),
                }
                .into());
            }
        };

        if envelope.code != 0 {
            return Err(ExchangeError::Api {
                code: envelope.code,
                message: envelope.message,
            }
            .into());
        }
        Ok(envelope.data)
    }
}

/// Request builder for REST API calls.
pub struct RequestBuilder<'a> {
    client: &'a RestClient,
    method: Method,
    path: String,
    params: Vec<(String, String)>,
    body: std::result::Result<Option<String>, String>,
    sign: bool,
}

impl<'a> RequestBuilder<'a> {
    fn new(client: &'a RestClient, method: Method, path: &str) -> Self {
        Self {
            client,
            method,
            path: path.to_string(),
            params: Vec::new(),
            body: Ok(None),
            sign: false,
        }
    }

    /// Adds a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Sets the request body as JSON.
    #[must_use]
    pub fn json<T: Serialize>(mut self, body: &T) -> Self {
        self.body = serde_json::to_string(body)
            .map(Some)
            .map_err(|e| e.to_string());
        self
    }

    /// Enables request signing.
    #[must_use]
    pub fn signed(mut self) -> Self {
        self.sign = true;
        self
    }

    /// Sends the request and decodes the envelope's `data`.
    pub async fn send<T: DeserializeOwned>(self) -> Result<T> {
        let span = rest_request_span(self.method.as_str(), &self.path);
        async move {
            let body = self
                .body
                .map_err(|reason| ExchangeError::InvalidResponse {
                    reason: format!("Failed to serialize request body: {reason}"),
                })?
                .unwrap_or_default();
            let query = build_query_string(&self.params);

            let data = self
                .client
                .execute(self.method, &self.path, &query, &body, self.sign)
                .await?;
            serde_json::from_value(data).map_err(|e| {
                ExchangeError::InvalidResponse {
                    reason: e.to_string(),
                }
                .into()
            })
        }
        .instrument(span)
        .await
    }
}

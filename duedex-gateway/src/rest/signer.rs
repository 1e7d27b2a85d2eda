//! Request signing utilities.
//!
//! The venue authenticates REST requests and the feed handshake with the same
//! primitive: lowercase-hex HMAC-SHA256 keyed by the base64-decoded API secret.

use duedex_core::config::ApiSecret;
use duedex_core::error::ExchangeError;
use hmac::{Hmac, Mac};
use sha2::Sha256;
use std::fmt;

type HmacSha256 = Hmac<Sha256>;

/// HMAC-SHA256 signer holding a pre-keyed MAC.
///
/// The decoded key bytes only live long enough to initialise the MAC.
#[derive(Clone)]
pub struct RequestSigner {
    mac: HmacSha256,
}

impl RequestSigner {
    /// Creates a signer from a base64-encoded API secret.
    pub fn from_secret(secret: &ApiSecret) -> Result<Self, ExchangeError> {
        let key = secret
            .decode()
            .map_err(|e| ExchangeError::InvalidCredentials {
                reason: e.to_string(),
            })?;
        Self::from_key(&key)
    }

    /// Creates a signer from raw key bytes.
    pub fn from_key(key: &[u8]) -> Result<Self, ExchangeError> {
        let mac = HmacSha256::new_from_slice(key).map_err(|e| ExchangeError::InvalidCredentials {
            reason: format!("Failed to create HMAC: {e}"),
        })?;
        Ok(Self { mac })
    }

    /// Signs a message and returns the lowercase hex signature.
    #[must_use]
    pub fn sign_hex(&self, message: &str) -> String {
        let mut mac = self.mac.clone();
        mac.update(message.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }

    /// Signs a REST request.
    ///
    /// `query` is the rendered query string for GET requests and `body` the
    /// exact JSON text sent for every other method; the unused one is empty.
    #[must_use]
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        timestamp: i64,
        expiration: i64,
        query: &str,
        body: &str,
    ) -> String {
        self.sign_hex(&canonical_message(method, path, timestamp, expiration, query, body))
    }
}

impl fmt::Debug for RequestSigner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RequestSigner").finish_non_exhaustive()
    }
}

/// Builds the canonical string that REST signatures cover.
#[must_use]
pub fn canonical_message(
    method: &str,
    path: &str,
    timestamp: i64,
    expiration: i64,
    query: &str,
    body: &str,
) -> String {
    format!(
        "{}|{path}|{timestamp}|{expiration}|{query}|{body}",
        method.to_ascii_uppercase()
    )
}

/// Builds a query string from parameters.
///
/// Parameters are sorted by key and their values URL-encoded.
#[must_use]
pub fn build_query_string(params: &[(String, String)]) -> String {
    let mut sorted: Vec<_> = params.iter().collect();
    sorted.sort_by(|(a, _), (b, _)| a.cmp(b));

    sorted
        .iter()
        .map(|(k, v)| format!("{k}={}", urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

/// Returns the current timestamp in milliseconds.
#[must_use]
pub fn timestamp_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

//! API secret with zero-on-drop storage.

use crate::error::ConfigError;
use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// Base64-encoded API secret as issued by the venue.
///
/// The encoded text and any decoded copy are wiped from memory when dropped.
///
/// ```
/// use duedex_core::config::ApiSecret;
///
/// let secret = ApiSecret::new("c2VjcmV0");
/// assert_eq!(secret.decode().unwrap().as_slice(), b"secret");
/// assert_eq!(format!("{secret:?}"), "ApiSecret([REDACTED])");
/// ```
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct ApiSecret {
    encoded: String,
}

impl ApiSecret {
    /// Wraps a base64-encoded secret.
    #[must_use]
    pub fn new(encoded: impl Into<String>) -> Self {
        Self {
            encoded: encoded.into(),
        }
    }

    /// Returns the encoded secret. Never log the result.
    #[must_use]
    pub fn expose(&self) -> &str {
        &self.encoded
    }

    /// Returns the raw key bytes used for HMAC signing.
    pub fn decode(&self) -> Result<Zeroizing<Vec<u8>>, ConfigError> {
        STANDARD
            .decode(self.encoded.trim())
            .map(Zeroizing::new)
            .map_err(|e| ConfigError::invalid_value("api_secret", format!("not valid base64: {e}")))
    }

    /// Returns true if no secret text was supplied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.encoded.trim().is_empty()
    }
}

impl fmt::Debug for ApiSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ApiSecret([REDACTED])")
    }
}

impl PartialEq for ApiSecret {
    fn eq(&self, other: &Self) -> bool {
        let (a, b) = (self.encoded.as_bytes(), other.encoded.as_bytes());
        if a.len() != b.len() {
            return false;
        }
        a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
    }
}

impl Eq for ApiSecret {}

impl Serialize for ApiSecret {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.encoded)
    }
}

impl<'de> Deserialize<'de> for ApiSecret {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        String::deserialize(deserializer).map(Self::new)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_base64() {
        let secret = ApiSecret::new("not base64!");
        let err = secret.decode().unwrap_err();
        assert!(err.to_string().contains("api_secret"));
    }

    #[test]
    fn test_display_never_leaks() {
        let secret = ApiSecret::new("c2VjcmV0");
        assert!(!format!("{secret:?}").contains("c2VjcmV0"));
    }

    #[test]
    fn test_deserialize_from_string() {
        let secret: ApiSecret = serde_json::from_str("\"c2VjcmV0\"").unwrap();
        assert_eq!(secret, ApiSecret::new("c2VjcmV0"));
        assert_ne!(secret, ApiSecret::new("c2VjcmV1"));
    }
}

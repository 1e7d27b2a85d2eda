//! Venue API error types.
//!
//! Raised synchronously from REST calls. None of them is retried automatically.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors reported by, or about, the venue's REST interface.
///
/// ```
/// use duedex_core::error::ExchangeError;
///
/// let error = ExchangeError::Api { code: 1001, message: "Order not found".to_string() };
/// assert!(error.to_string().contains("1001"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExchangeError {
    /// The response envelope carried a non-zero `code`.
    #[error("[Exchange] API error {code}: {message}")]
    Api {
        /// Application error code.
        code: i64,
        /// Human-readable message from the venue.
        message: String,
    },

    /// The response body could not be interpreted.
    #[error("[Exchange] Invalid response: {reason}")]
    InvalidResponse {
        /// Why the body was rejected.
        reason: String,
    },

    /// A signed endpoint was called without an API key pair.
    #[error("[Exchange] API credentials are required for this request")]
    MissingCredentials,

    /// The configured secret cannot be used for signing.
    #[error("[Exchange] Invalid credentials: {reason}")]
    InvalidCredentials {
        /// Why the credentials were rejected.
        reason: String,
    },
}

impl ExchangeError {
    /// Returns the venue error code, if any.
    #[must_use]
    pub const fn code(&self) -> Option<i64> {
        match self {
            Self::Api { code, .. } => Some(*code),
            _ => None,
        }
    }

    /// Venue rejections are never retried.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        false
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub const fn severity(&self) -> super::ErrorSeverity {
        match self {
            Self::Api { .. } | Self::InvalidResponse { .. } => super::ErrorSeverity::Warning,
            Self::MissingCredentials | Self::InvalidCredentials { .. } => {
                super::ErrorSeverity::Fatal
            }
        }
    }
}

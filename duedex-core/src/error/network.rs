//! Transport-level error types.
//!
//! Every variant here describes a failure of the physical connection or an
//! HTTP exchange. The streaming session treats all of them as retryable.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Network error type covering connect, read, write and HTTP failures.
///
/// ```
/// use duedex_core::error::NetworkError;
///
/// let error = NetworkError::ConnectionFailed {
///     reason: "Connection refused".to_string(),
/// };
/// assert!(error.to_string().contains("Connection refused"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NetworkError {
    /// Connection to remote host failed.
    #[error("[Network] Connection failed: {reason}")]
    ConnectionFailed {
        /// Reason for the connection failure.
        reason: String,
    },

    /// Operation timed out.
    #[error("[Network] Timeout after {timeout_ms}ms")]
    Timeout {
        /// Timeout duration in milliseconds.
        timeout_ms: u64,
    },

    /// WebSocket protocol error while reading.
    #[error("[Network] WebSocket error: {reason}")]
    WebSocket {
        /// Reason for the WebSocket error.
        reason: String,
    },

    /// Writing a frame to the socket failed.
    #[error("[Network] Send failed: {reason}")]
    SendFailed {
        /// Reason for the write failure.
        reason: String,
    },

    /// HTTP request failed at the transport or status level.
    #[error("[Network] HTTP error: status {status_code} - {reason}")]
    Http {
        /// HTTP status code (0 when no response was received).
        status_code: u16,
        /// Reason for the HTTP error.
        reason: String,
    },

    /// Connection was closed by the peer or locally.
    #[error("[Network] Connection closed: {reason}")]
    ConnectionClosed {
        /// Reason for the connection closure.
        reason: String,
    },
}

impl NetworkError {
    /// Returns true if this error is recoverable (can be retried).
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Http { status_code, .. } => *status_code == 0 || *status_code >= 500,
            _ => true,
        }
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> super::ErrorSeverity {
        use super::ErrorSeverity;
        match self {
            Self::Http { .. } if !self.is_recoverable() => ErrorSeverity::Fatal,
            _ => ErrorSeverity::Recoverable,
        }
    }
}

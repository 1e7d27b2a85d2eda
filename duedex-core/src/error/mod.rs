//! Error types and handling framework.
//!
//! The error system is organized hierarchically:
//! - `DuedexError` - Top-level error type
//!   - `NetworkError` - Transport failures (connect, read, write, HTTP)
//!   - `DataError` - Protocol errors in feed messages and payloads
//!   - `ExchangeError` - REST application errors reported by the venue
//!   - `ConfigError` - Configuration errors
//!
//! ```
//! use duedex_core::error::{DuedexError, ExchangeError};
//!
//! let error = DuedexError::from(ExchangeError::Api {
//!     code: 1001,
//!     message: "Insufficient margin".to_string(),
//! });
//! assert!(!error.is_recoverable());
//! assert_eq!(error.category(), "exchange");
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Error severity levels for categorizing errors.
///
/// - `Fatal`: the operation cannot succeed without intervention
/// - `Recoverable`: retrying or reconnecting may succeed
/// - `Warning`: the offending input was dropped, processing continues
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ErrorSeverity {
    /// Unrecoverable error requiring intervention.
    Fatal,
    /// Error that can be recovered from through retry or reconnect.
    #[default]
    Recoverable,
    /// Non-critical issue that is logged and skipped.
    Warning,
}

impl ErrorSeverity {
    /// Returns true if this error is recoverable (not fatal).
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Fatal)
    }

    /// Returns true if this error is fatal.
    #[must_use]
    pub const fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal)
    }

    /// Returns the severity as a static string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Fatal => "FATAL",
            Self::Recoverable => "RECOVERABLE",
            Self::Warning => "WARNING",
        }
    }
}

impl fmt::Display for ErrorSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

mod config;
mod data;
mod exchange;
mod network;

pub use config::ConfigError;
pub use data::DataError;
pub use exchange::ExchangeError;
pub use network::NetworkError;

/// Top-level error type for the DueDEX client.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuedexError {
    /// Transport error.
    #[error("{0}")]
    Network(#[from] NetworkError),

    /// Venue API error.
    #[error("{0}")]
    Exchange(#[from] ExchangeError),

    /// Protocol or payload error.
    #[error("{0}")]
    Data(#[from] DataError),

    /// Configuration error.
    #[error("{0}")]
    Config(#[from] ConfigError),
}

impl DuedexError {
    /// Returns the severity level of this error.
    #[must_use]
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            Self::Network(e) => e.severity(),
            Self::Exchange(e) => e.severity(),
            Self::Data(e) => e.severity(),
            Self::Config(e) => e.severity(),
        }
    }

    /// Returns true if this error is recoverable.
    #[must_use]
    pub fn is_recoverable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_recoverable(),
            Self::Exchange(e) => e.is_recoverable(),
            Self::Data(e) => e.is_recoverable(),
            Self::Config(_) => false,
        }
    }

    /// Returns the error category as a string.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Exchange(_) => "exchange",
            Self::Data(_) => "data",
            Self::Config(_) => "config",
        }
    }
}

/// Result type alias using `DuedexError`.
pub type Result<T> = std::result::Result<T, DuedexError>;

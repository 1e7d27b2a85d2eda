//! Protocol and payload error types.
//!
//! A `DataError` always concerns a single feed message or a single entry in
//! a batch. The session logs it, drops the offending input and keeps going.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors raised while decoding or applying a feed message.
///
/// ```
/// use duedex_core::error::DataError;
///
/// let error = DataError::missing_field("Margin", "available");
/// assert!(error.to_string().contains("available"));
/// ```
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DataError {
    /// Message text is not a valid envelope.
    #[error("[Data] Invalid message: {reason}")]
    InvalidMessage {
        /// Parser diagnostic.
        reason: String,
    },

    /// Envelope `type` is not one the client understands.
    #[error("[Data] Unknown message type '{message_type}'")]
    UnknownType {
        /// Offending `type` value.
        message_type: String,
    },

    /// Envelope `channel` is missing or unknown for a data message.
    #[error("[Data] Unknown channel '{channel}'")]
    UnknownChannel {
        /// Offending `channel` value (empty when absent).
        channel: String,
    },

    /// Payload did not match the shape expected for its channel.
    #[error("[Data] Failed to decode {channel} payload: {reason}")]
    Decode {
        /// Channel whose payload failed to decode.
        channel: String,
        /// Decoder diagnostic.
        reason: String,
    },

    /// A record for a never-seen key lacked a mandatory field.
    #[error("[Data] Cannot create {entity}: missing field '{field}'")]
    MissingField {
        /// Entity kind being constructed.
        entity: String,
        /// First missing field.
        field: String,
    },

    /// An orderbook level carried an unusable size.
    #[error("[Data] Invalid level at price {price}: {reason}")]
    InvalidLevel {
        /// Level price as received.
        price: String,
        /// Why the level was rejected.
        reason: String,
    },

    /// An incremental update arrived for state that has no valid snapshot.
    #[error("[Data] No snapshot for {channel} '{key}'")]
    MissingSnapshot {
        /// Channel of the update.
        channel: String,
        /// Instrument or other key the update targeted.
        key: String,
    },
}

impl DataError {
    /// Creates a `MissingField` error.
    #[must_use]
    pub fn missing_field(entity: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            entity: entity.into(),
            field: field.into(),
        }
    }

    /// Creates a `Decode` error for a channel payload.
    #[must_use]
    pub fn decode(channel: impl Into<String>, reason: impl ToString) -> Self {
        Self::Decode {
            channel: channel.into(),
            reason: reason.to_string(),
        }
    }

    /// Protocol errors never poison the session, so they are always recoverable.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        true
    }

    /// Returns the severity level of this error.
    #[must_use]
    pub const fn severity(&self) -> super::ErrorSeverity {
        super::ErrorSeverity::Warning
    }
}

//! Configuration-related error types.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration error type covering missing fields, invalid values,
/// and file access errors.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigError {
    /// Required configuration field is missing.
    #[error("[Config] Missing field '{field}'")]
    MissingField {
        /// Name of the missing field.
        field: String,
    },

    /// Configuration value is invalid.
    #[error("[Config] Invalid value for '{field}': {reason}")]
    InvalidValue {
        /// Field with the invalid value.
        field: String,
        /// Reason why the value is invalid.
        reason: String,
    },

    /// Configuration file could not be read.
    #[error("[Config] Failed to read file '{path}': {reason}")]
    FileReadError {
        /// Path to the configuration file.
        path: String,
        /// Reason for the read failure.
        reason: String,
    },

    /// Configuration content could not be parsed.
    #[error("[Config] Invalid format in '{path}': {reason}")]
    InvalidFormat {
        /// Path to the configuration file.
        path: String,
        /// Reason for the format error.
        reason: String,
    },

    /// Environment variable has an invalid value.
    #[error("[Config] Invalid environment variable '{name}': {reason}")]
    InvalidEnvVar {
        /// Name of the environment variable.
        name: String,
        /// Reason why the value is invalid.
        reason: String,
    },
}

impl ConfigError {
    /// Creates a `MissingField` error.
    #[must_use]
    pub fn missing_field(field: impl Into<String>) -> Self {
        Self::MissingField {
            field: field.into(),
        }
    }

    /// Creates an `InvalidValue` error.
    #[must_use]
    pub fn invalid_value(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::InvalidValue {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Configuration errors are always fatal.
    #[must_use]
    pub const fn severity(&self) -> super::ErrorSeverity {
        super::ErrorSeverity::Fatal
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_helpers() {
        let error = ConfigError::missing_field("api_key");
        assert!(error.to_string().contains("api_key"));

        let error = ConfigError::invalid_value("event_capacity", "must be non-zero");
        assert!(matches!(error, ConfigError::InvalidValue { .. }));
        assert!(error.severity().is_fatal());
    }
}

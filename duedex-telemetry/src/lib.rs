//! # DueDEX Telemetry
//!
//! Logging and tracing support for the DueDEX client.
//!
//! This crate provides:
//! - Structured logging with JSON and pretty formats
//! - Rolling file output
//! - Masking of API keys, secrets and request signatures
//! - Span constructors for feed sessions and REST calls

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

/// Logging configuration and initialization
pub mod logging;

/// Sensitive data masking
pub mod masking;

/// Span definitions
pub mod spans;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::logging::{LogConfig, LogFormat, LogOutput, init_logging};
    pub use crate::masking::SensitiveDataMasker;
    pub use crate::spans::*;
}

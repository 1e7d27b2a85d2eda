//! # DueDEX Core
//!
//! Core types shared by the DueDEX connectivity crates.
//!
//! This crate provides:
//! - Domain models for the venue's entities (orders, tickers, margins, positions,
//!   matches, executions) and the orderbook ladder
//! - Presence-tagged patch types used to merge partial feed updates
//! - Error types and handling framework
//! - Configuration management with YAML/TOML/JSON support and environment variable overrides

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::missing_panics_doc)]
#![allow(clippy::missing_const_for_fn)]
#![allow(clippy::module_name_repetitions)]

/// Error types and handling
pub mod error;

/// Venue domain models
pub mod models;

/// Configuration management
pub mod config;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::models::*;
}

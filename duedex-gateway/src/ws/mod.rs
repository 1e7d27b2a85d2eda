//! WebSocket transport.
//!
//! Provides the physical connection used by the feed session:
//! - Connect with timeout
//! - Whole-message reads with close and pong detection
//! - Text and JSON writes plus client pings
//! - Session state tracking

mod config;
mod connection;
mod state;

pub use config::WebSocketConfig;
pub use connection::{Incoming, WsReader, WsWriter, connect};
pub use state::{SessionState, SessionStatus};

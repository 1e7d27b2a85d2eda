//! # DueDEX Gateway
//!
//! Connectivity for the DueDEX derivatives venue.
//!
//! This crate provides:
//! - A reconnecting WebSocket feed session with challenge/response authentication
//! - A channel registry that replays subscriptions after every (re)connect
//! - Entity stores (orderbooks, tickers, margins, positions, active orders) kept
//!   current from snapshot and diff messages, readable from any thread
//! - A broadcast event stream announcing every applied change
//! - A signed REST client for order entry
//! - The [`DuedexClient`] facade tying them together
//!
//! ## Example
//!
//! ```ignore
//! use duedex_core::config::{ClientConfig, Network};
//! use duedex_core::models::ChannelKind;
//! use duedex_gateway::DuedexClient;
//!
//! let client = DuedexClient::new(ClientConfig::builder().network(Network::Testnet).build())?;
//! client.subscribe(ChannelKind::Level2, &["BTCUSD"]);
//! let mut events = client.events();
//! let handle = client.start();
//! while let Ok(event) = events.recv().await {
//!     println!("{event:?}");
//! }
//! handle.shutdown().await;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::missing_errors_doc)]
#![allow(clippy::module_name_repetitions)]

/// WebSocket transport
pub mod ws;

/// Streaming feed session: channels, authentication, routing and events
pub mod feed;

/// Entity stores
pub mod store;

/// Signed REST client
pub mod rest;

mod client;

pub use client::DuedexClient;
pub use feed::{Channel, ChannelRegistry, FeedEvent, FeedHandle, FeedSession};
pub use ws::SessionState;

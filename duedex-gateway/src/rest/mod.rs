//! Signed REST client.
//!
//! Every signed request carries `Ddx-Timestamp`, `Ddx-Expiration`, `Ddx-Key`
//! and `Ddx-Signature` headers. The signature is the lowercase-hex
//! HMAC-SHA256 of `METHOD|PATH|TIMESTAMP|EXPIRATION|QUERY|BODY`.
//!
//! # Example
//!
//! ```ignore
//! use duedex_gateway::rest::{NewOrder, RestClient};
//!
//! let client = RestClient::new(&config)?;
//! let order = client
//!     .new_order(&NewOrder::limit("BTCUSD", OrderSide::Long, dec!(9000), 100))
//!     .await?;
//! client.cancel_order("BTCUSD", order.order_id).await?;
//! ```

mod client;
mod orders;
pub mod signer;

pub use client::{RequestBuilder, RestClient};
pub use orders::NewOrder;
pub use signer::RequestSigner;

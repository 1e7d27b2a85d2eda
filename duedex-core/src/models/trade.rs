//! Append-only trade facts: public matches and private executions.
//!
//! These are forwarded to subscribers per message and never stored.

use super::enums::{OrderSide, OrderType, TickDirection};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A public trade on an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Match {
    /// Instrument symbol.
    #[serde(default)]
    pub instrument: String,
    /// Venue trade id.
    pub match_id: i64,
    /// Trade price.
    pub price: Decimal,
    /// Trade size in contracts.
    pub size: i64,
    /// Taker side.
    pub side: OrderSide,
    /// Tick direction relative to the previous trade.
    pub tick_direction: TickDirection,
    /// Trade time.
    pub timestamp: DateTime<Utc>,
}

/// A fill of one of the account's orders.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Execution {
    /// Instrument symbol.
    pub instrument: String,
    /// Venue execution id.
    pub execution_id: i64,
    /// Order that was filled.
    pub order_id: i64,
    /// Client-assigned order id, if any.
    #[serde(default)]
    pub client_order_id: Option<String>,
    /// Type of the filled order.
    pub order_type: OrderType,
    /// Side of the filled order.
    pub order_side: OrderSide,
    /// Limit price of the filled order; absent for market orders.
    #[serde(default)]
    pub order_price: Option<Decimal>,
    /// Original order size.
    pub order_size: i64,
    /// Fill price.
    pub execution_price: Decimal,
    /// Fill size.
    pub execution_size: i64,
    /// Whether the order provided liquidity.
    pub is_maker: bool,
    /// Fee rate applied.
    pub fee_rate: Decimal,
    /// Fee charged; negative for rebates.
    pub fee: Decimal,
    /// Size still open after this fill.
    pub order_size_left: i64,
    /// Fill time.
    pub timestamp: DateTime<Utc>,
}

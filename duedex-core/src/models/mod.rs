//! Venue domain models.
//!
//! Prices and amounts are [`rust_decimal::Decimal`], sizes are whole contract
//! counts (`i64`) and times are UTC.

mod enums;
mod margin;
mod order;
mod orderbook;
mod patch;
mod position;
mod ticker;
mod trade;

pub use enums::{ChannelKind, OrderSide, OrderStatus, OrderType, TickDirection, TimeInForce};
pub use margin::{Margin, MarginUpdate};
pub use order::{Order, OrderKey, OrderUpdate};
pub use orderbook::{BookSide, Orderbook, OrderbookData, OrderbookLevel, RawLevel};
pub use patch::{Keyed, Patch};
pub use position::{Position, PositionUpdate};
pub use ticker::{Ticker, TickerUpdate};
pub use trade::{Execution, Match};

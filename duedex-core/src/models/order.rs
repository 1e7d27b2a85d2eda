//! Orders and their composite identity.

use super::enums::{OrderSide, OrderStatus, OrderType, TimeInForce};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of an order: order ids are only unique within an instrument.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct OrderKey {
    /// Instrument symbol.
    pub instrument: String,
    /// Venue-assigned order id.
    pub order_id: i64,
}

impl OrderKey {
    /// Creates a new order key.
    #[must_use]
    pub fn new(instrument: impl Into<String>, order_id: i64) -> Self {
        Self {
            instrument: instrument.into(),
            order_id,
        }
    }
}

impl fmt::Display for OrderKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.instrument, self.order_id)
    }
}

crate::entity_patch! {
    /// An order as last reported by the venue.
    pub struct Order;
    /// Partial order update keyed by instrument and order id.
    pub struct OrderUpdate;
    key OrderKey = |o| OrderKey::new(o.instrument.as_str(), o.order_id);
    key_fields {
        /// Instrument symbol.
        instrument: String,
        /// Venue-assigned order id.
        order_id: i64,
    }
    required {
        /// Order type.
        #[serde(rename = "type")]
        order_type: OrderType,
        /// Whether the order can only reduce a position.
        is_close_order: bool,
        /// Order side.
        side: OrderSide,
        /// Size in contracts.
        size: i64,
        /// Time-in-force policy.
        time_in_force: TimeInForce,
        /// Notional value.
        notional_value: Decimal,
        /// Lifecycle status.
        status: OrderStatus,
        /// Average fill price.
        fill_price: Decimal,
        /// Filled size in contracts.
        filled_size: i64,
        /// Fees charged so far.
        accumulated_fees: Decimal,
        /// Creation time.
        create_time: DateTime<Utc>,
        /// Last modification time.
        update_time: DateTime<Utc>,
    }
    optional {
        /// Client-assigned id, if one was supplied at submission.
        client_order_id: String,
        /// Limit price; absent for market orders.
        price: Decimal,
    }
}

impl Order {
    /// Returns true if the order is still working.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        !self.status.is_terminal()
    }

    /// Returns the unfilled size, saturating on out-of-range wire values.
    #[must_use]
    pub const fn remaining_size(&self) -> i64 {
        self.size.saturating_sub(self.filled_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Keyed, Patch};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn order_json(order_id: i64, status: &str) -> serde_json::Value {
        json!({
            "instrument": "BTCUSD",
            "orderId": order_id,
            "clientOrderId": "client-1",
            "type": "limit",
            "isCloseOrder": false,
            "side": "long",
            "price": "9000.5",
            "size": 100,
            "timeInForce": "gtc",
            "notionalValue": "0.0111",
            "status": status,
            "fillPrice": "0",
            "filledSize": 0,
            "accumulatedFees": "0",
            "createTime": "2020-03-01T00:00:00Z",
            "updateTime": "2020-03-01T00:00:00Z"
        })
    }

    #[test]
    fn test_key_is_composite() {
        let order: Order = serde_json::from_value(order_json(7, "new")).unwrap();
        assert_eq!(order.key(), OrderKey::new("BTCUSD", 7));
        assert_ne!(order.key(), OrderKey::new("ETHUSD", 7));
        assert_eq!(order.key().to_string(), "BTCUSD#7");
    }

    #[test]
    fn test_status_update() {
        let mut order: Order = serde_json::from_value(order_json(7, "new")).unwrap();
        let update: OrderUpdate = serde_json::from_value(json!({
            "instrument": "BTCUSD",
            "orderId": 7,
            "status": "partiallyFilled",
            "filledSize": 40,
            "fillPrice": "9000.5"
        }))
        .unwrap();
        update.apply_to(&mut order);

        assert_eq!(order.status, OrderStatus::PartiallyFilled);
        assert_eq!(order.remaining_size(), 60);
        assert_eq!(order.price, Some(dec!(9000.5)));
        assert!(order.is_active());
    }

    #[test]
    fn test_remaining_size_saturates() {
        let mut order: Order = serde_json::from_value(order_json(7, "new")).unwrap();
        order.size = i64::MAX;
        order.filled_size = -1;
        assert_eq!(order.remaining_size(), i64::MAX);

        order.size = i64::MIN;
        order.filled_size = 1;
        assert_eq!(order.remaining_size(), i64::MIN);
    }

    #[test]
    fn test_market_order_without_price() {
        let mut payload = order_json(8, "filled");
        payload["type"] = json!("market");
        payload.as_object_mut().unwrap().remove("price");
        payload.as_object_mut().unwrap().remove("clientOrderId");

        let update: OrderUpdate = serde_json::from_value(payload).unwrap();
        let order = update.into_entity().unwrap();
        assert_eq!(order.price, None);
        assert_eq!(order.client_order_id, None);
        assert!(!order.is_active());
    }

    #[test]
    fn test_update_does_not_clear_price() {
        let mut order: Order = serde_json::from_value(order_json(7, "new")).unwrap();
        let update: OrderUpdate = serde_json::from_value(
            json!({"instrument": "BTCUSD", "orderId": 7, "price": null}),
        )
        .unwrap();
        update.apply_to(&mut order);
        assert_eq!(order.price, Some(dec!(9000.5)));
    }
}

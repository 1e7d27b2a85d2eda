//! Order entry endpoints.

use duedex_core::error::Result;
use duedex_core::models::{Keyed, Order, OrderSide, OrderType, TimeInForce};
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::info;

use super::client::RestClient;

const ORDER_PATH: &str = "/v1/order";

/// A new order request.
///
/// ```
/// use duedex_core::models::{OrderSide, TimeInForce};
/// use duedex_gateway::rest::NewOrder;
/// use rust_decimal_macros::dec;
///
/// let order = NewOrder::limit("BTCUSD", OrderSide::Long, dec!(9000), 100)
///     .with_client_order_id("my-order-1")
///     .with_time_in_force(TimeInForce::Fok);
/// assert_eq!(order.time_in_force, Some(TimeInForce::Fok));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewOrder {
    /// Instrument symbol.
    pub instrument: String,
    /// Client-assigned id.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_order_id: Option<String>,
    /// Order type.
    #[serde(rename = "type")]
    pub order_type: OrderType,
    /// Whether the order may only reduce a position.
    pub is_close_order: bool,
    /// Side; omitted for close orders, which take the side opposite the position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub side: Option<OrderSide>,
    /// Limit price.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub price: Option<Decimal>,
    /// Size in contracts; omitted for close orders, which close the whole position.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub size: Option<i64>,
    /// Time-in-force policy.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub time_in_force: Option<TimeInForce>,
}

impl NewOrder {
    /// A limit order, good till cancelled.
    #[must_use]
    pub fn limit(instrument: impl Into<String>, side: OrderSide, price: Decimal, size: i64) -> Self {
        Self {
            instrument: instrument.into(),
            client_order_id: None,
            order_type: OrderType::Limit,
            is_close_order: false,
            side: Some(side),
            price: Some(price),
            size: Some(size),
            time_in_force: Some(TimeInForce::Gtc),
        }
    }

    /// A market order, immediate or cancel.
    #[must_use]
    pub fn market(instrument: impl Into<String>, side: OrderSide, size: i64) -> Self {
        Self {
            instrument: instrument.into(),
            client_order_id: None,
            order_type: OrderType::Market,
            is_close_order: false,
            side: Some(side),
            price: None,
            size: Some(size),
            time_in_force: Some(TimeInForce::Ioc),
        }
    }

    /// A limit order closing the whole position at `price`.
    #[must_use]
    pub fn limit_close(instrument: impl Into<String>, price: Decimal) -> Self {
        Self {
            instrument: instrument.into(),
            client_order_id: None,
            order_type: OrderType::Limit,
            is_close_order: true,
            side: None,
            price: Some(price),
            size: None,
            time_in_force: Some(TimeInForce::Gtc),
        }
    }

    /// A market order closing the whole position.
    #[must_use]
    pub fn market_close(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            client_order_id: None,
            order_type: OrderType::Market,
            is_close_order: true,
            side: None,
            price: None,
            size: None,
            time_in_force: Some(TimeInForce::Ioc),
        }
    }

    /// Sets the client-assigned id.
    #[must_use]
    pub fn with_client_order_id(mut self, id: impl Into<String>) -> Self {
        self.client_order_id = Some(id.into());
        self
    }

    /// Overrides the time-in-force policy.
    #[must_use]
    pub fn with_time_in_force(mut self, time_in_force: TimeInForce) -> Self {
        self.time_in_force = Some(time_in_force);
        self
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct CancelOrder<'a> {
    instrument: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    order_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    client_order_id: Option<&'a str>,
}

impl RestClient {
    /// Places an order.
    pub async fn new_order(&self, order: &NewOrder) -> Result<Order> {
        let placed: Order = self.post(ORDER_PATH).json(order).signed().send().await?;
        info!(order = %placed.key(), status = %placed.status, "Order placed");
        Ok(placed)
    }

    /// Cancels an order by venue id.
    pub async fn cancel_order(&self, instrument: &str, order_id: i64) -> Result<()> {
        self.cancel(&CancelOrder {
            instrument,
            order_id: Some(order_id),
            client_order_id: None,
        })
        .await
    }

    /// Cancels an order by client-assigned id.
    pub async fn cancel_order_by_client_id(
        &self,
        instrument: &str,
        client_order_id: &str,
    ) -> Result<()> {
        self.cancel(&CancelOrder {
            instrument,
            order_id: None,
            client_order_id: Some(client_order_id),
        })
        .await
    }

    async fn cancel(&self, request: &CancelOrder<'_>) -> Result<()> {
        let _: serde_json::Value = self.delete(ORDER_PATH).json(request).signed().send().await?;
        info!(instrument = request.instrument, "Order cancelled");
        Ok(())
    }
}

//! Per-instrument positions.

use rust_decimal::Decimal;

crate::entity_patch! {
    /// Open position on one instrument.
    pub struct Position;
    /// Partial position update.
    pub struct PositionUpdate;
    key String = |p| p.instrument.clone();
    key_fields {
        /// Instrument symbol.
        instrument: String,
    }
    required {
        /// Signed size in contracts; negative when short.
        quantity: i64,
        /// Effective leverage.
        leverage: Decimal,
        /// Entry value.
        entry_value: Decimal,
        /// Average entry price.
        entry_price: Decimal,
        /// Current mark price.
        mark_price: Decimal,
        /// Liquidation price.
        liquidation_price: Decimal,
        /// Margin allocated to the position.
        position_margin: Decimal,
        /// Margin locked by working buy orders.
        buy_order_margin: Decimal,
        /// Margin locked by working sell orders.
        sell_order_margin: Decimal,
        /// Unrealised profit and loss.
        unrealised_pnl: Decimal,
        /// Realised profit and loss.
        realised_pnl: Decimal,
        /// Current risk value.
        risk_value: Decimal,
        /// Risk limit tier.
        risk_limit: Decimal,
    }
    optional {}
}

impl Position {
    /// Returns true if the position holds no contracts.
    #[must_use]
    pub const fn is_flat(&self) -> bool {
        self.quantity == 0
    }
}

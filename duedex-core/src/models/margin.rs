//! Per-currency margin balances.

use rust_decimal::Decimal;

crate::entity_patch! {
    /// Margin balance for one settlement currency.
    pub struct Margin;
    /// Partial margin update.
    pub struct MarginUpdate;
    key String = |m| m.currency.clone();
    key_fields {
        /// Settlement currency code.
        currency: String,
    }
    required {
        /// Balance available for new orders.
        available: Decimal,
        /// Margin locked by working orders.
        order_margin: Decimal,
        /// Margin locked by open positions.
        position_margin: Decimal,
        /// Realised profit and loss.
        realised_pnl: Decimal,
        /// Unrealised profit and loss.
        unrealised_pnl: Decimal,
    }
    optional {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::DataError;
    use crate::models::Patch;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_missing_available_is_reported() {
        let update: MarginUpdate = serde_json::from_value(json!({
            "currency": "BTC",
            "orderMargin": "0.1",
            "positionMargin": "0.2",
            "realisedPnl": "0",
            "unrealisedPnl": "0"
        }))
        .unwrap();
        assert_eq!(
            update.into_entity().unwrap_err(),
            DataError::missing_field("Margin", "available")
        );
    }

    #[test]
    fn test_equal_value_is_still_written() {
        let mut margin = Margin {
            currency: "BTC".to_string(),
            available: dec!(1),
            order_margin: dec!(0),
            position_margin: dec!(0),
            realised_pnl: dec!(0),
            unrealised_pnl: dec!(0),
        };
        let update = MarginUpdate {
            currency: "BTC".to_string(),
            available: Some(dec!(1)),
            unrealised_pnl: Some(dec!(-0.5)),
            ..MarginUpdate::default()
        };
        update.apply_to(&mut margin);
        assert_eq!(margin.available, dec!(1));
        assert_eq!(margin.unrealised_pnl, dec!(-0.5));
    }

    #[test]
    fn test_currency_is_required_on_the_wire() {
        let result = serde_json::from_value::<MarginUpdate>(json!({"available": "1"}));
        assert!(result.is_err());
    }
}

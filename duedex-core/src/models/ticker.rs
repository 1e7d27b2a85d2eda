//! Per-instrument market statistics.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;

crate::entity_patch! {
    /// Latest market statistics for one instrument.
    pub struct Ticker;
    /// Partial ticker update; `None` fields were not sent.
    pub struct TickerUpdate;
    key String = |t| t.instrument.clone();
    key_fields {
        /// Instrument symbol. Filled from the envelope when the payload omits it.
        #[serde(default)]
        instrument: String,
    }
    required {
        /// Best bid price.
        best_bid: Decimal,
        /// Best ask price.
        best_ask: Decimal,
        /// Last traded price.
        last_price: Decimal,
        /// Underlying index price.
        index_price: Decimal,
        /// Mark price used for margining.
        mark_price: Decimal,
        /// Current funding rate.
        funding_rate: Decimal,
        /// Next funding settlement.
        next_funding_time: DateTime<Utc>,
        /// 24h open.
        open: Decimal,
        /// 24h high.
        high: Decimal,
        /// 24h low.
        low: Decimal,
        /// 24h close.
        close: Decimal,
        /// 24h volume in contracts.
        volume: i64,
        /// Open interest in contracts.
        open_interest: i64,
        /// 24h volume in USD.
        volume_usd: Decimal,
    }
    optional {}
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Keyed, Patch};
    use rust_decimal_macros::dec;
    use serde_json::json;

    fn full_ticker() -> serde_json::Value {
        json!({
            "instrument": "BTCUSD",
            "bestBid": "9000.5",
            "bestAsk": "9001",
            "lastPrice": 9001,
            "indexPrice": "9000.75",
            "markPrice": "9000.8",
            "fundingRate": "0.0001",
            "nextFundingTime": "2020-03-01T08:00:00Z",
            "open": 8800,
            "high": 9100,
            "low": 8700,
            "close": 9001,
            "volume": 120000,
            "openInterest": 450000,
            "volumeUsd": "1200000.5"
        })
    }

    #[test]
    fn test_full_payload_builds_entity() {
        let update: TickerUpdate = serde_json::from_value(full_ticker()).unwrap();
        let ticker = update.into_entity().unwrap();
        assert_eq!(ticker.key(), "BTCUSD");
        assert_eq!(ticker.best_bid, dec!(9000.5));
        assert_eq!(ticker.volume, 120_000);
    }

    #[test]
    fn test_partial_update_touches_only_present_fields() {
        let mut ticker: Ticker = serde_json::from_value(full_ticker()).unwrap();
        let update: TickerUpdate =
            serde_json::from_value(json!({"bestBid": "9002", "volume": null})).unwrap();
        update.apply_to(&mut ticker);

        assert_eq!(ticker.best_bid, dec!(9002));
        assert_eq!(ticker.best_ask, dec!(9001));
        assert_eq!(ticker.volume, 120_000);
        assert_eq!(ticker.instrument, "BTCUSD");
    }

    #[test]
    fn test_partial_payload_cannot_build_entity() {
        let update: TickerUpdate =
            serde_json::from_value(json!({"instrument": "BTCUSD", "bestBid": "1"})).unwrap();
        let err = update.into_entity().unwrap_err();
        assert!(err.to_string().contains("best_ask"));
    }
}

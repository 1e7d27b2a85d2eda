//! Price ladder for one instrument.

use crate::error::DataError;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Side of the book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BookSide {
    /// Bids, best is highest.
    Bid,
    /// Asks, best is lowest.
    Ask,
}

/// A single price level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookLevel {
    /// Level price.
    pub price: Decimal,
    /// Resting size in contracts. Zero removes the level.
    pub size: i64,
}

impl OrderbookLevel {
    /// Creates a new level.
    #[must_use]
    pub const fn new(price: Decimal, size: i64) -> Self {
        Self { price, size }
    }
}

/// Level pair as it appears on the wire: `[price, size]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawLevel(pub Decimal, pub Decimal);

impl RawLevel {
    /// Validates the size as a non-negative whole contract count.
    pub fn to_level(self) -> Result<OrderbookLevel, DataError> {
        let Self(price, size) = self;
        let invalid = |reason: &str| DataError::InvalidLevel {
            price: price.to_string(),
            reason: reason.to_string(),
        };
        if size.is_sign_negative() && !size.is_zero() {
            return Err(invalid("negative size"));
        }
        if size.fract() != Decimal::ZERO {
            return Err(invalid("fractional size"));
        }
        let size = size.to_i64().ok_or_else(|| invalid("size out of range"))?;
        Ok(OrderbookLevel::new(price, size))
    }
}

/// Snapshot or diff payload on the `level2` channel.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderbookData {
    /// Bid levels.
    #[serde(default)]
    pub bids: Vec<RawLevel>,
    /// Ask levels.
    #[serde(default)]
    pub asks: Vec<RawLevel>,
}

impl OrderbookData {
    /// Validates every level, failing on the first bad one.
    pub fn levels(&self) -> Result<(Vec<OrderbookLevel>, Vec<OrderbookLevel>), DataError> {
        let bids = self
            .bids
            .iter()
            .map(|l| l.to_level())
            .collect::<Result<Vec<_>, _>>()?;
        let asks = self
            .asks
            .iter()
            .map(|l| l.to_level())
            .collect::<Result<Vec<_>, _>>()?;
        Ok((bids, asks))
    }
}

/// Two-sided price ladder.
///
/// Every stored size is strictly positive; a zero-size level is never kept.
///
/// ```
/// use duedex_core::models::Orderbook;
/// use rust_decimal_macros::dec;
///
/// let mut book = Orderbook::new("BTCUSD");
/// book.update_bid(dec!(100), 5);
/// book.update_bid(dec!(99), 3);
/// book.update_bid(dec!(99), 0);
/// assert_eq!(book.best_bid().map(|l| l.price), Some(dec!(100)));
/// assert_eq!(book.bid_depth(), 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Orderbook {
    instrument: String,
    bids: BTreeMap<Decimal, i64>,
    asks: BTreeMap<Decimal, i64>,
}

impl Orderbook {
    /// Creates an empty book.
    #[must_use]
    pub fn new(instrument: impl Into<String>) -> Self {
        Self {
            instrument: instrument.into(),
            bids: BTreeMap::new(),
            asks: BTreeMap::new(),
        }
    }

    /// Returns the instrument symbol.
    #[must_use]
    pub fn instrument(&self) -> &str {
        &self.instrument
    }

    /// Sets or removes a bid level.
    pub fn update_bid(&mut self, price: Decimal, size: i64) {
        Self::update_level(&mut self.bids, price, size);
    }

    /// Sets or removes an ask level.
    pub fn update_ask(&mut self, price: Decimal, size: i64) {
        Self::update_level(&mut self.asks, price, size);
    }

    /// Sets or removes a level on the given side.
    pub fn update(&mut self, side: BookSide, level: OrderbookLevel) {
        match side {
            BookSide::Bid => self.update_bid(level.price, level.size),
            BookSide::Ask => self.update_ask(level.price, level.size),
        }
    }

    fn update_level(side: &mut BTreeMap<Decimal, i64>, price: Decimal, size: i64) {
        if size <= 0 {
            side.remove(&price);
        } else {
            side.insert(price, size);
        }
    }

    /// Removes every level from both sides.
    pub fn clear(&mut self) {
        self.bids.clear();
        self.asks.clear();
    }

    /// Iterates bids from highest to lowest price.
    pub fn bids(&self) -> impl Iterator<Item = OrderbookLevel> + '_ {
        self.bids
            .iter()
            .rev()
            .map(|(price, size)| OrderbookLevel::new(*price, *size))
    }

    /// Iterates asks from lowest to highest price.
    pub fn asks(&self) -> impl Iterator<Item = OrderbookLevel> + '_ {
        self.asks
            .iter()
            .map(|(price, size)| OrderbookLevel::new(*price, *size))
    }

    /// Returns the size resting at `price` on `side`.
    #[must_use]
    pub fn size_at(&self, side: BookSide, price: Decimal) -> Option<i64> {
        match side {
            BookSide::Bid => self.bids.get(&price).copied(),
            BookSide::Ask => self.asks.get(&price).copied(),
        }
    }

    /// Returns the best (highest) bid.
    #[must_use]
    pub fn best_bid(&self) -> Option<OrderbookLevel> {
        self.bids().next()
    }

    /// Returns the best (lowest) ask.
    #[must_use]
    pub fn best_ask(&self) -> Option<OrderbookLevel> {
        self.asks().next()
    }

    /// Returns best ask minus best bid.
    #[must_use]
    pub fn spread(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some(ask.price - bid.price),
            _ => None,
        }
    }

    /// Returns the midpoint of the best bid and ask.
    #[must_use]
    pub fn mid_price(&self) -> Option<Decimal> {
        match (self.best_bid(), self.best_ask()) {
            (Some(bid), Some(ask)) => Some((bid.price + ask.price) / Decimal::TWO),
            _ => None,
        }
    }

    /// Returns the number of bid levels.
    #[must_use]
    pub fn bid_depth(&self) -> usize {
        self.bids.len()
    }

    /// Returns the number of ask levels.
    #[must_use]
    pub fn ask_depth(&self) -> usize {
        self.asks.len()
    }

    /// Returns true if both sides are empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bids.is_empty() && self.asks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;
    use serde_json::json;

    #[test]
    fn test_bids_descending_asks_ascending() {
        let mut book = Orderbook::new("BTCUSD");
        book.update_bid(dec!(99), 3);
        book.update_bid(dec!(100), 5);
        book.update_ask(dec!(102), 1);
        book.update_ask(dec!(101), 2);

        let bids: Vec<_> = book.bids().map(|l| l.price).collect();
        let asks: Vec<_> = book.asks().map(|l| l.price).collect();
        assert_eq!(bids, vec![dec!(100), dec!(99)]);
        assert_eq!(asks, vec![dec!(101), dec!(102)]);
        assert_eq!(book.spread(), Some(dec!(1)));
        assert_eq!(book.mid_price(), Some(dec!(100.5)));
    }

    #[test]
    fn test_zero_size_removes_and_is_never_stored() {
        let mut book = Orderbook::new("BTCUSD");
        book.update_ask(dec!(101), 0);
        assert!(book.is_empty());

        book.update_ask(dec!(101), 4);
        book.update_ask(dec!(101), 0);
        assert_eq!(book.size_at(BookSide::Ask, dec!(101)), None);
    }

    #[test]
    fn test_wire_levels() {
        let data: OrderbookData =
            serde_json::from_value(json!({"bids": [["100.5", 5], [99, "3"]], "asks": []}))
                .unwrap();
        let (bids, asks) = data.levels().unwrap();
        assert_eq!(bids[0], OrderbookLevel::new(dec!(100.5), 5));
        assert_eq!(bids[1], OrderbookLevel::new(dec!(99), 3));
        assert!(asks.is_empty());
    }

    #[test]
    fn test_fractional_size_is_rejected() {
        let data: OrderbookData = serde_json::from_value(json!({"bids": [[100, "1.5"]]})).unwrap();
        assert!(matches!(
            data.levels(),
            Err(DataError::InvalidLevel { ref reason, .. }) if reason == "fractional size"
        ));
    }

    #[test]
    fn test_missing_side_defaults_to_empty() {
        let data: OrderbookData = serde_json::from_value(json!({"asks": [[101, 1]]})).unwrap();
        assert!(data.bids.is_empty());
        assert_eq!(data.asks.len(), 1);
    }
}

//! Local mirror of market and account state.
//!
//! The feed session is the only writer. Every store hands out immutable
//! views (`Arc` snapshots or clones) so readers on other threads never wait
//! on a batch longer than one lock acquisition and never see half of one.
//!
//! Across a reconnect the data is kept but flagged stale until the next
//! snapshot for it arrives.

mod order;
mod orderbook;
mod record;

pub use order::OrderStore;
pub use orderbook::OrderbookStore;
pub use record::{MergeOutcome, RecordStore};

use duedex_core::models::{Margin, Position, Ticker};

/// Tickers keyed by instrument.
pub type TickerStore = RecordStore<Ticker>;

/// Margin balances keyed by currency.
pub type MarginStore = RecordStore<Margin>;

/// Positions keyed by instrument.
pub type PositionStore = RecordStore<Position>;

/// Every entity store the feed maintains.
#[derive(Default)]
pub struct FeedStores {
    /// Orderbooks.
    pub orderbooks: OrderbookStore,
    /// Tickers.
    pub tickers: TickerStore,
    /// Margin balances.
    pub margins: MarginStore,
    /// Positions.
    pub positions: PositionStore,
    /// Active orders.
    pub orders: OrderStore,
}

impl FeedStores {
    /// Creates empty stores.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags all held data as outdated after a disconnect.
    pub fn mark_stale(&self) {
        self.orderbooks.mark_stale();
        self.tickers.mark_stale();
        self.margins.mark_stale();
        self.positions.mark_stale();
        self.orders.mark_stale();
    }
}

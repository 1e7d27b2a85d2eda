//! Orderbooks for every subscribed instrument.

use duedex_core::error::DataError;
use duedex_core::models::{BookSide, ChannelKind, Orderbook, OrderbookData};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

#[derive(Default)]
struct Inner {
    books: HashMap<String, Arc<Orderbook>>,
    stale: HashSet<String>,
}

/// Orderbooks keyed by instrument.
///
/// Each book is an `Arc` swapped or copied on write, so readers keep a
/// consistent book for as long as they hold it.
#[derive(Default)]
pub struct OrderbookStore {
    inner: RwLock<Inner>,
}

impl OrderbookStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the book for `instrument` with a snapshot.
    pub fn replace(
        &self,
        instrument: &str,
        data: &OrderbookData,
    ) -> Result<Arc<Orderbook>, DataError> {
        let (bids, asks) = data.levels()?;
        let mut book = Orderbook::new(instrument);
        for level in bids {
            book.update(BookSide::Bid, level);
        }
        for level in asks {
            book.update(BookSide::Ask, level);
        }

        let book = Arc::new(book);
        let mut inner = self.inner.write();
        inner.stale.remove(instrument);
        inner.books.insert(instrument.to_string(), Arc::clone(&book));
        Ok(book)
    }

    /// Applies a diff to the book for `instrument`.
    ///
    /// Levels are applied in message order, so a later level for the same
    /// price wins. A diff for a book without a current snapshot is refused
    /// and leaves the store untouched, as does one with an invalid level.
    pub fn merge(
        &self,
        instrument: &str,
        data: &OrderbookData,
    ) -> Result<Arc<Orderbook>, DataError> {
        let (bids, asks) = data.levels()?;
        let mut inner = self.inner.write();
        let missing = || DataError::MissingSnapshot {
            channel: ChannelKind::Level2.to_string(),
            key: instrument.to_string(),
        };
        if inner.stale.contains(instrument) {
            return Err(missing());
        }
        let entry = inner.books.get_mut(instrument).ok_or_else(missing)?;

        let book = Arc::make_mut(entry);
        for level in bids {
            book.update(BookSide::Bid, level);
        }
        for level in asks {
            book.update(BookSide::Ask, level);
        }
        Ok(Arc::clone(entry))
    }

    /// Returns the current book for `instrument`.
    #[must_use]
    pub fn get(&self, instrument: &str) -> Option<Arc<Orderbook>> {
        self.inner.read().books.get(instrument).cloned()
    }

    /// Returns the instruments with a book.
    #[must_use]
    pub fn instruments(&self) -> Vec<String> {
        self.inner.read().books.keys().cloned().collect()
    }

    /// Flags every book as outdated; diffs are refused until a new snapshot.
    pub fn mark_stale(&self) {
        let mut inner = self.inner.write();
        let instruments: Vec<_> = inner.books.keys().cloned().collect();
        inner.stale.extend(instruments);
    }

    /// Returns true if the book predates the current connection.
    #[must_use]
    pub fn is_stale(&self, instrument: &str) -> bool {
        self.inner.read().stale.contains(instrument)
    }
}

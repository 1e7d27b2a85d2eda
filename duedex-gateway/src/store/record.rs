//! Keyed record store with presence-tagged partial updates.

use duedex_core::error::DataError;
use duedex_core::models::{Keyed, Patch};
use parking_lot::RwLock;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;

/// Result of applying one batch of partial updates.
#[derive(Debug, Clone)]
pub struct MergeOutcome<K, E> {
    /// Records touched by the batch, one per key, in first-touch order.
    pub changed: Vec<E>,
    /// Entries that could not be applied; the rest of the batch still was.
    pub errors: Vec<DataError>,
    /// The whole collection after the batch.
    pub view: Arc<HashMap<K, E>>,
}

struct Inner<K, E> {
    records: Arc<HashMap<K, E>>,
    stale: HashSet<K>,
}

/// Records keyed by [`Keyed::key`], written by the feed session and read
/// from anywhere.
///
/// The collection sits behind an `Arc` that writers replace or copy-on-write,
/// so a reader holding a view never sees a half-applied batch.
pub struct RecordStore<E: Keyed> {
    inner: RwLock<Inner<E::Key, E>>,
}

impl<E> Default for RecordStore<E>
where
    E: Keyed + Clone,
{
    fn default() -> Self {
        Self {
            inner: RwLock::new(Inner {
                records: Arc::new(HashMap::new()),
                stale: HashSet::new(),
            }),
        }
    }
}

impl<E> RecordStore<E>
where
    E: Keyed + Clone,
{
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole collection.
    pub fn replace(&self, records: Vec<E>) -> Arc<HashMap<E::Key, E>> {
        let map: HashMap<_, _> = records.into_iter().map(|r| (r.key(), r)).collect();
        let view = Arc::new(map);
        let mut inner = self.inner.write();
        inner.records = Arc::clone(&view);
        inner.stale.clear();
        view
    }

    /// Replaces a single record, leaving the others alone.
    pub fn replace_one(&self, record: E) -> Arc<HashMap<E::Key, E>> {
        let key = record.key();
        let mut inner = self.inner.write();
        inner.stale.remove(&key);
        Arc::make_mut(&mut inner.records).insert(key, record);
        Arc::clone(&inner.records)
    }

    /// Applies a batch of partial updates.
    ///
    /// An existing record gets only the fields the update carries. An unseen
    /// key needs a complete update; an incomplete one is reported in
    /// `errors` and skipped.
    pub fn merge<P>(&self, updates: Vec<P>) -> MergeOutcome<E::Key, E>
    where
        P: Patch<Entity = E>,
    {
        let mut inner = self.inner.write();
        let records = Arc::make_mut(&mut inner.records);
        let mut touched: Vec<E::Key> = Vec::new();
        let mut seen: HashSet<E::Key> = HashSet::new();
        let mut errors = Vec::new();

        for update in updates {
            let key = update.key();
            if let Some(existing) = records.get_mut(&key) {
                update.apply_to(existing);
            } else {
                match update.into_entity() {
                    Ok(record) => {
                        records.insert(key.clone(), record);
                    }
                    Err(e) => {
                        errors.push(e);
                        continue;
                    }
                }
            }
            if seen.insert(key.clone()) {
                touched.push(key);
            }
        }

        let changed = touched
            .iter()
            .filter_map(|key| records.get(key).cloned())
            .collect();
        MergeOutcome {
            changed,
            errors,
            view: Arc::clone(&inner.records),
        }
    }

    /// Returns a clone of one record.
    #[must_use]
    pub fn get(&self, key: &E::Key) -> Option<E> {
        self.inner.read().records.get(key).cloned()
    }

    /// Returns an immutable view of the whole collection.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HashMap<E::Key, E>> {
        Arc::clone(&self.inner.read().records)
    }

    /// Returns the number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().records.len()
    }

    /// Returns true if the store holds no record.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().records.is_empty()
    }

    /// Flags every current record as possibly outdated.
    pub fn mark_stale(&self) {
        let mut inner = self.inner.write();
        let keys: Vec<_> = inner.records.keys().cloned().collect();
        inner.stale.extend(keys);
    }

    /// Returns true if the record was held over from a previous connection
    /// and no snapshot has replaced it yet.
    #[must_use]
    pub fn is_stale(&self, key: &E::Key) -> bool {
        self.inner.read().stale.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use duedex_core::models::{Margin, MarginUpdate};
    use rust_decimal_macros::dec;

    fn margin(currency: &str, available: rust_decimal::Decimal) -> Margin {
        Margin {
            currency: currency.to_string(),
            available,
            order_margin: dec!(0),
            position_margin: dec!(0),
            realised_pnl: dec!(0),
            unrealised_pnl: dec!(0),
        }
    }

    fn partial(currency: &str) -> MarginUpdate {
        MarginUpdate {
            currency: currency.to_string(),
            ..MarginUpdate::default()
        }
    }

    #[test]
    fn test_replace_discards_previous() {
        let store = RecordStore::new();
        store.replace(vec![margin("BTC", dec!(1)), margin("USDT", dec!(2))]);
        let view = store.replace(vec![margin("BTC", dec!(3))]);
        assert_eq!(view.len(), 1);
        assert_eq!(store.get(&"BTC".to_string()).unwrap().available, dec!(3));
        assert!(store.get(&"USDT".to_string()).is_none());
    }

    #[test]
    fn test_merge_overwrites_only_present_fields() {
        let store = RecordStore::new();
        let mut original = margin("BTC", dec!(1));
        original.order_margin = dec!(0.5);
        store.replace(vec![original]);

        let mut update = partial("BTC");
        update.available = Some(dec!(0.9));
        let outcome = store.merge(vec![update]);

        let merged = store.get(&"BTC".to_string()).unwrap();
        assert_eq!(merged.available, dec!(0.9));
        assert_eq!(merged.order_margin, dec!(0.5));
        assert_eq!(outcome.changed, vec![merged]);
        assert!(outcome.errors.is_empty());
    }

    #[test]
    fn test_merge_incomplete_new_entry_isolated() {
        let store = RecordStore::new();
        store.replace(vec![margin("BTC", dec!(1))]);

        let mut missing_available = partial("ETH");
        missing_available.order_margin = Some(dec!(0));
        missing_available.position_margin = Some(dec!(0));
        missing_available.realised_pnl = Some(dec!(0));
        missing_available.unrealised_pnl = Some(dec!(0));

        let mut btc = partial("BTC");
        btc.available = Some(dec!(2));

        let outcome = store.merge(vec![missing_available, btc]);
        assert!(store.get(&"ETH".to_string()).is_none());
        assert_eq!(store.get(&"BTC".to_string()).unwrap().available, dec!(2));
        assert_eq!(
            outcome.errors,
            vec![DataError::missing_field("Margin", "available")]
        );
        assert_eq!(outcome.changed.len(), 1);
    }

    #[test]
    fn test_merge_complete_new_entry_created() {
        let store = RecordStore::<Margin>::new();
        let mut update = partial("USDT");
        update.available = Some(dec!(10));
        update.order_margin = Some(dec!(0));
        update.position_margin = Some(dec!(0));
        update.realised_pnl = Some(dec!(0));
        update.unrealised_pnl = Some(dec!(0));

        let outcome = store.merge(vec![update]);
        assert_eq!(outcome.changed, vec![margin("USDT", dec!(10))]);
        assert_eq!(outcome.view.len(), 1);
    }

    #[test]
    fn test_merge_dedupes_changed_keeping_final_state() {
        let store = RecordStore::new();
        store.replace(vec![margin("BTC", dec!(1))]);

        let mut first = partial("BTC");
        first.available = Some(dec!(2));
        let mut second = partial("BTC");
        second.available = Some(dec!(3));

        let outcome = store.merge(vec![first, second]);
        assert_eq!(outcome.changed, vec![margin("BTC", dec!(3))]);
    }

    #[test]
    fn test_views_are_isolated_from_later_writes() {
        let store = RecordStore::new();
        store.replace(vec![margin("BTC", dec!(1))]);
        let before = store.snapshot();

        let mut update = partial("BTC");
        update.available = Some(dec!(5));
        store.merge(vec![update]);

        assert_eq!(before[&"BTC".to_string()].available, dec!(1));
        assert_eq!(store.snapshot()[&"BTC".to_string()].available, dec!(5));
    }

    #[test]
    fn test_stale_cleared_by_snapshot() {
        let store = RecordStore::new();
        store.replace(vec![margin("BTC", dec!(1)), margin("ETH", dec!(1))]);
        store.mark_stale();
        assert!(store.is_stale(&"BTC".to_string()));

        store.replace_one(margin("BTC", dec!(2)));
        assert!(!store.is_stale(&"BTC".to_string()));
        assert!(store.is_stale(&"ETH".to_string()));

        store.replace(vec![margin("ETH", dec!(1))]);
        assert!(!store.is_stale(&"ETH".to_string()));
    }
}

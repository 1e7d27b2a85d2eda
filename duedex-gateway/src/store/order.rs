//! Active orders.

use duedex_core::error::DataError;
use duedex_core::models::{Keyed, Order, OrderKey, OrderUpdate, Patch};
use parking_lot::RwLock;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

use super::record::MergeOutcome;

#[derive(Default)]
struct Inner {
    active: Arc<HashMap<OrderKey, Order>>,
    stale: HashSet<OrderKey>,
}

/// Orders that are still working: status `new` or `partiallyFilled`.
///
/// An order leaves the set as soon as an update makes it terminal.
#[derive(Default)]
pub struct OrderStore {
    inner: RwLock<Inner>,
}

impl OrderStore {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds the active set from a snapshot, keeping non-terminal orders.
    pub fn replace(&self, orders: Vec<Order>) -> Arc<HashMap<OrderKey, Order>> {
        let active: HashMap<_, _> = orders
            .into_iter()
            .filter(Order::is_active)
            .map(|o| (o.key(), o))
            .collect();
        let view = Arc::new(active);
        let mut inner = self.inner.write();
        inner.active = Arc::clone(&view);
        inner.stale.clear();
        view
    }

    /// Applies a batch of order updates.
    ///
    /// `changed` holds every order the batch touched, in its post-update
    /// state, including orders that became terminal and were removed.
    pub fn merge(&self, updates: Vec<OrderUpdate>) -> MergeOutcome<OrderKey, Order> {
        let mut inner = self.inner.write();
        let active = Arc::make_mut(&mut inner.active);
        let mut changed: Vec<Order> = Vec::new();
        let mut slots: HashMap<OrderKey, usize> = HashMap::new();
        let mut errors: Vec<DataError> = Vec::new();

        for update in updates {
            let key = update.key();
            let order = match active.get_mut(&key) {
                Some(existing) => {
                    update.apply_to(existing);
                    let order = existing.clone();
                    if !order.is_active() {
                        debug!(order = %key, status = %order.status, "Order left active set");
                        active.remove(&key);
                    }
                    order
                }
                None => match update.into_entity() {
                    Ok(order) => {
                        if order.is_active() {
                            active.insert(key.clone(), order.clone());
                        }
                        order
                    }
                    Err(e) => {
                        errors.push(e);
                        continue;
                    }
                },
            };

            match slots.entry(key) {
                Entry::Occupied(slot) => changed[*slot.get()] = order,
                Entry::Vacant(slot) => {
                    slot.insert(changed.len());
                    changed.push(order);
                }
            }
        }

        MergeOutcome {
            changed,
            errors,
            view: Arc::clone(&inner.active),
        }
    }

    /// Returns a clone of one active order.
    #[must_use]
    pub fn get(&self, key: &OrderKey) -> Option<Order> {
        self.inner.read().active.get(key).cloned()
    }

    /// Returns an immutable view of the active set.
    #[must_use]
    pub fn snapshot(&self) -> Arc<HashMap<OrderKey, Order>> {
        Arc::clone(&self.inner.read().active)
    }

    /// Returns the number of active orders.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().active.len()
    }

    /// Returns true if no order is active.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.read().active.is_empty()
    }

    /// Flags every active order as possibly outdated.
    pub fn mark_stale(&self) {
        let mut inner = self.inner.write();
        let keys: Vec<_> = inner.active.keys().cloned().collect();
        inner.stale.extend(keys);
    }

    /// Returns true if the order predates the current connection.
    #[must_use]
    pub fn is_stale(&self, key: &OrderKey) -> bool {
        self.inner.read().stale.contains(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};
    use duedex_core::models::{OrderSide, OrderStatus, OrderType, TimeInForce};
    use rust_decimal_macros::dec;

    fn order(id: i64, status: OrderStatus) -> Order {
        let time = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        Order {
            instrument: "BTCUSD".to_string(),
            order_id: id,
            order_type: OrderType::Limit,
            is_close_order: false,
            side: OrderSide::Long,
            size: 10,
            time_in_force: TimeInForce::Gtc,
            notional_value: dec!(0.001),
            status,
            fill_price: dec!(0),
            filled_size: 0,
            accumulated_fees: dec!(0),
            create_time: time,
            update_time: time,
            client_order_id: None,
            price: Some(dec!(10000)),
        }
    }

    fn status_update(id: i64, status: OrderStatus) -> OrderUpdate {
        OrderUpdate {
            instrument: "BTCUSD".to_string(),
            order_id: id,
            status: Some(status),
            ..OrderUpdate::default()
        }
    }

    fn full_update(order: &Order) -> OrderUpdate {
        serde_json::from_value(serde_json::to_value(order).unwrap()).unwrap()
    }

    #[test]
    fn test_replace_keeps_only_active() {
        let store = OrderStore::new();
        let view = store.replace(vec![
            order(1, OrderStatus::New),
            order(2, OrderStatus::Filled),
            order(3, OrderStatus::PartiallyFilled),
            order(4, OrderStatus::Cancelled),
        ]);
        let mut ids: Vec<_> = view.keys().map(|k| k.order_id).collect();
        ids.sort_unstable();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_fill_removes_but_reports_once() {
        let store = OrderStore::new();
        store.replace(vec![order(1, OrderStatus::New)]);

        let outcome = store.merge(vec![status_update(1, OrderStatus::Filled)]);
        assert!(outcome.view.is_empty());
        assert!(store.is_empty());
        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].status, OrderStatus::Filled);
        assert_eq!(outcome.changed[0].size, 10);
    }

    #[test]
    fn test_partial_update_keeps_other_fields() {
        let store = OrderStore::new();
        store.replace(vec![order(1, OrderStatus::New)]);

        let mut update = status_update(1, OrderStatus::PartiallyFilled);
        update.filled_size = Some(4);
        store.merge(vec![update]);

        let stored = store.get(&OrderKey::new("BTCUSD", 1)).unwrap();
        assert_eq!(stored.status, OrderStatus::PartiallyFilled);
        assert_eq!(stored.filled_size, 4);
        assert_eq!(stored.price, Some(dec!(10000)));
        assert_eq!(stored.remaining_size(), 6);
    }

    #[test]
    fn test_new_order_from_complete_update() {
        let store = OrderStore::new();
        let outcome = store.merge(vec![full_update(&order(7, OrderStatus::New))]);
        assert_eq!(outcome.changed, vec![order(7, OrderStatus::New)]);
        assert!(store.get(&OrderKey::new("BTCUSD", 7)).is_some());
    }

    #[test]
    fn test_unknown_terminal_order_reported_not_stored() {
        let store = OrderStore::new();
        let outcome = store.merge(vec![full_update(&order(8, OrderStatus::Cancelled))]);
        assert_eq!(outcome.changed.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_incomplete_unknown_order_is_error() {
        let store = OrderStore::new();
        store.replace(vec![order(1, OrderStatus::New)]);

        let outcome = store.merge(vec![
            status_update(99, OrderStatus::New),
            status_update(1, OrderStatus::Cancelled),
        ]);
        assert_eq!(outcome.errors.len(), 1);
        assert!(matches!(outcome.errors[0], DataError::MissingField { .. }));
        assert_eq!(outcome.changed.len(), 1);
        assert!(store.is_empty());
    }

    #[test]
    fn test_same_order_twice_in_batch() {
        let store = OrderStore::new();
        store.replace(vec![order(1, OrderStatus::New)]);

        let mut partial = status_update(1, OrderStatus::PartiallyFilled);
        partial.filled_size = Some(5);
        let outcome = store.merge(vec![partial, status_update(1, OrderStatus::Filled)]);

        assert_eq!(outcome.changed.len(), 1);
        assert_eq!(outcome.changed[0].status, OrderStatus::Filled);
        assert_eq!(outcome.changed[0].filled_size, 5);
    }

    #[test]
    fn test_interleaved_batch_keeps_first_touch_order() {
        let store = OrderStore::new();
        store.replace(vec![order(1, OrderStatus::New), order(2, OrderStatus::New)]);

        let outcome = store.merge(vec![
            status_update(1, OrderStatus::PartiallyFilled),
            status_update(2, OrderStatus::PartiallyFilled),
            status_update(1, OrderStatus::Filled),
            status_update(2, OrderStatus::Cancelled),
        ]);

        let ids: Vec<_> = outcome.changed.iter().map(|o| o.order_id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert_eq!(outcome.changed[0].status, OrderStatus::Filled);
        assert_eq!(outcome.changed[1].status, OrderStatus::Cancelled);
        assert!(outcome.errors.is_empty());
        assert!(store.is_empty());
    }

    #[test]
    fn test_stale_cleared_by_snapshot() {
        let store = OrderStore::new();
        store.replace(vec![order(1, OrderStatus::New)]);
        store.mark_stale();
        assert!(store.is_stale(&OrderKey::new("BTCUSD", 1)));
        store.replace(vec![order(1, OrderStatus::New)]);
        assert!(!store.is_stale(&OrderKey::new("BTCUSD", 1)));
    }
}

//! Notifications published after every applied feed message.
//!
//! Events travel over a bounded [`broadcast`] channel. The session never
//! blocks on a consumer: a receiver that falls more than the channel capacity
//! behind loses the oldest events and gets `RecvError::Lagged(n)` on its next
//! receive, after which it can resynchronise from the stores.

use chrono::{DateTime, Utc};
use duedex_core::models::{
    Execution, Margin, Match, Order, OrderKey, Orderbook, Position, Ticker,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::trace;

use crate::ws::SessionState;

/// A change to local market or account state.
#[derive(Debug, Clone)]
pub enum FeedEvent {
    /// An orderbook snapshot or diff was applied.
    OrderbookUpdated {
        /// Instrument symbol.
        instrument: String,
        /// The book after the change.
        orderbook: Arc<Orderbook>,
        /// Server time of the change.
        timestamp: DateTime<Utc>,
    },
    /// A ticker snapshot or diff was applied.
    TickerUpdated {
        /// Instrument symbol.
        instrument: String,
        /// The ticker after the change.
        ticker: Ticker,
        /// Server time of the change.
        timestamp: DateTime<Utc>,
    },
    /// Public trades were reported.
    MatchesUpdated {
        /// Instrument symbol.
        instrument: String,
        /// Trades in this message.
        matches: Vec<Match>,
        /// Server time of the message.
        timestamp: DateTime<Utc>,
    },
    /// Margin balances were replaced by a snapshot.
    MarginsLoaded {
        /// All balances, by currency.
        margins: Arc<HashMap<String, Margin>>,
        /// Server time of the snapshot.
        timestamp: DateTime<Utc>,
    },
    /// Margin balances were partially updated.
    MarginsUpdated {
        /// Balances changed by this message.
        updated: Vec<Margin>,
        /// All balances after the change.
        margins: Arc<HashMap<String, Margin>>,
        /// Server time of the change.
        timestamp: DateTime<Utc>,
    },
    /// Positions were replaced by a snapshot.
    PositionsLoaded {
        /// All positions, by instrument.
        positions: Arc<HashMap<String, Position>>,
        /// Server time of the snapshot.
        timestamp: DateTime<Utc>,
    },
    /// Positions were partially updated.
    PositionsUpdated {
        /// Positions changed by this message.
        updated: Vec<Position>,
        /// All positions after the change.
        positions: Arc<HashMap<String, Position>>,
        /// Server time of the change.
        timestamp: DateTime<Utc>,
    },
    /// Active orders were replaced by a snapshot.
    OrdersLoaded {
        /// Active orders.
        orders: Arc<HashMap<OrderKey, Order>>,
        /// Server time of the snapshot.
        timestamp: DateTime<Utc>,
    },
    /// Orders were updated.
    OrdersUpdated {
        /// Orders changed by this message, including ones that just became
        /// terminal and left the active set.
        updated: Vec<Order>,
        /// Active orders after the change.
        active: Arc<HashMap<OrderKey, Order>>,
        /// Server time of the change.
        timestamp: DateTime<Utc>,
    },
    /// Fills of the account's orders were reported.
    ExecutionsUpdated {
        /// Instrument scope of the message, if any.
        instrument: Option<String>,
        /// Fills in this message.
        executions: Vec<Execution>,
        /// Server time of the message.
        timestamp: DateTime<Utc>,
    },
    /// The feed session changed state.
    SessionStateChanged {
        /// The new state.
        state: SessionState,
    },
}

impl FeedEvent {
    /// Returns a short name for logging.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::OrderbookUpdated { .. } => "orderbook_updated",
            Self::TickerUpdated { .. } => "ticker_updated",
            Self::MatchesUpdated { .. } => "matches_updated",
            Self::MarginsLoaded { .. } => "margins_loaded",
            Self::MarginsUpdated { .. } => "margins_updated",
            Self::PositionsLoaded { .. } => "positions_loaded",
            Self::PositionsUpdated { .. } => "positions_updated",
            Self::OrdersLoaded { .. } => "orders_loaded",
            Self::OrdersUpdated { .. } => "orders_updated",
            Self::ExecutionsUpdated { .. } => "executions_updated",
            Self::SessionStateChanged { .. } => "session_state_changed",
        }
    }
}

/// Fan-out of feed events to any number of subscribers.
#[derive(Debug, Clone)]
pub struct EventEmitter {
    tx: broadcast::Sender<FeedEvent>,
}

impl EventEmitter {
    /// Creates an emitter whose subscribers each buffer up to `capacity` events.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event. Never blocks; dropped if nobody is subscribed.
    pub fn emit(&self, event: FeedEvent) {
        let name = event.name();
        match self.tx.send(event) {
            Ok(receivers) => trace!(event = name, receivers, "Event emitted"),
            Err(_) => trace!(event = name, "No subscribers, event dropped"),
        }
    }

    /// Returns a receiver for events emitted from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<FeedEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of live subscribers.
    #[must_use]
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::RecvError;

    fn state_event(state: SessionState) -> FeedEvent {
        FeedEvent::SessionStateChanged { state }
    }

    #[tokio::test]
    async fn test_emit_without_subscribers() {
        let emitter = EventEmitter::new(4);
        emitter.emit(state_event(SessionState::Connecting));
        assert_eq!(emitter.receiver_count(), 0);
    }

    #[tokio::test]
    async fn test_fan_out() {
        let emitter = EventEmitter::new(4);
        let mut a = emitter.subscribe();
        let mut b = emitter.subscribe();
        emitter.emit(state_event(SessionState::Active));

        for rx in [&mut a, &mut b] {
            match rx.recv().await.unwrap() {
                FeedEvent::SessionStateChanged { state } => assert_eq!(state, SessionState::Active),
                other => panic!("unexpected event: {other:?}"),
            }
        }
    }

    #[tokio::test]
    async fn test_slow_consumer_drops_oldest() {
        let emitter = EventEmitter::new(2);
        let mut rx = emitter.subscribe();
        emitter.emit(state_event(SessionState::Connecting));
        emitter.emit(state_event(SessionState::Connected));
        emitter.emit(state_event(SessionState::AuthPending));

        assert!(matches!(rx.recv().await, Err(RecvError::Lagged(1))));
        match rx.recv().await.unwrap() {
            FeedEvent::SessionStateChanged { state } => assert_eq!(state, SessionState::Connected),
            other => panic!("unexpected event: {other:?}"),
        }
    }

    #[test]
    fn test_event_names() {
        assert_eq!(
            state_event(SessionState::Stopped).name(),
            "session_state_changed"
        );
    }
}

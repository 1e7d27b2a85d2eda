//! Dispatch of complete feed messages to the handshake and the stores.

use chrono::{DateTime, Utc};
use duedex_core::error::DataError;
use duedex_core::models::{
    ChannelKind, Execution, Margin, MarginUpdate, Match, Order, OrderUpdate, OrderbookData,
    Patch, Position, PositionUpdate, TickerUpdate,
};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use super::auth::FeedAuthenticator;
use super::events::{EventEmitter, FeedEvent};
use super::message::{InboundMessage, MessageType, OutboundMessage};
use crate::store::FeedStores;

/// What the session has to do after a message was routed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionAction {
    /// Send a message on the connection.
    Send(OutboundMessage),
    /// The server accepted the handshake.
    Authenticated,
}

/// Applies feed messages to the stores and announces the changes.
pub struct MessageRouter {
    stores: Arc<FeedStores>,
    emitter: EventEmitter,
    auth: Option<FeedAuthenticator>,
}

impl MessageRouter {
    /// Creates a router writing to `stores`.
    #[must_use]
    pub fn new(
        stores: Arc<FeedStores>,
        emitter: EventEmitter,
        auth: Option<FeedAuthenticator>,
    ) -> Self {
        Self {
            stores,
            emitter,
            auth,
        }
    }

    /// Returns true if the router can answer challenges.
    #[must_use]
    pub fn has_credentials(&self) -> bool {
        self.auth.is_some()
    }

    /// Routes one message. A message that cannot be applied is logged and
    /// dropped; it never interrupts the session.
    pub fn route(&self, text: &str) -> Option<SessionAction> {
        match self.dispatch(text) {
            Ok(action) => action,
            Err(e) => {
                warn!(error = %e, "Dropping feed message");
                trace!(message = text, "Dropped message");
                None
            }
        }
    }

    /// Routes one message, returning the first error instead of logging it.
    ///
    /// Errors on single entries of a batch are logged and do not fail the
    /// message; the rest of the batch is still applied.
    pub fn dispatch(&self, text: &str) -> Result<Option<SessionAction>, DataError> {
        let message = InboundMessage::parse(text)?;
        match message.kind()? {
            MessageType::Challenge => self.on_challenge(&message).map(Some),
            MessageType::Auth => {
                debug!("Feed authentication acknowledged");
                Ok(Some(SessionAction::Authenticated))
            }
            MessageType::Snapshot => {
                let channel = message.channel_kind()?;
                self.on_snapshot(channel, message)?;
                Ok(None)
            }
            MessageType::Update => {
                let channel = message.channel_kind()?;
                self.on_update(channel, message)?;
                Ok(None)
            }
        }
    }

    fn on_challenge(&self, message: &InboundMessage) -> Result<SessionAction, DataError> {
        let auth = self.auth.as_ref().ok_or_else(|| DataError::InvalidMessage {
            reason: "challenge received but no credentials are configured".to_string(),
        })?;
        let nonce = message.nonce().ok_or_else(|| DataError::InvalidMessage {
            reason: "challenge without nonce".to_string(),
        })?;
        debug!("Answering feed challenge");
        Ok(SessionAction::Send(auth.reply(nonce)))
    }

    fn on_snapshot(&self, channel: ChannelKind, message: InboundMessage) -> Result<(), DataError> {
        let timestamp = event_time(&message);
        match channel {
            ChannelKind::Level2 => {
                let instrument = require_instrument(channel, &message)?;
                let data: OrderbookData = decode(channel, message.data)?;
                let orderbook = self.stores.orderbooks.replace(&instrument, &data)?;
                self.emitter.emit(FeedEvent::OrderbookUpdated {
                    instrument,
                    orderbook,
                    timestamp,
                });
            }
            ChannelKind::Ticker => {
                let mut update: TickerUpdate = decode(channel, message.data)?;
                fill_instrument(channel, &mut update.instrument, message.instrument)?;
                let ticker = update.into_entity()?;
                self.stores.tickers.replace_one(ticker.clone());
                self.emitter.emit(FeedEvent::TickerUpdated {
                    instrument: ticker.instrument.clone(),
                    ticker,
                    timestamp,
                });
            }
            ChannelKind::Margins => {
                let margins: Vec<Margin> = decode(channel, message.data)?;
                let margins = self.stores.margins.replace(margins);
                self.emitter
                    .emit(FeedEvent::MarginsLoaded { margins, timestamp });
            }
            ChannelKind::Positions => {
                let positions: Vec<Position> = decode(channel, message.data)?;
                let positions = self.stores.positions.replace(positions);
                self.emitter
                    .emit(FeedEvent::PositionsLoaded { positions, timestamp });
            }
            ChannelKind::Orders => {
                let orders: Vec<Order> = decode(channel, message.data)?;
                let orders = self.stores.orders.replace(orders);
                self.emitter
                    .emit(FeedEvent::OrdersLoaded { orders, timestamp });
            }
            ChannelKind::Matches | ChannelKind::Executions => {
                self.forward(channel, message, timestamp)?;
            }
        }
        Ok(())
    }

    fn on_update(&self, channel: ChannelKind, message: InboundMessage) -> Result<(), DataError> {
        let timestamp = event_time(&message);
        match channel {
            ChannelKind::Level2 => {
                let instrument = require_instrument(channel, &message)?;
                let data: OrderbookData = decode(channel, message.data)?;
                let orderbook = self.stores.orderbooks.merge(&instrument, &data)?;
                self.emitter.emit(FeedEvent::OrderbookUpdated {
                    instrument,
                    orderbook,
                    timestamp,
                });
            }
            ChannelKind::Ticker => {
                let mut update: TickerUpdate = decode(channel, message.data)?;
                fill_instrument(channel, &mut update.instrument, message.instrument)?;
                let outcome = self.stores.tickers.merge(vec![update]);
                if let Some(e) = outcome.errors.into_iter().next() {
                    return Err(e);
                }
                if let Some(ticker) = outcome.changed.into_iter().next() {
                    self.emitter.emit(FeedEvent::TickerUpdated {
                        instrument: ticker.instrument.clone(),
                        ticker,
                        timestamp,
                    });
                }
            }
            ChannelKind::Margins => {
                let updates: Vec<MarginUpdate> = decode(channel, message.data)?;
                let outcome = self.stores.margins.merge(updates);
                log_entry_errors(channel, &outcome.errors);
                self.emitter.emit(FeedEvent::MarginsUpdated {
                    updated: outcome.changed,
                    margins: outcome.view,
                    timestamp,
                });
            }
            ChannelKind::Positions => {
                let updates: Vec<PositionUpdate> = decode(channel, message.data)?;
                let outcome = self.stores.positions.merge(updates);
                log_entry_errors(channel, &outcome.errors);
                self.emitter.emit(FeedEvent::PositionsUpdated {
                    updated: outcome.changed,
                    positions: outcome.view,
                    timestamp,
                });
            }
            ChannelKind::Orders => {
                let updates: Vec<OrderUpdate> = decode(channel, message.data)?;
                let outcome = self.stores.orders.merge(updates);
                log_entry_errors(channel, &outcome.errors);
                self.emitter.emit(FeedEvent::OrdersUpdated {
                    updated: outcome.changed,
                    active: outcome.view,
                    timestamp,
                });
            }
            ChannelKind::Matches | ChannelKind::Executions => {
                self.forward(channel, message, timestamp)?;
            }
        }
        Ok(())
    }

    /// Matches and executions are passed through without being stored.
    fn forward(
        &self,
        channel: ChannelKind,
        message: InboundMessage,
        timestamp: DateTime<Utc>,
    ) -> Result<(), DataError> {
        if channel == ChannelKind::Matches {
            let instrument = require_instrument(channel, &message)?;
            let mut matches: Vec<Match> = decode(channel, message.data)?;
            for m in &mut matches {
                if m.instrument.is_empty() {
                    m.instrument.clone_from(&instrument);
                }
            }
            self.emitter.emit(FeedEvent::MatchesUpdated {
                instrument,
                matches,
                timestamp,
            });
        } else {
            let executions: Vec<Execution> = decode(channel, message.data)?;
            self.emitter.emit(FeedEvent::ExecutionsUpdated {
                instrument: message.instrument,
                executions,
                timestamp,
            });
        }
        Ok(())
    }
}

fn event_time(message: &InboundMessage) -> DateTime<Utc> {
    message.timestamp.unwrap_or_else(Utc::now)
}

fn decode<T: DeserializeOwned>(channel: ChannelKind, data: serde_json::Value) -> Result<T, DataError> {
    serde_json::from_value(data).map_err(|e| DataError::decode(channel.as_str(), e))
}

fn require_instrument(channel: ChannelKind, message: &InboundMessage) -> Result<String, DataError> {
    message
        .instrument
        .clone()
        .ok_or_else(|| DataError::decode(channel.as_str(), "missing instrument"))
}

fn fill_instrument(
    channel: ChannelKind,
    target: &mut String,
    envelope: Option<String>,
) -> Result<(), DataError> {
    if target.is_empty() {
        *target = envelope.ok_or_else(|| DataError::decode(channel.as_str(), "missing instrument"))?;
    }
    Ok(())
}

fn log_entry_errors(channel: ChannelKind, errors: &[DataError]) {
    for e in errors {
        warn!(channel = %channel, error = %e, "Skipping update entry");
    }
}

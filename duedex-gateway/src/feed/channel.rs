//! Subscription identity and the registry of desired channels.

use duedex_core::models::ChannelKind;
use parking_lot::Mutex;
use std::collections::BTreeSet;
use std::fmt;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use super::message::OutboundMessage;

/// A feed topic, optionally scoped to one instrument.
///
/// Two channels with the same kind and instrument are the same subscription.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Channel {
    /// Channel kind.
    pub kind: ChannelKind,
    /// Instrument scope.
    pub instrument: Option<String>,
}

impl Channel {
    /// Creates a channel scoped to `instrument`.
    #[must_use]
    pub fn scoped(kind: ChannelKind, instrument: impl Into<String>) -> Self {
        Self {
            kind,
            instrument: Some(instrument.into()),
        }
    }

    /// Creates a channel without instrument scope.
    #[must_use]
    pub const fn unscoped(kind: ChannelKind) -> Self {
        Self {
            kind,
            instrument: None,
        }
    }
}

impl fmt::Display for Channel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.instrument {
            Some(instrument) => write!(f, "{}:{instrument}", self.kind),
            None => write!(f, "{}", self.kind),
        }
    }
}

#[derive(Default)]
struct RegistryInner {
    channels: BTreeSet<Channel>,
    live: Option<mpsc::UnboundedSender<OutboundMessage>>,
}

/// The set of channels the client wants, replayed after every connect.
///
/// While a session is active the registry holds its outbound queue, so a
/// newly added channel is subscribed immediately. Otherwise it is only
/// recorded. Going live and adding share one lock, so a channel added during
/// activation is sent exactly once: either in the replay or on its own.
#[derive(Default)]
pub struct ChannelRegistry {
    inner: Mutex<RegistryInner>,
}

impl ChannelRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a channel. Returns false if it was already registered.
    pub fn add(&self, channel: Channel) -> bool {
        let mut inner = self.inner.lock();
        if !inner.channels.insert(channel.clone()) {
            return false;
        }

        if let Some(tx) = &inner.live {
            debug!(channel = %channel, "Subscribing on live session");
            if tx.send(OutboundMessage::subscribe(&[channel])).is_err() {
                warn!("Session outbound queue closed, channel will be replayed on reconnect");
                inner.live = None;
            }
        }
        true
    }

    /// Returns true if the channel is registered.
    #[must_use]
    pub fn contains(&self, channel: &Channel) -> bool {
        self.inner.lock().channels.contains(channel)
    }

    /// Returns the registered channels in a stable order.
    #[must_use]
    pub fn snapshot(&self) -> Vec<Channel> {
        self.inner.lock().channels.iter().cloned().collect()
    }

    /// Returns the number of registered channels.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.lock().channels.len()
    }

    /// Returns true if no channel is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.lock().channels.is_empty()
    }

    /// Attaches a session's outbound queue and returns the channels to replay.
    pub(crate) fn go_live(&self, tx: mpsc::UnboundedSender<OutboundMessage>) -> Vec<Channel> {
        let mut inner = self.inner.lock();
        inner.live = Some(tx);
        inner.channels.iter().cloned().collect()
    }

    /// Detaches the outbound queue.
    pub(crate) fn go_offline(&self) {
        self.inner.lock().live = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_is_set_semantics() {
        let registry = ChannelRegistry::new();
        assert!(registry.add(Channel::scoped(ChannelKind::Level2, "BTC-PERP")));
        assert!(!registry.add(Channel::scoped(ChannelKind::Level2, "BTC-PERP")));
        assert!(registry.add(Channel::scoped(ChannelKind::Level2, "ETH-PERP")));
        assert!(registry.add(Channel::unscoped(ChannelKind::Orders)));
        assert_eq!(registry.len(), 3);
    }

    #[test]
    fn test_offline_add_sends_nothing() {
        let registry = ChannelRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        registry.go_live(tx);
        registry.go_offline();

        registry.add(Channel::unscoped(ChannelKind::Margins));
        assert!(rx.try_recv().is_err());
        assert!(registry.contains(&Channel::unscoped(ChannelKind::Margins)));
    }

    #[test]
    fn test_live_add_sends_once() {
        let registry = ChannelRegistry::new();
        let (tx, mut rx) = mpsc::unbounded_channel();
        assert!(registry.go_live(tx).is_empty());

        let channel = Channel::scoped(ChannelKind::Level2, "BTC-PERP");
        assert!(registry.add(channel.clone()));
        assert!(!registry.add(channel.clone()));

        assert_eq!(
            rx.try_recv().unwrap(),
            OutboundMessage::subscribe(&[channel])
        );
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_go_live_returns_registered() {
        let registry = ChannelRegistry::new();
        registry.add(Channel::scoped(ChannelKind::Ticker, "BTCUSD"));
        registry.add(Channel::scoped(ChannelKind::Level2, "BTCUSD"));

        let (tx, _rx) = mpsc::unbounded_channel();
        let replay = registry.go_live(tx);
        assert_eq!(
            replay,
            vec![
                Channel::scoped(ChannelKind::Level2, "BTCUSD"),
                Channel::scoped(ChannelKind::Ticker, "BTCUSD"),
            ]
        );
        assert_eq!(registry.snapshot(), replay);
    }

    #[test]
    fn test_closed_queue_goes_offline() {
        let registry = ChannelRegistry::new();
        let (tx, rx) = mpsc::unbounded_channel();
        registry.go_live(tx);
        drop(rx);

        assert!(registry.add(Channel::unscoped(ChannelKind::Orders)));
        assert!(registry.inner.lock().live.is_none());
    }

    #[test]
    fn test_display() {
        assert_eq!(
            Channel::scoped(ChannelKind::Level2, "BTCUSD").to_string(),
            "level2:BTCUSD"
        );
        assert_eq!(Channel::unscoped(ChannelKind::Orders).to_string(), "orders");
    }
}

//! The client facade.

use duedex_core::config::{ClientConfig, Validatable};
use duedex_core::error::Result;
use duedex_core::models::{
    ChannelKind, Margin, Order, OrderKey, Orderbook, Position, Ticker,
};
use duedex_telemetry::masking::SensitiveDataMasker;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::feed::{Channel, ChannelRegistry, EventEmitter, FeedAuthenticator, FeedEvent, FeedHandle, FeedSession};
use crate::rest::{NewOrder, RestClient};
use crate::store::FeedStores;
use crate::ws::{SessionState, SessionStatus, WebSocketConfig};

/// Client for one DueDEX account or anonymous market data.
///
/// Channels can be subscribed before or after [`start`](Self::start). The
/// stores are readable from any thread while the feed runs.
pub struct DuedexClient {
    config: ClientConfig,
    registry: Arc<ChannelRegistry>,
    stores: Arc<FeedStores>,
    emitter: EventEmitter,
    auth: Option<FeedAuthenticator>,
    status: Arc<RwLock<SessionStatus>>,
    rest: RestClient,
}

impl DuedexClient {
    /// Validates the configuration and builds the client.
    pub fn new(config: ClientConfig) -> Result<Self> {
        config.validate()?;
        let credentials = config.credentials();
        match &credentials {
            Some(c) => info!(
                network = %config.network,
                api_key = %SensitiveDataMasker::new().mask_value(&c.key),
                "Client configured with credentials"
            ),
            None => info!(network = %config.network, "Client configured for public data only"),
        }
        let auth = credentials
            .map(|c| FeedAuthenticator::from_credentials(&c))
            .transpose()?;
        let rest = RestClient::new(&config)?;

        Ok(Self {
            emitter: EventEmitter::new(config.event_capacity),
            registry: Arc::new(ChannelRegistry::new()),
            stores: Arc::new(FeedStores::new()),
            auth,
            status: Arc::new(RwLock::new(SessionStatus::default())),
            rest,
            config,
        })
    }

    /// Registers channels of `kind`, one per instrument, or the unscoped
    /// channel when `instruments` is empty. Returns, per channel, whether it
    /// was newly registered.
    pub fn subscribe(&self, kind: ChannelKind, instruments: &[&str]) -> Vec<bool> {
        if kind.is_private() && self.auth.is_none() {
            warn!(channel = %kind, "Private channel subscribed without credentials");
        }
        if instruments.is_empty() {
            return vec![self.registry.add(Channel::unscoped(kind))];
        }
        instruments
            .iter()
            .map(|instrument| self.registry.add(Channel::scoped(kind, *instrument)))
            .collect()
    }

    /// Returns the registered channels.
    #[must_use]
    pub fn channels(&self) -> Vec<Channel> {
        self.registry.snapshot()
    }

    /// Spawns the feed session on the current tokio runtime.
    ///
    /// Call once; the session is the only writer to the stores.
    #[must_use]
    pub fn start(&self) -> FeedHandle {
        info!(
            network = %self.config.network,
            endpoint = self.config.ws_endpoint(),
            authenticated = self.auth.is_some(),
            "Starting feed"
        );
        FeedSession::new(
            WebSocketConfig::from_client(&self.config),
            Arc::clone(&self.registry),
            Arc::clone(&self.stores),
            self.emitter.clone(),
            self.auth.clone(),
        )
        .with_status(Arc::clone(&self.status))
        .spawn()
    }

    /// Returns a receiver for feed events emitted from now on.
    #[must_use]
    pub fn events(&self) -> broadcast::Receiver<FeedEvent> {
        self.emitter.subscribe()
    }

    /// Returns the current orderbook for `instrument`.
    #[must_use]
    pub fn orderbook(&self, instrument: &str) -> Option<Arc<Orderbook>> {
        self.stores.orderbooks.get(instrument)
    }

    /// Returns the current ticker for `instrument`.
    #[must_use]
    pub fn ticker(&self, instrument: &str) -> Option<Ticker> {
        self.stores.tickers.get(&instrument.to_string())
    }

    /// Returns margin balances by currency.
    #[must_use]
    pub fn margins(&self) -> Arc<HashMap<String, Margin>> {
        self.stores.margins.snapshot()
    }

    /// Returns positions by instrument.
    #[must_use]
    pub fn positions(&self) -> Arc<HashMap<String, Position>> {
        self.stores.positions.snapshot()
    }

    /// Returns active orders.
    #[must_use]
    pub fn active_orders(&self) -> Arc<HashMap<OrderKey, Order>> {
        self.stores.orders.snapshot()
    }

    /// Returns every store, for staleness checks and bulk reads.
    #[must_use]
    pub fn stores(&self) -> &Arc<FeedStores> {
        &self.stores
    }

    /// Returns the feed session's state.
    #[must_use]
    pub fn session_state(&self) -> SessionState {
        self.status.read().state
    }

    /// Returns the REST client.
    #[must_use]
    pub fn rest(&self) -> &RestClient {
        &self.rest
    }

    /// Places an order.
    pub async fn new_order(&self, order: &NewOrder) -> Result<Order> {
        self.rest.new_order(order).await
    }

    /// Cancels an order by venue id.
    pub async fn cancel_order(&self, instrument: &str, order_id: i64) -> Result<()> {
        self.rest.cancel_order(instrument, order_id).await
    }

    /// Cancels an order by client-assigned id.
    pub async fn cancel_order_by_client_id(
        &self,
        instrument: &str,
        client_order_id: &str,
    ) -> Result<()> {
        self.rest
            .cancel_order_by_client_id(instrument, client_order_id)
            .await
    }
}

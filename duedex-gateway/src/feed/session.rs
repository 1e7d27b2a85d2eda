//! The reconnecting feed session.
//!
//! One task owns the connection and is the only writer to the stores:
//! connect, authenticate if credentials are configured, replay the channel
//! registry, then read and route messages until the connection fails. After a
//! failure the stores are marked stale and the cycle starts again after a
//! capped exponential backoff. A watch channel stops the loop at any point.

use duedex_core::error::NetworkError;
use duedex_telemetry::spans::{connection_span, session_span};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, sleep_until};
use tracing::{Instrument, debug, error, info, trace, warn};

use super::auth::FeedAuthenticator;
use super::channel::ChannelRegistry;
use super::events::{EventEmitter, FeedEvent};
use super::message::OutboundMessage;
use super::router::{MessageRouter, SessionAction};
use crate::store::FeedStores;
use crate::ws::{Incoming, SessionState, SessionStatus, WebSocketConfig, WsReader, WsWriter, connect};

/// Drives the feed connection for as long as it is not shut down.
pub struct FeedSession {
    config: WebSocketConfig,
    registry: Arc<ChannelRegistry>,
    stores: Arc<FeedStores>,
    router: MessageRouter,
    emitter: EventEmitter,
    status: Arc<RwLock<SessionStatus>>,
}

impl FeedSession {
    /// Creates a session. Nothing happens until it is run.
    #[must_use]
    pub fn new(
        config: WebSocketConfig,
        registry: Arc<ChannelRegistry>,
        stores: Arc<FeedStores>,
        emitter: EventEmitter,
        auth: Option<FeedAuthenticator>,
    ) -> Self {
        let router = MessageRouter::new(Arc::clone(&stores), emitter.clone(), auth);
        Self {
            config,
            registry,
            stores,
            router,
            emitter,
            status: Arc::new(RwLock::new(SessionStatus::default())),
        }
    }

    /// Publishes the session's status into `status` instead of a private one.
    #[must_use]
    pub fn with_status(mut self, status: Arc<RwLock<SessionStatus>>) -> Self {
        self.status = status;
        self
    }

    /// Returns the shared status, updated by the session as it runs.
    #[must_use]
    pub fn status(&self) -> Arc<RwLock<SessionStatus>> {
        Arc::clone(&self.status)
    }

    /// Spawns the session on the current tokio runtime.
    #[must_use]
    pub fn spawn(self) -> FeedHandle {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let status = self.status();
        let task = tokio::spawn(self.run(shutdown_rx));
        FeedHandle {
            shutdown_tx,
            task,
            status,
        }
    }

    /// Runs the connect/read/reconnect cycle until `shutdown` turns true or
    /// its sender is dropped, or reconnect attempts run out.
    pub async fn run(self, mut shutdown: watch::Receiver<bool>) {
        let span = session_span(&self.config.url, self.router.has_credentials());
        async move {
            let mut failures: u32 = 0;
            let mut attempts: u32 = 0;

            loop {
                if *shutdown.borrow_and_update() {
                    break;
                }

                self.set_state(SessionState::Connecting);
                attempts = attempts.saturating_add(1);
                let connected = tokio::select! {
                    _ = shutdown.changed() => break,
                    result = connect(&self.config) => result,
                };

                match connected {
                    Ok((writer, reader)) => {
                        failures = 0;
                        self.status.write().mark_connected();
                        self.emit_state(SessionState::Connected);
                        info!(url = %self.config.url, "Feed connected");

                        let outcome = self
                            .drive(writer, reader, &mut shutdown)
                            .instrument(connection_span(attempts))
                            .await;

                        self.registry.go_offline();
                        self.stores.mark_stale();
                        match outcome {
                            Ok(()) => break,
                            Err(e) => warn!(error = %e, "Feed connection lost"),
                        }
                        self.set_state(SessionState::Disconnected);
                    }
                    Err(e) => {
                        failures = failures.saturating_add(1);
                        self.status.write().mark_failed();
                        self.emit_state(SessionState::Disconnected);
                        warn!(error = %e, failures, "Feed connection failed");
                    }
                }

                if !self.config.reconnect.should_retry(failures) {
                    error!(failures, "Reconnect attempts exhausted");
                    break;
                }

                let delay = self.config.reconnect.delay_for(failures.saturating_sub(1));
                debug!(delay = ?delay, "Reconnecting after delay");
                tokio::select! {
                    _ = shutdown.changed() => break,
                    () = sleep(delay) => {}
                }
            }

            self.set_state(SessionState::Stopped);
            info!("Feed session stopped");
        }
        .instrument(span)
        .await;
    }

    /// Serves one connection. Returns `Ok` on shutdown and the transport
    /// error otherwise.
    ///
    /// After each ping the peer has `pong_timeout` to send anything at all;
    /// a silent peer fails the connection with `Timeout`.
    async fn drive(
        &self,
        mut writer: WsWriter,
        mut reader: WsReader,
        shutdown: &mut watch::Receiver<bool>,
    ) -> Result<(), NetworkError> {
        let (tx, mut outbound) = mpsc::unbounded_channel::<OutboundMessage>();

        if self.router.has_credentials() {
            writer.send_json(&OutboundMessage::Challenge).await?;
            self.set_state(SessionState::AuthPending);
        } else {
            self.activate(&mut writer, tx.clone()).await?;
        }

        let period = self.config.heartbeat_interval();
        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Skip);
        let mut pong_deadline: Option<Instant> = None;

        loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    debug!("Shutdown signal received");
                    writer.close().await;
                    return Ok(());
                }

                Some(message) = outbound.recv() => {
                    writer.send_json(&message).await?;
                }

                _ = heartbeat.tick() => {
                    writer.ping().await?;
                    trace!("Ping sent");
                    if pong_deadline.is_none() {
                        pong_deadline = Some(Instant::now() + self.config.pong_timeout());
                    }
                }

                () = sleep_until(pong_deadline.unwrap_or_else(Instant::now)), if pong_deadline.is_some() => {
                    warn!(timeout_ms = self.config.pong_timeout_ms, "No response to ping");
                    return Err(NetworkError::Timeout {
                        timeout_ms: self.config.pong_timeout_ms,
                    });
                }

                incoming = reader.next() => {
                    pong_deadline = None;
                    let text = match incoming? {
                        Incoming::Text(text) => text,
                        Incoming::Pong => continue,
                    };
                    self.status.write().record_message();
                    match self.router.route(&text) {
                        Some(SessionAction::Send(message)) => writer.send_json(&message).await?,
                        Some(SessionAction::Authenticated) => {
                            self.set_state(SessionState::Authenticated);
                            self.activate(&mut writer, tx.clone()).await?;
                        }
                        None => {}
                    }
                }
            }
        }
    }

    /// Replays every registered channel and lets new ones go straight out.
    async fn activate(
        &self,
        writer: &mut WsWriter,
        tx: mpsc::UnboundedSender<OutboundMessage>,
    ) -> Result<(), NetworkError> {
        let channels = self.registry.go_live(tx);
        if !channels.is_empty() {
            info!(channels = channels.len(), "Replaying subscriptions");
            writer
                .send_json(&OutboundMessage::subscribe(&channels))
                .await?;
        }
        self.set_state(SessionState::Active);
        Ok(())
    }

    fn set_state(&self, state: SessionState) {
        self.status.write().state = state;
        self.emit_state(state);
    }

    fn emit_state(&self, state: SessionState) {
        debug!(state = %state, "Session state changed");
        self.emitter.emit(FeedEvent::SessionStateChanged { state });
    }
}

/// Control handle for a spawned session.
///
/// Dropping the handle without calling [`FeedHandle::shutdown`] also stops
/// the session, at its next await point.
pub struct FeedHandle {
    shutdown_tx: watch::Sender<bool>,
    task: JoinHandle<()>,
    status: Arc<RwLock<SessionStatus>>,
}

impl FeedHandle {
    /// Returns the session's current state.
    #[must_use]
    pub fn state(&self) -> SessionState {
        self.status.read().state
    }

    /// Returns a copy of the session's counters.
    #[must_use]
    pub fn status(&self) -> SessionStatus {
        self.status.read().clone()
    }

    /// Returns true once the session loop has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Signals the session to stop and waits for it to finish.
    pub async fn shutdown(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.task.await {
            error!(error = %e, "Feed session task failed");
        }
    }
}

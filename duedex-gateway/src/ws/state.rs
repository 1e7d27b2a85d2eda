//! Feed session state tracking.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Instant;

/// Protocol state of the feed session.
///
/// `Disconnected → Connecting → Connected → [AuthPending → Authenticated] → Active`,
/// falling back to `Disconnected` on any failure. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SessionState {
    /// No connection; waiting to (re)connect.
    Disconnected,
    /// Connection attempt in progress.
    Connecting,
    /// Socket open, handshake not started.
    Connected,
    /// Challenge requested, waiting for the auth exchange to finish.
    AuthPending,
    /// Auth acknowledged, subscriptions not yet replayed.
    Authenticated,
    /// Subscriptions replayed; new subscriptions are sent immediately.
    Active,
    /// Shut down; the session will not reconnect.
    Stopped,
}

impl SessionState {
    /// Returns true while a socket is open.
    #[must_use]
    pub const fn is_connected(&self) -> bool {
        matches!(
            self,
            Self::Connected | Self::AuthPending | Self::Authenticated | Self::Active
        )
    }

    /// Returns true once subscriptions have been replayed on the current socket.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Disconnected => "Disconnected",
            Self::Connecting => "Connecting",
            Self::Connected => "Connected",
            Self::AuthPending => "AuthPending",
            Self::Authenticated => "Authenticated",
            Self::Active => "Active",
            Self::Stopped => "Stopped",
        };
        f.write_str(name)
    }
}

/// Counters and timestamps describing the session's connection history.
#[derive(Debug, Clone)]
pub struct SessionStatus {
    /// Current protocol state.
    pub state: SessionState,
    /// Consecutive failed connection attempts.
    pub consecutive_failures: u32,
    /// Connections established since start.
    pub connections: u64,
    /// Messages received on all connections.
    pub messages_received: u64,
    /// When the current or last connection was established.
    pub last_connected: Option<Instant>,
    /// When the last message was received.
    pub last_message: Option<Instant>,
}

impl Default for SessionStatus {
    fn default() -> Self {
        Self {
            state: SessionState::Disconnected,
            consecutive_failures: 0,
            connections: 0,
            messages_received: 0,
            last_connected: None,
            last_message: None,
        }
    }
}

impl SessionStatus {
    pub(crate) fn mark_connected(&mut self) {
        self.state = SessionState::Connected;
        self.consecutive_failures = 0;
        self.connections += 1;
        self.last_connected = Some(Instant::now());
    }

    pub(crate) fn mark_failed(&mut self) {
        self.state = SessionState::Disconnected;
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub(crate) fn record_message(&mut self) {
        self.messages_received += 1;
        self.last_message = Some(Instant::now());
    }
}

//! Connection registry: tracks live duplex connections.
//!
//! Each connection gets an outbound queue when it connects; the transport
//! drains the receiving end into its socket. Events addressed to a
//! connection that is gone are dropped.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use teammate_core::message::{ConnectionId, SessionId};
use teammate_core::protocol::OutboundEvent;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, info};

/// Outbound events buffered per connection.
pub const OUTBOUND_CAPACITY: usize = 64;

/// Protocol state of one connection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    /// Connected, no session yet.
    Idle,
    /// A session has been initialized on this connection.
    Ready(SessionId),
}

struct ConnectionEntry {
    outbound: mpsc::Sender<OutboundEvent>,
    state: ConnectionState,
    connected_at: DateTime<Utc>,
}

/// Live connections keyed by transport-assigned id.
pub struct ConnectionRegistry {
    connections: Mutex<HashMap<ConnectionId, ConnectionEntry>>,
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: Mutex::new(HashMap::new()),
        }
    }

    /// Register a new connection in the `Idle` state.
    ///
    /// Returns the receiving end of its outbound queue.
    pub async fn connect(&self, id: ConnectionId) -> mpsc::Receiver<OutboundEvent> {
        let (tx, rx) = mpsc::channel(OUTBOUND_CAPACITY);
        let entry = ConnectionEntry {
            outbound: tx,
            state: ConnectionState::Idle,
            connected_at: Utc::now(),
        };
        self.connections.lock().await.insert(id.clone(), entry);
        info!(connection_id = %id, "Client connected");
        rx
    }

    /// Forget a connection. Its session, if any, is left untouched.
    ///
    /// Returns the session the connection was bound to.
    pub async fn disconnect(&self, id: &ConnectionId) -> Option<SessionId> {
        let entry = self.connections.lock().await.remove(id)?;
        let lifetime_secs = (Utc::now() - entry.connected_at).num_seconds();
        let session = match entry.state {
            ConnectionState::Ready(session) => Some(session),
            ConnectionState::Idle => None,
        };
        info!(
            connection_id = %id,
            session_id = ?session.as_ref().map(|s| s.as_str()),
            lifetime_secs,
            "Client disconnected"
        );
        session
    }

    /// Move a connection to `Ready` for `session`. Re-binding to another
    /// session replaces the previous one.
    ///
    /// Returns `false` if the connection is not registered.
    pub async fn bind(&self, id: &ConnectionId, session: SessionId) -> bool {
        match self.connections.lock().await.get_mut(id) {
            Some(entry) => {
                entry.state = ConnectionState::Ready(session);
                true
            }
            None => false,
        }
    }

    /// Current state, or `None` once the connection has gone.
    pub async fn state(&self, id: &ConnectionId) -> Option<ConnectionState> {
        self.connections
            .lock()
            .await
            .get(id)
            .map(|entry| entry.state.clone())
    }

    /// Queue an event for one connection.
    ///
    /// Returns whether it was queued; an event for a departed connection
    /// is dropped.
    pub async fn send(&self, id: &ConnectionId, event: OutboundEvent) -> bool {
        let sender = self
            .connections
            .lock()
            .await
            .get(id)
            .map(|entry| entry.outbound.clone());

        let Some(sender) = sender else {
            debug!(connection_id = %id, event = event.name(), "Connection gone, event dropped");
            return false;
        };

        match sender.send(event).await {
            Ok(()) => true,
            Err(e) => {
                debug!(connection_id = %id, event = e.0.name(), "Outbound queue closed, event dropped");
                false
            }
        }
    }

    /// Number of live connections.
    pub async fn active_connections(&self) -> usize {
        self.connections.lock().await.len()
    }

    /// Number of live connections bound to `session`.
    pub async fn connections_for(&self, session: &SessionId) -> usize {
        self.connections
            .lock()
            .await
            .values()
            .filter(|entry| matches!(&entry.state, ConnectionState::Ready(s) if s == session))
            .count()
    }
}

//! Domain event system: lifecycle notifications between bounded contexts.
//!
//! Events are published when a connection opens or closes, when a session
//! is initialized, and around each generation round-trip. Subscribers use
//! them for logging and cleanup hooks without coupling to the engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::broadcast;

/// All domain events in the system.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum DomainEvent {
    /// A duplex connection was accepted
    ConnectionOpened {
        connection_id: String,
        timestamp: DateTime<Utc>,
    },

    /// A duplex connection went away
    ConnectionClosed {
        connection_id: String,
        session_id: Option<String>,
        timestamp: DateTime<Utc>,
    },

    /// A session was created or resumed
    SessionInitialized {
        connection_id: String,
        session_id: String,
        created: bool,
        history_len: usize,
        timestamp: DateTime<Utc>,
    },

    /// A user message was appended to a session
    MessageReceived {
        session_id: String,
        message_id: String,
        content_preview: String,
        timestamp: DateTime<Utc>,
    },

    /// The generator replied and the reply was appended
    ResponseGenerated {
        session_id: String,
        message_id: String,
        generator: String,
        duration_ms: u64,
        timestamp: DateTime<Utc>,
    },

    /// A contained error occurred
    ErrorOccurred {
        context: String,
        error_message: String,
        timestamp: DateTime<Utc>,
    },
}

impl DomainEvent {
    pub fn name(&self) -> &'static str {
        match self {
            DomainEvent::ConnectionOpened { .. } => "connection_opened",
            DomainEvent::ConnectionClosed { .. } => "connection_closed",
            DomainEvent::SessionInitialized { .. } => "session_initialized",
            DomainEvent::MessageReceived { .. } => "message_received",
            DomainEvent::ResponseGenerated { .. } => "response_generated",
            DomainEvent::ErrorOccurred { .. } => "error_occurred",
        }
    }
}

/// Fan-out of lifecycle events to any number of listeners.
///
/// Slow listeners lag and lose the oldest events; publishers never wait.
pub struct EventBus {
    sender: broadcast::Sender<Arc<DomainEvent>>,
}

impl EventBus {
    /// `capacity` events are buffered per listener.
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub fn publish(&self, event: DomainEvent) {
        let _ = self.sender.send(Arc::new(event));
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Arc<DomainEvent>> {
        self.sender.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn listener_receives_published_event() {
        let bus = EventBus::new(16);
        let mut rx = bus.subscribe();

        bus.publish(DomainEvent::SessionInitialized {
            connection_id: "c1".into(),
            session_id: "s1".into(),
            created: true,
            history_len: 0,
            timestamp: Utc::now(),
        });

        let event = rx.recv().await.unwrap();
        assert_eq!(event.name(), "session_initialized");
        match event.as_ref() {
            DomainEvent::SessionInitialized {
                session_id, created, ..
            } => {
                assert_eq!(session_id, "s1");
                assert!(created);
            }
            _ => panic!("Expected SessionInitialized event"),
        }
    }

    #[test]
    fn publish_without_listeners() {
        let bus = EventBus::new(16);
        bus.publish(DomainEvent::ErrorOccurred {
            context: "test".into(),
            error_message: "no subscribers".into(),
            timestamp: Utc::now(),
        });
    }
}

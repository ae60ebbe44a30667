//! The per-connection event state machine.
//!
//! ```text
//! connect ──▶ Idle ──sessionInit──▶ Ready(session) ──disconnect──▶ gone
//!              │                      │
//!              └─ connectionInit ─────┴─ ack, state unchanged
//! ```
//!
//! A text message needs its session to exist in the store, not a `Ready`
//! connection: the session id travels with every message.

use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use teammate_channels::ConnectionRegistry;
use teammate_core::error::ProtocolError;
use teammate_core::event::{DomainEvent, EventBus};
use teammate_core::message::{ConnectionId, Message, SessionId};
use teammate_core::protocol::{
    InboundEvent, OutboundEvent, SessionInitRequest, SessionSnapshot, TextMessagePayload,
};
use teammate_core::provider::TextGenerator;
use teammate_core::vector::VectorStore;
use teammate_sessions::SessionStore;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Characters of a message kept in event previews.
const PREVIEW_CHARS: usize = 80;

/// Semantic search used to ground replies.
struct Retriever {
    store: Arc<dyn VectorStore>,
    class_name: String,
}

/// Drives the duplex protocol for every connection.
pub struct ProtocolEngine {
    /// Session histories, shared process-wide
    sessions: Arc<SessionStore>,

    /// Live connections and their outbound queues
    connections: Arc<ConnectionRegistry>,

    /// Reply generator
    generator: Arc<dyn TextGenerator>,

    /// Lifecycle notifications
    event_bus: Arc<EventBus>,

    /// Optional retrieval context for replies
    retriever: Option<Retriever>,
}

impl ProtocolEngine {
    pub fn new(
        sessions: Arc<SessionStore>,
        connections: Arc<ConnectionRegistry>,
        generator: Arc<dyn TextGenerator>,
        event_bus: Arc<EventBus>,
    ) -> Self {
        Self {
            sessions,
            connections,
            generator,
            event_bus,
            retriever: None,
        }
    }

    /// Ground every reply in a semantic search over `class_name`.
    pub fn with_retrieval(mut self, store: Arc<dyn VectorStore>, class_name: impl Into<String>) -> Self {
        self.retriever = Some(Retriever {
            store,
            class_name: class_name.into(),
        });
        self
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    pub fn connections(&self) -> &Arc<ConnectionRegistry> {
        &self.connections
    }

    pub fn event_bus(&self) -> &Arc<EventBus> {
        &self.event_bus
    }

    /// A transport accepted a connection. Nothing is emitted.
    pub async fn on_connect(&self, connection: &ConnectionId) -> mpsc::Receiver<OutboundEvent> {
        let rx = self.connections.connect(connection.clone()).await;
        self.event_bus.publish(DomainEvent::ConnectionOpened {
            connection_id: connection.to_string(),
            timestamp: Utc::now(),
        });
        rx
    }

    /// A transport lost a connection. The session store is not touched.
    pub async fn on_disconnect(&self, connection: &ConnectionId) {
        let session = self.connections.disconnect(connection).await;
        self.event_bus.publish(DomainEvent::ConnectionClosed {
            connection_id: connection.to_string(),
            session_id: session.map(|s| s.to_string()),
            timestamp: Utc::now(),
        });
    }

    /// Decode and handle one text frame.
    pub async fn handle_frame(
        &self,
        connection: &ConnectionId,
        frame: &str,
    ) -> Result<(), ProtocolError> {
        let event = InboundEvent::parse(frame)?;
        self.handle(connection, event).await
    }

    /// Handle one decoded event.
    pub async fn handle(
        &self,
        connection: &ConnectionId,
        event: InboundEvent,
    ) -> Result<(), ProtocolError> {
        debug!(connection_id = %connection, event = event.name(), "Inbound event");
        match event {
            InboundEvent::ConnectionInit => {
                self.connections
                    .send(connection, OutboundEvent::ConnectionAck)
                    .await;
                Ok(())
            }
            InboundEvent::SessionInit(request) => self.session_init(connection, request).await,
            InboundEvent::TextMessage(payload) => self.text_message(connection, payload).await,
            InboundEvent::Ping => {
                self.connections.send(connection, OutboundEvent::Pong).await;
                Ok(())
            }
        }
    }

    /// Create or resume a session and send its history back.
    async fn session_init(
        &self,
        connection: &ConnectionId,
        request: SessionInitRequest,
    ) -> Result<(), ProtocolError> {
        let session_id = request
            .session_id
            .ok_or_else(|| ProtocolError::InvalidPayload("sessionInit without sessionId".into()))?;

        let (session, created) = self.sessions.get_or_create(&session_id);
        let chat_history = session.snapshot();
        self.connections.bind(connection, session_id.clone()).await;

        info!(
            connection_id = %connection,
            session_id = %session_id,
            created,
            history_len = chat_history.len(),
            "Session initialized"
        );
        self.event_bus.publish(DomainEvent::SessionInitialized {
            connection_id: connection.to_string(),
            session_id: session_id.to_string(),
            created,
            history_len: chat_history.len(),
            timestamp: Utc::now(),
        });

        self.connections
            .send(
                connection,
                OutboundEvent::SessionInit(SessionSnapshot {
                    session_id,
                    chat_history,
                }),
            )
            .await;
        Ok(())
    }

    /// Record the user message, generate a reply, record it, then emit it.
    async fn text_message(
        &self,
        connection: &ConnectionId,
        payload: TextMessagePayload,
    ) -> Result<(), ProtocolError> {
        let Some(session_id) = payload.session_id.filter(|s| !s.as_str().is_empty()) else {
            warn!(connection_id = %connection, message_id = %payload.id, "No session ID provided");
            return Ok(());
        };

        let session = self
            .sessions
            .get(&session_id)
            .ok_or_else(|| ProtocolError::SessionNotFound(session_id.clone()))?;

        // Recorded before generation so a failed reply still leaves the request in history.
        session.append(Message::user(
            &payload.id,
            &payload.message,
            payload.timestamp.clone(),
        ));
        self.event_bus.publish(DomainEvent::MessageReceived {
            session_id: session_id.to_string(),
            message_id: payload.id.clone(),
            content_preview: payload.message.chars().take(PREVIEW_CHARS).collect(),
            timestamp: Utc::now(),
        });

        let context = self.retrieve(&payload.message).await;
        let started = Instant::now();
        let text = self
            .generator
            .generate(&payload.message, context.as_deref())
            .await
            .map_err(|source| ProtocolError::GenerationFailed {
                session_id: session_id.clone(),
                message_id: payload.id.clone(),
                source,
            })?;
        let duration_ms = started.elapsed().as_millis() as u64;

        let reply = Message::reply(&payload.id, text, payload.timestamp);
        session.append(reply.clone());

        info!(
            connection_id = %connection,
            session_id = %session_id,
            message_id = %payload.id,
            duration_ms,
            "Reply generated"
        );
        self.event_bus.publish(DomainEvent::ResponseGenerated {
            session_id: session_id.to_string(),
            message_id: payload.id,
            generator: self.generator.name().to_string(),
            duration_ms,
            timestamp: Utc::now(),
        });

        if let Message::Assistant(response) = reply {
            self.connections
                .send(connection, OutboundEvent::TextResponse(response))
                .await;
        }
        Ok(())
    }

    /// Retrieval context for `query`, if retrieval is configured.
    ///
    /// A failed search degrades to no context.
    async fn retrieve(&self, query: &str) -> Option<String> {
        let retriever = self.retriever.as_ref()?;
        match retriever.store.search(query, &retriever.class_name).await {
            Ok(results) => serde_json::to_string(&results).ok(),
            Err(e) => {
                warn!(class = %retriever.class_name, error = %e, "Retrieval failed, replying without context");
                None
            }
        }
    }

    /// History of a session, for diagnostics.
    pub fn history(&self, session_id: &SessionId) -> Result<Vec<Message>, ProtocolError> {
        self.sessions.history(session_id)
    }
}

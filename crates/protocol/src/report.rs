//! Error translation for the duplex protocol.
//!
//! A failed event never ends the connection. Every failure is logged and
//! published; failures the client can act on are also sent back as an
//! `error` event.

use chrono::Utc;
use teammate_core::error::{ErrorKind, ProtocolError};
use teammate_core::event::DomainEvent;
use teammate_core::message::ConnectionId;
use teammate_core::protocol::{ErrorPayload, OutboundEvent};
use tracing::{error, warn};

use crate::engine::ProtocolEngine;

/// The client-facing event for a failure, if the client should see one.
///
/// Generation failures stay server-side: the client sees no reply.
pub fn client_event(err: &ProtocolError) -> Option<OutboundEvent> {
    match err.kind() {
        ErrorKind::InvalidPayload | ErrorKind::SessionNotFound => Some(OutboundEvent::Error(
            ErrorPayload::new(err.kind(), err.to_string()),
        )),
        _ => None,
    }
}

impl ProtocolEngine {
    /// Handle one frame and contain whatever goes wrong.
    pub async fn dispatch(&self, connection: &ConnectionId, frame: &str) {
        if let Err(err) = self.handle_frame(connection, frame).await {
            self.report(connection, err).await;
        }
    }

    /// Log, publish, and (where meaningful) echo a failure to its connection.
    pub async fn report(&self, connection: &ConnectionId, err: ProtocolError) {
        match &err {
            ProtocolError::GenerationFailed { source, .. } => {
                error!(connection_id = %connection, error = %err, cause = %source, "Error generating response");
            }
            _ => warn!(connection_id = %connection, kind = %err.kind(), error = %err, "Event rejected"),
        }

        self.event_bus().publish(DomainEvent::ErrorOccurred {
            context: format!("connection {connection}"),
            error_message: err.to_string(),
            timestamp: Utc::now(),
        });

        if let Some(event) = client_event(&err) {
            self.connections().send(connection, event).await;
        }
    }
}

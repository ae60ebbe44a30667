//! Duplex channel wire events.
//!
//! Every WebSocket text frame carries one event encoded as
//! `{"event": "<name>", "data": <payload>}`; `data` is omitted for events
//! without a payload.

use serde::{Deserialize, Serialize};

use crate::error::{ErrorKind, ProtocolError};
use crate::message::{AssistantMessage, Message, SessionId};

/// Events a client sends to the gateway.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum InboundEvent {
    /// Acknowledgement handshake, independent of any session.
    ConnectionInit,
    /// Create or resume a session.
    SessionInit(SessionInitRequest),
    /// A user chat message.
    TextMessage(TextMessagePayload),
    /// Keep-alive.
    Ping,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionInitRequest {
    #[serde(default)]
    pub session_id: Option<SessionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TextMessagePayload {
    /// Absent session ids are tolerated and make the message a no-op.
    #[serde(default)]
    pub session_id: Option<SessionId>,
    pub id: String,
    pub message: String,
    #[serde(default)]
    pub timestamp: serde_json::Value,
}

/// The assistant reply as sent on the wire.
pub type TextResponsePayload = AssistantMessage;

/// Events the gateway sends to a client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "event", content = "data", rename_all = "camelCase")]
pub enum OutboundEvent {
    ConnectionAck,
    SessionInit(SessionSnapshot),
    TextResponse(TextResponsePayload),
    Error(ErrorPayload),
    Pong,
}

/// A session's identifier together with its full history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub chat_history: Vec<Message>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub kind: String,
    pub message: String,
}

impl ErrorPayload {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind: kind.to_string(),
            message: message.into(),
        }
    }
}

impl InboundEvent {
    /// Decode one text frame.
    pub fn parse(frame: &str) -> Result<Self, ProtocolError> {
        serde_json::from_str(frame).map_err(|e| ProtocolError::InvalidPayload(e.to_string()))
    }

    /// Event name as it appears on the wire, for logging.
    pub fn name(&self) -> &'static str {
        match self {
            InboundEvent::ConnectionInit => "connectionInit",
            InboundEvent::SessionInit(_) => "sessionInit",
            InboundEvent::TextMessage(_) => "textMessage",
            InboundEvent::Ping => "ping",
        }
    }
}

impl OutboundEvent {
    /// Encode as one text frame.
    pub fn to_frame(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub fn name(&self) -> &'static str {
        match self {
            OutboundEvent::ConnectionAck => "connectionAck",
            OutboundEvent::SessionInit(_) => "sessionInit",
            OutboundEvent::TextResponse(_) => "textResponse",
            OutboundEvent::Error(_) => "error",
            OutboundEvent::Pong => "pong",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parse_connection_init_without_data() {
        let event = InboundEvent::parse(r#"{"event":"connectionInit"}"#).unwrap();
        assert_eq!(event, InboundEvent::ConnectionInit);
    }

    #[test]
    fn parse_session_init() {
        let event =
            InboundEvent::parse(r#"{"event":"sessionInit","data":{"sessionId":"s1"}}"#).unwrap();
        assert_eq!(
            event,
            InboundEvent::SessionInit(SessionInitRequest {
                session_id: Some(SessionId::from("s1")),
            })
        );
    }

    #[test]
    fn parse_text_message_without_session() {
        let frame = r#"{"event":"textMessage","data":{"id":"m1","message":"hi","timestamp":1}}"#;
        match InboundEvent::parse(frame).unwrap() {
            InboundEvent::TextMessage(payload) => {
                assert!(payload.session_id.is_none());
                assert_eq!(payload.id, "m1");
                assert_eq!(payload.timestamp, json!(1));
            }
            other => panic!("Expected TextMessage, got {other:?}"),
        }
    }

    #[test]
    fn unknown_event_is_invalid_payload() {
        let err = InboundEvent::parse(r#"{"event":"teleport","data":{}}"#).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidPayload);
    }

    #[test]
    fn session_init_frame_shape() {
        let event = OutboundEvent::SessionInit(SessionSnapshot {
            session_id: SessionId::from("s1"),
            chat_history: vec![],
        });
        let value: serde_json::Value = serde_json::from_str(&event.to_frame().unwrap()).unwrap();
        assert_eq!(
            value,
            json!({"event": "sessionInit", "data": {"sessionId": "s1", "chatHistory": []}})
        );
    }

    #[test]
    fn connection_ack_has_no_data() {
        let frame = OutboundEvent::ConnectionAck.to_frame().unwrap();
        assert_eq!(frame, r#"{"event":"connectionAck"}"#);
    }
}

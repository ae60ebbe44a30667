//! Message, session, and connection domain types.
//!
//! These are the value objects that flow through the gateway:
//! client sends a text message → engine appends it to the session →
//! generator replies → engine appends and emits the reply.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Client-supplied identifier of a conversation session.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Transport-assigned identifier of one live duplex connection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConnectionId(pub String);

impl ConnectionId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl From<&str> for ConnectionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ConnectionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl Default for ConnectionId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Suffix appended to a user message id to form the id of its reply.
pub const RESPONSE_ID_SUFFIX: &str = "_response";

/// A message sent by the user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserMessage {
    pub id: String,
    pub message: String,
    pub is_user_message: bool,
    /// Opaque client timestamp, echoed back unchanged.
    #[serde(default)]
    pub timestamp: serde_json::Value,
}

/// A reply generated by the assistant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssistantMessage {
    pub id: String,
    pub text_response: String,
    pub is_user_message: bool,
    #[serde(default)]
    pub timestamp: serde_json::Value,
    pub is_complete: bool,
}

/// A single entry of a session's chat history.
///
/// Serializes to exactly the objects the client renders, so a history can
/// be sent over the wire as-is.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Message {
    User(UserMessage),
    Assistant(AssistantMessage),
}

impl Message {
    /// Create a user message.
    pub fn user(
        id: impl Into<String>,
        body: impl Into<String>,
        timestamp: serde_json::Value,
    ) -> Self {
        Message::User(UserMessage {
            id: id.into(),
            message: body.into(),
            is_user_message: true,
            timestamp,
        })
    }

    /// Create the assistant reply to the user message `reply_to`.
    ///
    /// The reply id is the user message id with [`RESPONSE_ID_SUFFIX`]
    /// appended, and the client timestamp is carried over.
    pub fn reply(reply_to: &str, body: impl Into<String>, timestamp: serde_json::Value) -> Self {
        Message::Assistant(AssistantMessage {
            id: format!("{reply_to}{RESPONSE_ID_SUFFIX}"),
            text_response: body.into(),
            is_user_message: false,
            timestamp,
            is_complete: true,
        })
    }

    pub fn id(&self) -> &str {
        match self {
            Message::User(m) => &m.id,
            Message::Assistant(m) => &m.id,
        }
    }

    pub fn body(&self) -> &str {
        match self {
            Message::User(m) => &m.message,
            Message::Assistant(m) => &m.text_response,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self, Message::User(_))
    }

    pub fn timestamp(&self) -> &serde_json::Value {
        match self {
            Message::User(m) => &m.timestamp,
            Message::Assistant(m) => &m.timestamp,
        }
    }
}

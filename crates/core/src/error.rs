//! Error types for the TeamMate domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum; [`ErrorKind`] collapses
//! them into the taxonomy the transport layers report on.

use std::path::PathBuf;

use thiserror::Error;

use crate::message::SessionId;

/// The top-level error type for all TeamMate operations.
#[derive(Debug, Error)]
pub enum Error {
    // --- Generation provider errors ---
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),

    // --- Vector store errors ---
    #[error("Vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    // --- Schema errors ---
    #[error("Schema error: {0}")]
    Schema(#[from] SchemaError),

    // --- Protocol errors ---
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    // --- Configuration errors ---
    #[error("Configuration error: {message}")]
    Config { message: String },

    // --- Serialization ---
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // --- Generic ---
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type alias using our Error.
pub type Result<T> = std::result::Result<T, Error>;

/// The failure classes surfaced to clients and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// A text message referenced a session that was never initialized.
    SessionNotFound,
    /// The generation adapter failed or timed out.
    GenerationFailed,
    /// A vector-store call failed.
    ProviderUnavailable,
    /// The schema source is missing or malformed.
    SchemaFileError,
    /// A duplex frame could not be decoded.
    InvalidPayload,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ErrorKind::SessionNotFound => "SessionNotFound",
            ErrorKind::GenerationFailed => "GenerationFailed",
            ErrorKind::ProviderUnavailable => "ProviderUnavailable",
            ErrorKind::SchemaFileError => "SchemaFileError",
            ErrorKind::InvalidPayload => "InvalidPayload",
        };
        f.write_str(s)
    }
}

impl Error {
    /// Classify this error, if it belongs to the reported taxonomy.
    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            Error::Provider(_) => Some(ErrorKind::GenerationFailed),
            Error::VectorStore(_) => Some(ErrorKind::ProviderUnavailable),
            Error::Schema(e) => Some(e.kind()),
            Error::Protocol(e) => Some(e.kind()),
            _ => None,
        }
    }
}

// --- Bounded context errors ---

/// Failures of the text-generation provider.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Provider returned no completion")]
    EmptyResponse,

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// Failures of the vector-search backend.
#[derive(Debug, Clone, Error)]
pub enum VectorStoreError {
    #[error("Vector store unreachable: {0}")]
    Unavailable(String),

    #[error("Vector store rejected request: {message} (status: {status_code})")]
    Rejected { status_code: u16, message: String },

    #[error("Invalid vector store response: {0}")]
    InvalidResponse(String),

    #[error("I/O error: {0}")]
    Io(String),

    #[error("CSV error: {0}")]
    Csv(String),
}

/// Failures while loading or applying a schema definition.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("Schema file not found: {}", path.display())]
    NotFound { path: PathBuf },

    #[error("Malformed schema file {}: {reason}", path.display())]
    Malformed { path: PathBuf, reason: String },

    #[error("Error creating class {class}: {source}")]
    ClassCreation {
        class: String,
        #[source]
        source: VectorStoreError,
    },

    #[error("Error resetting schema: {0}")]
    Reset(#[source] VectorStoreError),
}

impl SchemaError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SchemaError::NotFound { .. } | SchemaError::Malformed { .. } => {
                ErrorKind::SchemaFileError
            }
            SchemaError::ClassCreation { .. } | SchemaError::Reset(_) => {
                ErrorKind::ProviderUnavailable
            }
        }
    }
}

/// Failures raised by the message protocol engine.
///
/// These are contained per event: none of them closes the connection.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Session {0} not found")]
    SessionNotFound(SessionId),

    #[error("Generation failed for message {message_id} in session {session_id}: {source}")]
    GenerationFailed {
        session_id: SessionId,
        message_id: String,
        #[source]
        source: ProviderError,
    },

    #[error("Invalid payload: {0}")]
    InvalidPayload(String),
}

impl ProtocolError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            ProtocolError::SessionNotFound(_) => ErrorKind::SessionNotFound,
            ProtocolError::GenerationFailed { .. } => ErrorKind::GenerationFailed,
            ProtocolError::InvalidPayload(_) => ErrorKind::InvalidPayload,
        }
    }
}

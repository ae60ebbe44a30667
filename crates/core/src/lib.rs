//! # TeamMate Core
//!
//! Domain types, traits, and error definitions for the TeamMate chat gateway.
//! This crate has **no framework dependencies**: it defines the domain model
//! that every other crate implements against.
//!
//! ## Design Philosophy
//!
//! Each external collaborator (text generation, vector search) is a trait
//! here. Implementations live in `teammate-providers`, and the protocol
//! engine only ever sees the trait objects. This keeps the engine testable
//! with scripted generators and keeps the dependency graph pointing inward.

pub mod error;
pub mod event;
pub mod message;
pub mod protocol;
pub mod provider;
pub mod vector;

// Re-export key types at crate root for ergonomics
pub use error::{Error, ErrorKind, ProtocolError, ProviderError, Result, SchemaError, VectorStoreError};
pub use event::{DomainEvent, EventBus};
pub use message::{ConnectionId, Message, SessionId};
pub use protocol::{InboundEvent, OutboundEvent, TextMessagePayload, TextResponsePayload};
pub use provider::TextGenerator;
pub use vector::VectorStore;

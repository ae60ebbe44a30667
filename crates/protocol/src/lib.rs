//! Message protocol engine for TeamMate.
//!
//! Validates inbound duplex events, drives the session store and the
//! generation round-trip, and queues outbound events on the originating
//! connection. Errors are contained per event; [`report`] translates them
//! into logs and client-facing error events.

pub mod engine;
pub mod report;

pub use engine::ProtocolEngine;
pub use report::client_event;

//! Duplex connection bookkeeping for TeamMate.
//!
//! The registry owns one outbound queue per live connection and the
//! connection's protocol state. It never owns session history.

pub mod registry;

pub use registry::{ConnectionRegistry, ConnectionState, OUTBOUND_CAPACITY};

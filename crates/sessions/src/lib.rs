//! Session store for TeamMate.
//!
//! Sessions live for the lifetime of the process; there is no eviction and
//! no persistence.

pub mod store;

pub use store::{Session, SessionStore};

//! Session registry: the sidebar's list of conversations.
//!
//! Keeps the local list of sessions for the current identity synchronized
//! with the backend, with optimistic local updates where the product calls
//! for them (rename-on-first-message) and last-known-good retention on
//! fetch failures.

pub mod error;
pub mod registry;

pub use error::SessionError;
pub use registry::{derive_session_name, SessionEntry, SessionRegistry};

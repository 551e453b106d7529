//! Backend gateway for the Wayfarer client core.
//!
//! Defines the logical contract of the remote conversational backend as an
//! async trait plus the wire DTOs, independent of any transport. The
//! in-memory [`MockBackend`] implements the same contract for tests and the
//! demo binary.

pub mod client;
pub mod error;
pub mod mock;
pub mod types;

pub use client::BackendClient;
pub use error::BackendError;
pub use mock::{MockBackend, ReplyScript};
pub use types::{HistoryEntry, ProfileFields, RegistrationFields, SessionRecord};

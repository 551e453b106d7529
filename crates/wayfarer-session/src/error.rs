//! Error types for the session registry.

use wayfarer_core::WayfarerError;

/// Errors from session registry operations.
///
/// Each backend-facing operation maps its failure to a distinct variant so
/// the presentation layer can raise the matching notice. None of these
/// trigger a retry, and none of them disturb the last-known-good list.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("failed to fetch sessions: {0}")]
    Fetch(String),
    #[error("failed to create session: {0}")]
    Create(String),
    #[error("failed to rename session: {0}")]
    Rename(String),
    #[error("failed to delete session: {0}")]
    Delete(String),
    #[error("unknown session: {0}")]
    NotFound(String),
}

impl From<SessionError> for WayfarerError {
    fn from(err: SessionError) -> Self {
        WayfarerError::Session(err.to_string())
    }
}

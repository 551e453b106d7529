//! Error types for conversation orchestration.

use wayfarer_core::WayfarerError;
use wayfarer_session::SessionError;
use wayfarer_speech::SpeechError;

/// Errors from the conversation orchestrator.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    /// No identity token: the operation was blocked before any network
    /// call.
    #[error("no authentication token available")]
    MissingToken,
    #[error("message cannot be empty")]
    EmptyMessage,
    #[error("message exceeds maximum length of {0} characters")]
    MessageTooLong(usize),
    #[error("authentication failed: {0}")]
    Auth(String),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error(transparent)]
    Speech(#[from] SpeechError),
}

impl From<ChatError> for WayfarerError {
    fn from(err: ChatError) -> Self {
        WayfarerError::Chat(err.to_string())
    }
}

//! Error types for speech input.

use wayfarer_core::WayfarerError;

/// Errors from the speech input controller.
#[derive(Debug, thiserror::Error)]
pub enum SpeechError {
    #[error("speech recognition is not supported on this platform")]
    UnsupportedCapability,
    #[error("recognition error: {0}")]
    Recognition(String),
}

impl From<SpeechError> for WayfarerError {
    fn from(err: SpeechError) -> Self {
        WayfarerError::Speech(err.to_string())
    }
}

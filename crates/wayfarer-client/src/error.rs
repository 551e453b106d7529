//! Error type for backend gateway calls.

use wayfarer_core::WayfarerError;

/// Errors a backend call can produce, transport-agnostic.
#[derive(Debug, thiserror::Error)]
pub enum BackendError {
    #[error("unauthorized: missing or invalid token")]
    Unauthorized,
    #[error("session not found: {0}")]
    SessionNotFound(String),
    #[error("invalid credentials")]
    InvalidCredentials,
    #[error("backend unavailable: {0}")]
    Unavailable(String),
}

impl From<BackendError> for WayfarerError {
    fn from(err: BackendError) -> Self {
        WayfarerError::Backend(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        assert_eq!(
            BackendError::Unauthorized.to_string(),
            "unauthorized: missing or invalid token"
        );
        assert_eq!(
            BackendError::SessionNotFound("s9".to_string()).to_string(),
            "session not found: s9"
        );
        assert_eq!(
            BackendError::InvalidCredentials.to_string(),
            "invalid credentials"
        );
        assert_eq!(
            BackendError::Unavailable("timeout".to_string()).to_string(),
            "backend unavailable: timeout"
        );
    }

    #[test]
    fn test_conversion_to_core_error() {
        let err: WayfarerError = BackendError::Unauthorized.into();
        assert!(matches!(err, WayfarerError::Backend(_)));
        assert!(err.to_string().contains("unauthorized"));
    }
}

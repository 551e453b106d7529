//! The logical backend contract.

use async_trait::async_trait;
use wayfarer_core::Identity;

use crate::error::BackendError;
use crate::types::{HistoryEntry, ProfileFields, RegistrationFields, SessionRecord};

/// Remote operations the conversational core depends on.
///
/// Transport and encoding are a separate concern; implementations only have
/// to honor the contracts below. `send_query` returns the raw reply payload
/// so that shape validation happens at the timeline's parse boundary, not
/// here.
#[async_trait]
pub trait BackendClient: Send + Sync {
    /// All sessions owned by the token's identity, most recent first.
    async fn list_sessions(&self, token: &str) -> Result<Vec<SessionRecord>, BackendError>;

    /// Create a session and return its server-assigned record.
    async fn create_session(&self, token: &str) -> Result<SessionRecord, BackendError>;

    /// Rename a session.
    async fn rename_session(
        &self,
        token: &str,
        session_id: &str,
        name: &str,
    ) -> Result<(), BackendError>;

    /// Delete a session. Returns a human-readable confirmation on success.
    async fn delete_session(&self, token: &str, session_id: &str)
        -> Result<String, BackendError>;

    /// Full message history of a session, oldest first.
    async fn get_history(
        &self,
        token: &str,
        session_id: &str,
    ) -> Result<Vec<HistoryEntry>, BackendError>;

    /// Send a user query and return the raw reply payload
    /// (`{message, places}` when well-formed).
    async fn send_query(
        &self,
        token: &str,
        session_id: &str,
        query: &str,
        max_places: u32,
    ) -> Result<serde_json::Value, BackendError>;

    /// Enter as a guest. No token required; the returned identity carries a
    /// short-lived one.
    async fn guest_entry(&self) -> Result<Identity, BackendError>;

    /// Authenticate and return the identity with its token.
    async fn login(&self, email: &str, password: &str) -> Result<Identity, BackendError>;

    /// Register a new account. Returns a confirmation message.
    async fn register(&self, fields: &RegistrationFields) -> Result<String, BackendError>;

    /// Update profile fields. Returns a confirmation message.
    async fn update_profile(
        &self,
        token: &str,
        fields: &ProfileFields,
    ) -> Result<String, BackendError>;

    /// Request a password reset. Returns a confirmation message.
    async fn forgot_password(&self, email: &str) -> Result<String, BackendError>;
}

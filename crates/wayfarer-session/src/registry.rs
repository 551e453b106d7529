//! The session registry.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};

use wayfarer_client::BackendClient;

use crate::error::SessionError;

/// A session as held in the local list.
///
/// `renamed` records that the one-shot rename-on-first-message already
/// fired for this session, locally or (for sessions fetched with a
/// non-default name) on the backend.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionEntry {
    pub session_id: String,
    pub session_name: String,
    pub renamed: bool,
}

/// Derive a session name from the first message sent in it: the first five
/// whitespace-separated tokens.
pub fn derive_session_name(message: &str) -> String {
    message
        .split_whitespace()
        .take(5)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Local session list, kept in sync with the backend.
///
/// The list always places the most recently created session first.
/// At most one session is selected at a time; deleting the selected
/// session clears the selection.
pub struct SessionRegistry {
    backend: Arc<dyn BackendClient>,
    default_name: String,
    sessions: Mutex<Vec<SessionEntry>>,
    selected: Mutex<Option<String>>,
}

impl SessionRegistry {
    pub fn new(backend: Arc<dyn BackendClient>, default_name: impl Into<String>) -> Self {
        Self {
            backend,
            default_name: default_name.into(),
            sessions: Mutex::new(Vec::new()),
            selected: Mutex::new(None),
        }
    }

    /// Snapshot of the current list, most recently created first.
    pub fn sessions(&self) -> Vec<SessionEntry> {
        self.sessions.lock().expect("sessions mutex poisoned").clone()
    }

    /// The selected session id, if any.
    pub fn selected(&self) -> Option<String> {
        self.selected.lock().expect("selected mutex poisoned").clone()
    }

    /// Look up one entry by id.
    pub fn entry(&self, session_id: &str) -> Option<SessionEntry> {
        self.sessions
            .lock()
            .expect("sessions mutex poisoned")
            .iter()
            .find(|s| s.session_id == session_id)
            .cloned()
    }

    /// Whether the first-message rename is still pending for a session.
    pub fn needs_rename(&self, session_id: &str) -> bool {
        self.entry(session_id).is_some_and(|e| !e.renamed)
    }

    /// Replace the list with the backend's view.
    ///
    /// On failure the previously loaded list is left untouched.
    pub async fn refresh(&self, token: &str) -> Result<(), SessionError> {
        let records = self
            .backend
            .list_sessions(token)
            .await
            .map_err(|e| SessionError::Fetch(e.to_string()))?;

        let entries: Vec<SessionEntry> = records
            .into_iter()
            .map(|r| SessionEntry {
                renamed: r.session_name != self.default_name,
                session_id: r.session_id,
                session_name: r.session_name,
            })
            .collect();

        tracing::debug!(count = entries.len(), "Session list refreshed");
        *self.sessions.lock().expect("sessions mutex poisoned") = entries;
        Ok(())
    }

    /// Create a session on the backend, prepend it locally, and select it.
    ///
    /// On failure neither the list nor the selection changes.
    pub async fn create(&self, token: &str) -> Result<String, SessionError> {
        let record = self
            .backend
            .create_session(token)
            .await
            .map_err(|e| SessionError::Create(e.to_string()))?;

        let entry = SessionEntry {
            session_id: record.session_id.clone(),
            session_name: record.session_name,
            renamed: false,
        };
        self.sessions
            .lock()
            .expect("sessions mutex poisoned")
            .insert(0, entry);
        *self.selected.lock().expect("selected mutex poisoned") =
            Some(record.session_id.clone());

        tracing::info!(session_id = %record.session_id, "Session created");
        Ok(record.session_id)
    }

    /// Set the selection locally. Immediate and optimistic; never rolled
    /// back by a later history-fetch failure. `None` clears the selection.
    pub fn select(&self, session_id: Option<String>) {
        tracing::debug!(session_id = ?session_id, "Session selected");
        *self.selected.lock().expect("selected mutex poisoned") = session_id;
    }

    /// Rename a session after its first message.
    ///
    /// Fires at most once per session. The local name is updated
    /// optimistically before the backend call; a backend failure is visible
    /// only through the returned flag, and the optimistic name stands.
    pub async fn rename_on_first_message(
        &self,
        token: &str,
        session_id: &str,
        message: &str,
    ) -> Result<bool, SessionError> {
        let derived = derive_session_name(message);
        {
            let mut sessions = self.sessions.lock().expect("sessions mutex poisoned");
            let entry = sessions
                .iter_mut()
                .find(|s| s.session_id == session_id)
                .ok_or_else(|| SessionError::NotFound(session_id.to_string()))?;
            if entry.renamed {
                return Ok(true);
            }
            entry.session_name = derived.clone();
            entry.renamed = true;
        }

        match self
            .backend
            .rename_session(token, session_id, &derived)
            .await
        {
            Ok(()) => {
                tracing::info!(session_id, name = %derived, "Session renamed");
                Ok(true)
            }
            Err(e) => {
                tracing::warn!(session_id, error = %e, "Session rename failed; keeping optimistic name");
                Ok(false)
            }
        }
    }

    /// Delete a session. Only removed locally once the backend confirms;
    /// deleting the selected session clears the selection. Returns the
    /// backend's confirmation message.
    pub async fn delete(&self, token: &str, session_id: &str) -> Result<String, SessionError> {
        let confirmation = self
            .backend
            .delete_session(token, session_id)
            .await
            .map_err(|e| SessionError::Delete(e.to_string()))?;

        self.sessions
            .lock()
            .expect("sessions mutex poisoned")
            .retain(|s| s.session_id != session_id);

        let mut selected = self.selected.lock().expect("selected mutex poisoned");
        if selected.as_deref() == Some(session_id) {
            *selected = None;
        }

        tracing::info!(session_id, "Session deleted");
        Ok(confirmation)
    }

    /// Drop all local state (logout).
    pub fn clear(&self) {
        self.sessions.lock().expect("sessions mutex poisoned").clear();
        *self.selected.lock().expect("selected mutex poisoned") = None;
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use wayfarer_client::MockBackend;

    const TOKEN: &str = "test-token";

    fn make_registry() -> (Arc<MockBackend>, SessionRegistry) {
        let backend = Arc::new(MockBackend::new());
        backend.authorize_token(TOKEN);
        let registry = SessionRegistry::new(
            Arc::clone(&backend) as Arc<dyn BackendClient>,
            "New Chat",
        );
        (backend, registry)
    }

    // ---- Name derivation ----

    #[test]
    fn test_derive_name_first_five_tokens() {
        assert_eq!(
            derive_session_name("Find me beaches near Karachi please"),
            "Find me beaches near Karachi"
        );
    }

    #[test]
    fn test_derive_name_fewer_than_five_tokens() {
        assert_eq!(derive_session_name("Lahore food"), "Lahore food");
    }

    #[test]
    fn test_derive_name_collapses_whitespace() {
        assert_eq!(
            derive_session_name("  hiking   trails\tnear\nIslamabad  today extra"),
            "hiking trails near Islamabad today"
        );
    }

    #[test]
    fn test_derive_name_empty_message() {
        assert_eq!(derive_session_name("   "), "");
    }

    // ---- Refresh ----

    #[tokio::test]
    async fn test_refresh_populates_list() {
        let (backend, registry) = make_registry();
        backend.seed_session("s1", "Old trip", vec![]);
        backend.seed_session("s2", "New Chat", vec![]);

        registry.refresh(TOKEN).await.unwrap();
        let sessions = registry.sessions();
        assert_eq!(sessions.len(), 2);
        // Seeded newest first.
        assert_eq!(sessions[0].session_id, "s2");
        // Default-named sessions have not been renamed yet.
        assert!(!sessions[0].renamed);
        assert!(sessions[1].renamed);
    }

    #[tokio::test]
    async fn test_refresh_failure_keeps_previous_list() {
        let (backend, registry) = make_registry();
        backend.seed_session("s1", "Trip", vec![]);
        registry.refresh(TOKEN).await.unwrap();

        backend.seed_session("s2", "Another", vec![]);
        backend.fail_next_list();
        let result = registry.refresh(TOKEN).await;
        assert!(matches!(result, Err(SessionError::Fetch(_))));
        // Last-known-good list untouched.
        assert_eq!(registry.sessions().len(), 1);
        assert_eq!(registry.sessions()[0].session_id, "s1");
    }

    // ---- Create ----

    #[tokio::test]
    async fn test_create_prepends_and_selects() {
        let (_backend, registry) = make_registry();
        let first = registry.create(TOKEN).await.unwrap();
        let second = registry.create(TOKEN).await.unwrap();

        let sessions = registry.sessions();
        assert_eq!(sessions[0].session_id, second);
        assert_eq!(sessions[1].session_id, first);
        assert_eq!(sessions[0].session_name, "New Chat");
        assert!(!sessions[0].renamed);
        assert_eq!(registry.selected(), Some(second));
    }

    #[tokio::test]
    async fn test_create_failure_leaves_selection() {
        let (backend, registry) = make_registry();
        let sid = registry.create(TOKEN).await.unwrap();

        backend.fail_next_create();
        let result = registry.create(TOKEN).await;
        assert!(matches!(result, Err(SessionError::Create(_))));
        assert_eq!(registry.selected(), Some(sid));
        assert_eq!(registry.sessions().len(), 1);
    }

    // ---- Select ----

    #[tokio::test]
    async fn test_select_is_local_and_immediate() {
        let (_backend, registry) = make_registry();
        registry.select(Some("s9".to_string()));
        assert_eq!(registry.selected(), Some("s9".to_string()));

        registry.select(None);
        assert_eq!(registry.selected(), None);
    }

    // ---- Rename ----

    #[tokio::test]
    async fn test_rename_derives_and_pushes() {
        let (backend, registry) = make_registry();
        let sid = registry.create(TOKEN).await.unwrap();

        let ok = registry
            .rename_on_first_message(TOKEN, &sid, "Find me beaches near Karachi")
            .await
            .unwrap();
        assert!(ok);
        let entry = registry.entry(&sid).unwrap();
        assert_eq!(entry.session_name, "Find me beaches near");
        assert!(entry.renamed);

        // Backend saw the same name.
        let records = backend.list_sessions(TOKEN).await.unwrap();
        assert_eq!(records[0].session_name, "Find me beaches near");
    }

    #[tokio::test]
    async fn test_rename_fires_only_once() {
        let (backend, registry) = make_registry();
        let sid = registry.create(TOKEN).await.unwrap();
        registry
            .rename_on_first_message(TOKEN, &sid, "first message here")
            .await
            .unwrap();

        // A scripted backend failure proves the second invocation makes no
        // backend call: the flag would flip to false if it did.
        backend.fail_next_rename();
        let ok = registry
            .rename_on_first_message(TOKEN, &sid, "second message entirely")
            .await
            .unwrap();
        assert!(ok);
        assert_eq!(
            registry.entry(&sid).unwrap().session_name,
            "first message here"
        );
    }

    #[tokio::test]
    async fn test_rename_failure_keeps_optimistic_name() {
        let (backend, registry) = make_registry();
        let sid = registry.create(TOKEN).await.unwrap();

        backend.fail_next_rename();
        let ok = registry
            .rename_on_first_message(TOKEN, &sid, "weekend in Hunza valley")
            .await
            .unwrap();
        assert!(!ok);
        // Local name reflects the derived name despite the failure.
        let entry = registry.entry(&sid).unwrap();
        assert_eq!(entry.session_name, "weekend in Hunza valley");
        assert!(entry.renamed);
        // Backend still has the default.
        let records = backend.list_sessions(TOKEN).await.unwrap();
        assert_eq!(records[0].session_name, "New Chat");
    }

    #[tokio::test]
    async fn test_rename_unknown_session() {
        let (_backend, registry) = make_registry();
        let result = registry
            .rename_on_first_message(TOKEN, "missing", "some text")
            .await;
        assert!(matches!(result, Err(SessionError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_refreshed_named_session_not_renamed_again() {
        let (backend, registry) = make_registry();
        backend.seed_session("s1", "Beaches near Karachi", vec![]);
        registry.refresh(TOKEN).await.unwrap();
        assert!(!registry.needs_rename("s1"));
    }

    // ---- Delete ----

    #[tokio::test]
    async fn test_delete_selected_clears_selection() {
        let (_backend, registry) = make_registry();
        let sid = registry.create(TOKEN).await.unwrap();
        assert_eq!(registry.selected(), Some(sid.clone()));

        let confirmation = registry.delete(TOKEN, &sid).await.unwrap();
        assert_eq!(confirmation, "Session Deleted");
        assert_eq!(registry.selected(), None);
        assert!(registry.sessions().is_empty());
    }

    #[tokio::test]
    async fn test_delete_non_selected_preserves_selection_and_order() {
        let (_backend, registry) = make_registry();
        let a = registry.create(TOKEN).await.unwrap();
        let b = registry.create(TOKEN).await.unwrap();
        let c = registry.create(TOKEN).await.unwrap();
        // c is selected (created last).
        assert_eq!(registry.selected(), Some(c.clone()));

        registry.delete(TOKEN, &b).await.unwrap();
        assert_eq!(registry.selected(), Some(c.clone()));
        let ids: Vec<String> = registry
            .sessions()
            .into_iter()
            .map(|s| s.session_id)
            .collect();
        // Relative order of the remainder preserved.
        assert_eq!(ids, vec![c, a]);
    }

    #[tokio::test]
    async fn test_delete_failure_leaves_list_untouched() {
        let (backend, registry) = make_registry();
        let sid = registry.create(TOKEN).await.unwrap();

        backend.fail_next_delete();
        let result = registry.delete(TOKEN, &sid).await;
        assert!(matches!(result, Err(SessionError::Delete(_))));
        assert_eq!(registry.sessions().len(), 1);
        assert_eq!(registry.selected(), Some(sid));
    }

    // ---- Clear ----

    #[tokio::test]
    async fn test_clear_drops_everything() {
        let (_backend, registry) = make_registry();
        registry.create(TOKEN).await.unwrap();
        registry.clear();
        assert!(registry.sessions().is_empty());
        assert_eq!(registry.selected(), None);
    }
}

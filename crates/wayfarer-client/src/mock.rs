//! In-memory backend used by tests and the demo binary.
//!
//! Implements [`BackendClient`] against process-local state. Failures can be
//! scripted one call ahead, and replies can be gated on a oneshot channel so
//! tests can control the arrival order of overlapping requests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::json;
use tokio::sync::oneshot;
use uuid::Uuid;

use wayfarer_core::{Identity, Role};

use crate::client::BackendClient;
use crate::error::BackendError;
use crate::types::{HistoryEntry, ProfileFields, RegistrationFields, SessionRecord};

/// A scripted outcome for one `send_query` call, consumed FIFO.
pub struct ReplyScript {
    /// `Ok` payload to return, or `Err` message mapped to
    /// [`BackendError::Unavailable`].
    outcome: Result<serde_json::Value, String>,
    /// When present, the reply is held until the sender side fires.
    gate: Option<oneshot::Receiver<()>>,
}

#[derive(Default)]
struct FailFlags {
    list: bool,
    create: bool,
    rename: bool,
    delete: bool,
    history: bool,
}

struct StoredUser {
    password: String,
    identity: Identity,
}

#[derive(Default)]
struct MockState {
    /// Most recently created first, matching the live backend's ordering.
    sessions: Vec<SessionRecord>,
    histories: HashMap<String, Vec<HistoryEntry>>,
}

/// In-memory [`BackendClient`] implementation.
#[derive(Default)]
pub struct MockBackend {
    state: Mutex<MockState>,
    users: Mutex<Vec<StoredUser>>,
    tokens: Mutex<HashSet<String>>,
    scripts: Mutex<VecDeque<ReplyScript>>,
    fail: Mutex<FailFlags>,
    next_session: AtomicU64,
    next_token: AtomicU64,
}

impl MockBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-authorize a fixed token for tests that skip the login flow.
    pub fn authorize_token(&self, token: &str) {
        self.tokens
            .lock()
            .expect("tokens mutex poisoned")
            .insert(token.to_string());
    }

    /// Register an account that `login` will accept.
    pub fn add_user(&self, email: &str, password: &str, first_name: &str, last_name: &str) {
        let identity = Identity {
            id: Uuid::new_v4(),
            token: None,
            first_name: first_name.to_string(),
            last_name: last_name.to_string(),
            email: email.to_string(),
            guest: false,
        };
        self.users
            .lock()
            .expect("users mutex poisoned")
            .push(StoredUser {
                password: password.to_string(),
                identity,
            });
    }

    /// Insert a session (and its history) directly, newest first.
    pub fn seed_session(&self, session_id: &str, session_name: &str, history: Vec<HistoryEntry>) {
        let mut state = self.state.lock().expect("state mutex poisoned");
        state.sessions.insert(
            0,
            SessionRecord {
                session_id: session_id.to_string(),
                session_name: session_name.to_string(),
                created_at: Utc::now(),
            },
        );
        state.histories.insert(session_id.to_string(), history);
    }

    // ---- Failure scripting (one-shot flags) ----

    pub fn fail_next_list(&self) {
        self.fail.lock().expect("fail mutex poisoned").list = true;
    }

    pub fn fail_next_create(&self) {
        self.fail.lock().expect("fail mutex poisoned").create = true;
    }

    pub fn fail_next_rename(&self) {
        self.fail.lock().expect("fail mutex poisoned").rename = true;
    }

    pub fn fail_next_delete(&self) {
        self.fail.lock().expect("fail mutex poisoned").delete = true;
    }

    pub fn fail_next_history(&self) {
        self.fail.lock().expect("fail mutex poisoned").history = true;
    }

    // ---- Reply scripting ----

    /// Queue a reply payload for the next unscripted `send_query`.
    pub fn script_reply(&self, value: serde_json::Value) {
        self.scripts
            .lock()
            .expect("scripts mutex poisoned")
            .push_back(ReplyScript {
                outcome: Ok(value),
                gate: None,
            });
    }

    /// Queue a reply that is held until the returned sender fires (or is
    /// dropped). Lets tests dictate response-arrival order.
    pub fn script_gated_reply(&self, value: serde_json::Value) -> oneshot::Sender<()> {
        let (tx, rx) = oneshot::channel();
        self.scripts
            .lock()
            .expect("scripts mutex poisoned")
            .push_back(ReplyScript {
                outcome: Ok(value),
                gate: Some(rx),
            });
        tx
    }

    /// Queue a `send_query` failure.
    pub fn script_query_failure(&self, message: &str) {
        self.scripts
            .lock()
            .expect("scripts mutex poisoned")
            .push_back(ReplyScript {
                outcome: Err(message.to_string()),
                gate: None,
            });
    }

    // ---- Internals ----

    fn check_token(&self, token: &str) -> Result<(), BackendError> {
        let tokens = self.tokens.lock().expect("tokens mutex poisoned");
        if tokens.contains(token) {
            Ok(())
        } else {
            Err(BackendError::Unauthorized)
        }
    }

    fn issue_token(&self, prefix: &str) -> String {
        let n = self.next_token.fetch_add(1, Ordering::SeqCst) + 1;
        let token = format!("{}-token-{}", prefix, n);
        self.tokens
            .lock()
            .expect("tokens mutex poisoned")
            .insert(token.clone());
        token
    }

    fn default_reply(query: &str) -> serde_json::Value {
        json!({
            "message": format!("Here are some ideas for \"{}\".", query),
            "places": [],
        })
    }
}

#[async_trait]
impl BackendClient for MockBackend {
    async fn list_sessions(&self, token: &str) -> Result<Vec<SessionRecord>, BackendError> {
        self.check_token(token)?;
        {
            let mut fail = self.fail.lock().expect("fail mutex poisoned");
            if fail.list {
                fail.list = false;
                return Err(BackendError::Unavailable("session list fetch failed".into()));
            }
        }
        let state = self.state.lock().expect("state mutex poisoned");
        Ok(state.sessions.clone())
    }

    async fn create_session(&self, token: &str) -> Result<SessionRecord, BackendError> {
        self.check_token(token)?;
        {
            let mut fail = self.fail.lock().expect("fail mutex poisoned");
            if fail.create {
                fail.create = false;
                return Err(BackendError::Unavailable("session create failed".into()));
            }
        }
        let n = self.next_session.fetch_add(1, Ordering::SeqCst) + 1;
        let record = SessionRecord {
            session_id: format!("sess-{:04}", n),
            session_name: "New Chat".to_string(),
            created_at: Utc::now(),
        };
        let mut state = self.state.lock().expect("state mutex poisoned");
        state.sessions.insert(0, record.clone());
        state.histories.insert(record.session_id.clone(), vec![]);
        Ok(record)
    }

    async fn rename_session(
        &self,
        token: &str,
        session_id: &str,
        name: &str,
    ) -> Result<(), BackendError> {
        self.check_token(token)?;
        {
            let mut fail = self.fail.lock().expect("fail mutex poisoned");
            if fail.rename {
                fail.rename = false;
                return Err(BackendError::Unavailable("session rename failed".into()));
            }
        }
        let mut state = self.state.lock().expect("state mutex poisoned");
        let session = state
            .sessions
            .iter_mut()
            .find(|s| s.session_id == session_id)
            .ok_or_else(|| BackendError::SessionNotFound(session_id.to_string()))?;
        session.session_name = name.to_string();
        Ok(())
    }

    async fn delete_session(
        &self,
        token: &str,
        session_id: &str,
    ) -> Result<String, BackendError> {
        self.check_token(token)?;
        {
            let mut fail = self.fail.lock().expect("fail mutex poisoned");
            if fail.delete {
                fail.delete = false;
                return Err(BackendError::Unavailable("session delete failed".into()));
            }
        }
        let mut state = self.state.lock().expect("state mutex poisoned");
        let before = state.sessions.len();
        state.sessions.retain(|s| s.session_id != session_id);
        if state.sessions.len() == before {
            return Err(BackendError::SessionNotFound(session_id.to_string()));
        }
        state.histories.remove(session_id);
        Ok("Session Deleted".to_string())
    }

    async fn get_history(
        &self,
        token: &str,
        session_id: &str,
    ) -> Result<Vec<HistoryEntry>, BackendError> {
        self.check_token(token)?;
        {
            let mut fail = self.fail.lock().expect("fail mutex poisoned");
            if fail.history {
                fail.history = false;
                return Err(BackendError::Unavailable("history fetch failed".into()));
            }
        }
        let state = self.state.lock().expect("state mutex poisoned");
        state
            .histories
            .get(session_id)
            .cloned()
            .ok_or_else(|| BackendError::SessionNotFound(session_id.to_string()))
    }

    async fn send_query(
        &self,
        token: &str,
        session_id: &str,
        query: &str,
        _max_places: u32,
    ) -> Result<serde_json::Value, BackendError> {
        self.check_token(token)?;

        // Record the user side of the exchange, as the live backend does.
        {
            let mut state = self.state.lock().expect("state mutex poisoned");
            if !state.histories.contains_key(session_id) {
                return Err(BackendError::SessionNotFound(session_id.to_string()));
            }
            let entry = HistoryEntry::new(Role::User, json!({ "message": query }));
            state
                .histories
                .get_mut(session_id)
                .expect("history checked above")
                .push(entry);
        }

        // Pop the next script while holding the lock, then await any gate
        // with no locks held.
        let script = self
            .scripts
            .lock()
            .expect("scripts mutex poisoned")
            .pop_front();

        let (outcome, gate) = match script {
            Some(ReplyScript { outcome, gate }) => (outcome, gate),
            None => (Ok(Self::default_reply(query)), None),
        };

        if let Some(gate) = gate {
            // A dropped sender releases the reply too.
            let _ = gate.await;
        }

        match outcome {
            Ok(value) => {
                let mut state = self.state.lock().expect("state mutex poisoned");
                if let Some(history) = state.histories.get_mut(session_id) {
                    history.push(HistoryEntry::new(Role::Assistant, value.clone()));
                }
                Ok(value)
            }
            Err(message) => Err(BackendError::Unavailable(message)),
        }
    }

    async fn guest_entry(&self) -> Result<Identity, BackendError> {
        let token = self.issue_token("guest");
        Ok(Identity {
            id: Uuid::new_v4(),
            token: Some(token),
            first_name: String::new(),
            last_name: String::new(),
            email: String::new(),
            guest: true,
        })
    }

    async fn login(&self, email: &str, password: &str) -> Result<Identity, BackendError> {
        let users = self.users.lock().expect("users mutex poisoned");
        let user = users
            .iter()
            .find(|u| u.identity.email == email && u.password == password)
            .ok_or(BackendError::InvalidCredentials)?;
        let mut identity = user.identity.clone();
        drop(users);
        identity.token = Some(self.issue_token("user"));
        Ok(identity)
    }

    async fn register(&self, fields: &RegistrationFields) -> Result<String, BackendError> {
        self.add_user(
            &fields.email,
            &fields.password,
            &fields.first_name,
            &fields.last_name,
        );
        Ok("Account created. Please log in.".to_string())
    }

    async fn update_profile(
        &self,
        token: &str,
        _fields: &ProfileFields,
    ) -> Result<String, BackendError> {
        self.check_token(token)?;
        Ok("Profile updated".to_string())
    }

    async fn forgot_password(&self, email: &str) -> Result<String, BackendError> {
        Ok(format!("Password reset link sent to {}", email))
    }
}

// =============================================================================
// Tests
// =============================================================================

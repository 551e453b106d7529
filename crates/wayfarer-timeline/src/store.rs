//! The per-session timeline store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use serde_json::Value;

use wayfarer_client::HistoryEntry;
use wayfarer_core::{Role, Turn};

use crate::reply::{parse_reply, FALLBACK_REPLY};

#[derive(Default)]
struct TimelineState {
    turns: Vec<Turn>,
    /// In-flight sends for this session. The design assumes at most one,
    /// but a counter keeps the indicator correct if sends overlap.
    waiting: u32,
}

/// Timelines for all sessions, keyed by session id.
///
/// Keeping non-visible timelines around lets a reply that resolves after a
/// session switch land in the session it was issued for instead of the one
/// currently on screen. Selecting a session rebuilds its timeline from
/// backend history; logout discards everything.
#[derive(Default)]
pub struct TimelineStore {
    inner: Mutex<HashMap<String, TimelineState>>,
}

/// Clears a session's waiting flag when dropped, so the loading indicator
/// is released on every exit path of a send.
pub struct WaitingGuard {
    store: Arc<TimelineStore>,
    session_id: String,
}

impl Drop for WaitingGuard {
    fn drop(&mut self) {
        let mut inner = self.store.inner.lock().expect("timeline mutex poisoned");
        if let Some(state) = inner.get_mut(&self.session_id) {
            state.waiting = state.waiting.saturating_sub(1);
        }
    }
}

impl TimelineStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of a session's turns, oldest first. Empty for unknown
    /// sessions.
    pub fn turns(&self, session_id: &str) -> Vec<Turn> {
        self.inner
            .lock()
            .expect("timeline mutex poisoned")
            .get(session_id)
            .map(|s| s.turns.clone())
            .unwrap_or_default()
    }

    /// Number of turns in a session's timeline.
    pub fn len(&self, session_id: &str) -> usize {
        self.inner
            .lock()
            .expect("timeline mutex poisoned")
            .get(session_id)
            .map(|s| s.turns.len())
            .unwrap_or(0)
    }

    /// Whether the session has no turns.
    pub fn is_empty(&self, session_id: &str) -> bool {
        self.len(session_id) == 0
    }

    /// Whether a reply is pending for this session.
    pub fn is_waiting(&self, session_id: &str) -> bool {
        self.inner
            .lock()
            .expect("timeline mutex poisoned")
            .get(session_id)
            .map(|s| s.waiting > 0)
            .unwrap_or(false)
    }

    /// Mark a send in flight. The returned guard releases the flag when it
    /// goes out of scope, on success and failure alike.
    pub fn begin_waiting(store: &Arc<Self>, session_id: &str) -> WaitingGuard {
        let mut inner = store.inner.lock().expect("timeline mutex poisoned");
        inner.entry(session_id.to_string()).or_default().waiting += 1;
        WaitingGuard {
            store: Arc::clone(store),
            session_id: session_id.to_string(),
        }
    }

    /// Seed a greeting turn into a fresh conversation. No-op if the
    /// timeline already has content.
    pub fn seed_greeting(&self, session_id: &str, greeting: &str) {
        let mut inner = self.inner.lock().expect("timeline mutex poisoned");
        let state = inner.entry(session_id.to_string()).or_default();
        if state.turns.is_empty() {
            state.turns.push(Turn::assistant(greeting));
        }
    }

    /// Replace a session's timeline with backend history, in received
    /// order. Assistant entries expand the same way live replies do.
    pub fn load_history(&self, session_id: &str, entries: &[HistoryEntry]) {
        let mut turns = Vec::new();
        for entry in entries {
            match entry.role {
                Role::User => match content_message(&entry.content) {
                    Some(text) => turns.push(Turn::user(text)),
                    None => {
                        tracing::debug!(session_id, "Skipping malformed user history entry");
                    }
                },
                Role::Assistant => match parse_reply(&entry.content) {
                    Some(payload) => turns.extend(payload.into_turns()),
                    None => turns.push(Turn::assistant(FALLBACK_REPLY)),
                },
            }
        }

        tracing::debug!(session_id, count = turns.len(), "Timeline rebuilt from history");
        let mut inner = self.inner.lock().expect("timeline mutex poisoned");
        inner.entry(session_id.to_string()).or_default().turns = turns;
    }

    /// Append the user's message before any network call returns.
    pub fn append_user_turn(&self, session_id: &str, text: &str) {
        let mut inner = self.inner.lock().expect("timeline mutex poisoned");
        inner
            .entry(session_id.to_string())
            .or_default()
            .turns
            .push(Turn::user(text));
    }

    /// Append an assistant reply, expanded into its turns in a single
    /// locked section so a concurrently arriving reply cannot interleave.
    /// Malformed payloads collapse to one fallback turn. Returns the number
    /// of turns appended.
    pub fn append_assistant_reply(&self, session_id: &str, raw: &Value) -> usize {
        let turns = match parse_reply(raw) {
            Some(payload) => payload.into_turns(),
            None => {
                tracing::warn!(session_id, "Malformed reply payload; appending fallback turn");
                vec![Turn::assistant(FALLBACK_REPLY)]
            }
        };
        let count = turns.len();
        let mut inner = self.inner.lock().expect("timeline mutex poisoned");
        inner
            .entry(session_id.to_string())
            .or_default()
            .turns
            .extend(turns);
        count
    }

    /// Append the generic error turn (used when a query fails outright).
    pub fn append_fallback(&self, session_id: &str) {
        let mut inner = self.inner.lock().expect("timeline mutex poisoned");
        inner
            .entry(session_id.to_string())
            .or_default()
            .turns
            .push(Turn::assistant(FALLBACK_REPLY));
    }

    /// Drop one session's timeline (session deleted).
    pub fn remove(&self, session_id: &str) {
        self.inner
            .lock()
            .expect("timeline mutex poisoned")
            .remove(session_id);
    }

    /// Drop every timeline (logout).
    pub fn clear_all(&self) {
        self.inner.lock().expect("timeline mutex poisoned").clear();
    }
}

/// Extract the message text of a history entry's content.
fn content_message(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Object(map) => map
            .get("message")
            .and_then(Value::as_str)
            .map(str::to_string),
        _ => None,
    }
}

// =============================================================================
// Tests
// =============================================================================

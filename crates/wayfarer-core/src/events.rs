use serde::{Deserialize, Serialize};

/// Category of a transient, dismissable user-facing notice.
///
/// Notices report backend or capability failures without touching the
/// session list or timelines, which keep their last-known-good state. None
/// of them trigger an automatic retry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NoticeKind {
    /// Session list fetch failed.
    Fetch,
    /// Session creation failed.
    Create,
    /// Session rename failed (local name stays optimistic).
    Rename,
    /// Session deletion failed.
    Delete,
    /// Query request failed (a fallback turn was appended).
    Query,
    /// Speech recognition is not available on this platform.
    Capability,
    /// Speech recognition failed mid-recording.
    Recognition,
    /// An operation completed; `message` carries the confirmation text.
    Confirmation,
}

/// A transient message for the presentation layer.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
}

impl Notice {
    pub fn new(kind: NoticeKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

/// All state changes the conversational core announces to its consumers.
///
/// Events are emitted by the orchestrator after state changes and consumed
/// by the presentation layer over a broadcast channel (re-render triggers,
/// toasts, scroll-to-bottom, etc.).
#[derive(Clone, Debug, Serialize, Deserialize)]
#[non_exhaustive]
pub enum DomainEvent {
    /// A new identity was set (login or guest entry).
    IdentityChanged { guest: bool },

    /// The identity was cleared (logout).
    IdentityCleared,

    /// A session was created and selected.
    SessionCreated { session_id: String },

    /// A session was renamed from its default placeholder.
    SessionRenamed { session_id: String, name: String },

    /// A session was deleted from the backend and the local list.
    SessionDeleted { session_id: String },

    /// The selection changed; `None` means no session is selected.
    SessionSelected { session_id: Option<String> },

    /// A user turn was appended optimistically.
    UserTurnAppended { session_id: String },

    /// An assistant reply was expanded into `turns` contiguous entries.
    AssistantReplyAppended { session_id: String, turns: usize },

    /// Speech recognition started.
    RecordingStarted,

    /// Speech recognition stopped (explicitly or after an error).
    RecordingStopped,

    /// A transient notice for the user.
    NoticeRaised { notice: Notice },
}

// =============================================================================
// Tests
// =============================================================================

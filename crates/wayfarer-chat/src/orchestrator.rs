//! The conversation orchestrator.

use std::sync::{Arc, Mutex};

use tokio::sync::broadcast;

use wayfarer_client::BackendClient;
use wayfarer_core::config::{ChatConfig, WayfarerConfig};
use wayfarer_core::{DomainEvent, Identity, IdentityContext, Notice, NoticeKind, Turn};
use wayfarer_session::{SessionEntry, SessionRegistry};
use wayfarer_speech::{RecognitionBackend, RecordingState, SpeechController, SpeechError};
use wayfarer_timeline::TimelineStore;

use crate::error::ChatError;
use crate::sidebar::SidebarState;

/// Capacity of the domain-event broadcast channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;

/// Central coordinator for the conversational client.
///
/// Owns the identity context, session registry, timelines, and speech
/// controller, and exposes the action entry points the presentation layer
/// calls. All state changes are announced on a broadcast channel of
/// [`DomainEvent`]s.
pub struct ChatOrchestrator {
    backend: Arc<dyn BackendClient>,
    identity: IdentityContext,
    registry: SessionRegistry,
    timelines: Arc<TimelineStore>,
    speech: SpeechController,
    config: ChatConfig,
    events: broadcast::Sender<DomainEvent>,
    sidebar: Mutex<SidebarState>,
}

impl ChatOrchestrator {
    /// Create an orchestrator with no identity live.
    pub fn new(
        backend: Arc<dyn BackendClient>,
        recognizer: Box<dyn RecognitionBackend>,
        config: &WayfarerConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            registry: SessionRegistry::new(
                Arc::clone(&backend),
                config.chat.default_session_name.clone(),
            ),
            backend,
            identity: IdentityContext::new(),
            timelines: Arc::new(TimelineStore::new()),
            speech: SpeechController::new(recognizer),
            config: config.chat.clone(),
            events,
            sidebar: Mutex::new(SidebarState::new()),
        }
    }

    // =========================================================================
    // Identity lifecycle
    // =========================================================================

    /// Enter as a guest and start a fresh conversation.
    pub async fn guest_entry(&self) -> Result<Identity, ChatError> {
        let identity = self
            .backend
            .guest_entry()
            .await
            .map_err(|e| ChatError::Auth(e.to_string()))?;
        self.on_identity(identity.clone()).await;
        Ok(identity)
    }

    /// Log in with credentials and start a fresh conversation.
    pub async fn login(&self, email: &str, password: &str) -> Result<Identity, ChatError> {
        let identity = self
            .backend
            .login(email, password)
            .await
            .map_err(|e| ChatError::Auth(e.to_string()))?;
        self.on_identity(identity.clone()).await;
        Ok(identity)
    }

    /// Clear the identity and every piece of per-identity state.
    pub fn logout(&self) {
        self.speech.stop();
        self.identity.clear();
        self.registry.clear();
        self.timelines.clear_all();
        self.sidebar.lock().expect("sidebar mutex poisoned").close();
        self.emit(DomainEvent::IdentityCleared);
    }

    /// Install a new identity and bootstrap its conversation state.
    async fn on_identity(&self, identity: Identity) {
        let guest = identity.guest;
        self.speech.stop();
        self.registry.clear();
        self.timelines.clear_all();
        self.sidebar.lock().expect("sidebar mutex poisoned").close();
        self.identity.set(identity);
        self.emit(DomainEvent::IdentityChanged { guest });
        self.bootstrap().await;
    }

    /// Load the session list and open an initial conversation.
    ///
    /// Failures here are notices, never fatal: the user can still compose
    /// once a session exists, and a retry happens implicitly on the next
    /// action.
    async fn bootstrap(&self) {
        let Some(identity) = self.identity.current() else {
            return;
        };
        let Some(token) = identity.token().map(str::to_string) else {
            tracing::warn!("Identity has no token; skipping bootstrap");
            return;
        };

        if !identity.guest {
            if let Err(e) = self.registry.refresh(&token).await {
                tracing::warn!(error = %e, "Session list fetch failed");
                self.notify(NoticeKind::Fetch, e.to_string());
            }
        }

        match self.registry.create(&token).await {
            Ok(session_id) => {
                self.timelines
                    .seed_greeting(&session_id, &self.greeting(&identity));
                self.emit(DomainEvent::SessionCreated { session_id });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Initial session create failed");
                self.notify(NoticeKind::Create, e.to_string());
            }
        }
    }

    fn greeting(&self, identity: &Identity) -> String {
        if identity.guest {
            self.config.guest_greeting.clone()
        } else {
            self.config
                .user_greeting
                .replace("{first_name}", identity.display_name())
        }
    }

    // =========================================================================
    // Sending
    // =========================================================================

    /// Send a composed message through the full pipeline: session
    /// lifecycle, optimistic append, rename-if-first, query, reply
    /// expansion.
    ///
    /// The reply is routed to the session the request was issued for, so a
    /// response that resolves after a session switch still lands in the
    /// right timeline. Backend failures after the optimistic append are
    /// absorbed into a fallback assistant turn and reported as a notice;
    /// they do not fail the call.
    pub async fn send(&self, message: &str) -> Result<(), ChatError> {
        let (identity, token) = self.require_identity()?;

        let message = message.trim();
        if message.is_empty() {
            return Err(ChatError::EmptyMessage);
        }
        if message.chars().count() > self.config.max_message_length {
            return Err(ChatError::MessageTooLong(self.config.max_message_length));
        }

        // Session lifecycle: create-if-absent.
        let session_id = match self.registry.selected() {
            Some(id) => id,
            None => {
                let session_id = self.registry.create(&token).await.map_err(|e| {
                    self.notify(NoticeKind::Create, e.to_string());
                    e
                })?;
                self.timelines
                    .seed_greeting(&session_id, &self.greeting(&identity));
                self.emit(DomainEvent::SessionCreated {
                    session_id: session_id.clone(),
                });
                session_id
            }
        };

        // Optimistic append: the user always sees their message
        // immediately.
        self.timelines.append_user_turn(&session_id, message);
        self.emit(DomainEvent::UserTurnAppended {
            session_id: session_id.clone(),
        });

        // Released when this scope exits, on every path.
        let _waiting = TimelineStore::begin_waiting(&self.timelines, &session_id);

        // Rename-if-first. Failure is reported but never blocks the send.
        if self.registry.needs_rename(&session_id) {
            match self
                .registry
                .rename_on_first_message(&token, &session_id, message)
                .await
            {
                Ok(true) => {
                    if let Some(entry) = self.registry.entry(&session_id) {
                        self.emit(DomainEvent::SessionRenamed {
                            session_id: session_id.clone(),
                            name: entry.session_name,
                        });
                    }
                }
                Ok(false) => {
                    self.notify(NoticeKind::Rename, "Could not save the session name");
                }
                Err(e) => {
                    tracing::warn!(session_id = %session_id, error = %e, "Rename skipped");
                    self.notify(NoticeKind::Rename, e.to_string());
                }
            }
        }

        match self
            .backend
            .send_query(&token, &session_id, message, self.config.max_places)
            .await
        {
            Ok(raw) => {
                let turns = self.timelines.append_assistant_reply(&session_id, &raw);
                self.emit(DomainEvent::AssistantReplyAppended {
                    session_id: session_id.clone(),
                    turns,
                });
            }
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "Query failed");
                self.notify(NoticeKind::Query, e.to_string());
                self.timelines.append_fallback(&session_id);
                self.emit(DomainEvent::AssistantReplyAppended {
                    session_id: session_id.clone(),
                    turns: 1,
                });
            }
        }

        Ok(())
    }

    // =========================================================================
    // Session actions
    // =========================================================================

    /// Create and select a fresh session ("new chat").
    pub async fn new_session(&self) -> Result<String, ChatError> {
        let (identity, token) = self.require_identity()?;

        let session_id = self.registry.create(&token).await.map_err(|e| {
            self.notify(NoticeKind::Create, e.to_string());
            e
        })?;
        self.timelines
            .seed_greeting(&session_id, &self.greeting(&identity));
        self.sidebar.lock().expect("sidebar mutex poisoned").close();
        self.emit(DomainEvent::SessionCreated {
            session_id: session_id.clone(),
        });
        Ok(session_id)
    }

    /// Select a session (or clear the selection with `None`) and load its
    /// history.
    ///
    /// Selection applies immediately and never rolls back; a failed history
    /// fetch only logs, leaving the last-known timeline visible.
    pub async fn select_session(&self, session_id: Option<String>) {
        self.registry.select(session_id.clone());
        self.sidebar.lock().expect("sidebar mutex poisoned").close();
        self.emit(DomainEvent::SessionSelected {
            session_id: session_id.clone(),
        });

        let Some(session_id) = session_id else {
            return;
        };
        let Some(token) = self.identity.token() else {
            tracing::error!("No authentication token available; skipping history fetch");
            return;
        };

        match self.backend.get_history(&token, &session_id).await {
            Ok(history) => self.timelines.load_history(&session_id, &history),
            Err(e) => {
                tracing::warn!(session_id = %session_id, error = %e, "History fetch failed; selection kept");
            }
        }
    }

    /// Delete a session. Local state changes only after the backend
    /// confirms; deleting the selected session empties the visible
    /// timeline. Returns the backend's confirmation message.
    pub async fn delete_session(&self, session_id: &str) -> Result<String, ChatError> {
        let token = self.require_token()?;

        match self.registry.delete(&token, session_id).await {
            Ok(confirmation) => {
                self.timelines.remove(session_id);
                self.emit(DomainEvent::SessionDeleted {
                    session_id: session_id.to_string(),
                });
                self.notify(NoticeKind::Confirmation, confirmation.clone());
                Ok(confirmation)
            }
            Err(e) => {
                self.notify(NoticeKind::Delete, e.to_string());
                Err(e.into())
            }
        }
    }

    // =========================================================================
    // Speech input
    // =========================================================================

    /// Start voice capture. Returns the recording generation on success.
    pub fn start_recording(&self) -> Result<u64, ChatError> {
        match self.speech.start() {
            Ok(generation) => {
                self.emit(DomainEvent::RecordingStarted);
                Ok(generation)
            }
            Err(SpeechError::UnsupportedCapability) => {
                self.notify(
                    NoticeKind::Capability,
                    "Speech recognition not supported in this browser.",
                );
                Err(SpeechError::UnsupportedCapability.into())
            }
            Err(e) => {
                self.notify(NoticeKind::Recognition, e.to_string());
                Err(e.into())
            }
        }
    }

    /// Stop voice capture. Safe to call in any state.
    pub fn stop_recording(&self) {
        self.speech.stop();
        self.emit(DomainEvent::RecordingStopped);
    }

    /// The speech controller, for wiring platform recognizer callbacks and
    /// subscribing to transcript updates.
    pub fn speech(&self) -> &SpeechController {
        &self.speech
    }

    /// Current recording state.
    pub fn recording_state(&self) -> RecordingState {
        self.speech.state()
    }

    /// Latest full transcript of the current recording session.
    pub fn transcript(&self) -> String {
        self.speech.transcript()
    }

    // =========================================================================
    // Sidebar
    // =========================================================================

    /// Flip the sidebar and return the new state.
    pub fn toggle_sidebar(&self) -> bool {
        self.sidebar.lock().expect("sidebar mutex poisoned").toggle()
    }

    pub fn sidebar_open(&self) -> bool {
        self.sidebar.lock().expect("sidebar mutex poisoned").is_open()
    }

    /// Report a pointer interaction for outside-dismiss handling.
    pub fn handle_outside_pointer(&self, within_sidebar: bool, within_menu_control: bool) {
        self.sidebar
            .lock()
            .expect("sidebar mutex poisoned")
            .on_pointer(within_sidebar, within_menu_control);
    }

    /// Whether the session list should be rendered at all: only for
    /// authenticated, non-guest identities.
    pub fn sidebar_visible(&self) -> bool {
        self.identity.current().is_some_and(|i| !i.guest)
    }

    // =========================================================================
    // View accessors
    // =========================================================================

    pub fn current_identity(&self) -> Option<Identity> {
        self.identity.current()
    }

    pub fn is_guest_session(&self) -> bool {
        self.identity.current().is_some_and(|i| i.guest)
    }

    /// The session list, most recently created first.
    pub fn session_list(&self) -> Vec<SessionEntry> {
        self.registry.sessions()
    }

    pub fn selected_session(&self) -> Option<String> {
        self.registry.selected()
    }

    /// The timeline of the selected session; empty when nothing is
    /// selected.
    pub fn visible_turns(&self) -> Vec<Turn> {
        match self.registry.selected() {
            Some(session_id) => self.timelines.turns(&session_id),
            None => Vec::new(),
        }
    }

    /// Whether a reply is pending for the selected session.
    pub fn is_waiting(&self) -> bool {
        self.registry
            .selected()
            .map(|session_id| self.timelines.is_waiting(&session_id))
            .unwrap_or(false)
    }

    /// Subscribe to state-change events.
    pub fn subscribe_events(&self) -> broadcast::Receiver<DomainEvent> {
        self.events.subscribe()
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Precondition for protected operations: a live identity with a
    /// token. Absence blocks the action before any network call.
    fn require_identity(&self) -> Result<(Identity, String), ChatError> {
        if let Some(identity) = self.identity.current() {
            if let Some(token) = identity.token.clone() {
                return Ok((identity, token));
            }
        }
        tracing::error!("No authentication token available");
        Err(ChatError::MissingToken)
    }

    fn require_token(&self) -> Result<String, ChatError> {
        self.require_identity().map(|(_, token)| token)
    }

    fn emit(&self, event: DomainEvent) {
        // No receivers is fine; events are fire-and-forget.
        let _ = self.events.send(event);
    }

    fn notify(&self, kind: NoticeKind, message: impl Into<String>) {
        self.emit(DomainEvent::NoticeRaised {
            notice: Notice::new(kind, message),
        });
    }
}

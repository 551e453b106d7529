//! Speech input controller.
//!
//! Drives a [`RecognitionBackend`] through the recording state machine and
//! republishes transcript updates on a watch channel. Every update carries
//! the full accumulated transcript for the current recording session, and
//! consumers replace their composed-but-unsent text with it wholesale.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;

use tokio::sync::watch;

use crate::error::SpeechError;
use crate::state::RecordingState;

/// Platform speech-recognition capability.
///
/// `begin` receives the generation token for the recording session it
/// starts; the backend must pass the same token back with every
/// [`SpeechController::push_transcript`] / [`SpeechController::report_error`]
/// call so stale deliveries can be discarded.
pub trait RecognitionBackend: Send + Sync {
    /// Whether recognition exists on this platform at all.
    fn is_available(&self) -> bool;

    /// Start delivering transcript updates for `generation`.
    fn begin(&self, generation: u64) -> Result<(), SpeechError>;

    /// Stop delivering updates. Must tolerate being called when inactive.
    fn end(&self);
}

/// A backend for platforms without speech recognition.
#[derive(Debug, Default)]
pub struct NullRecognizer;

impl RecognitionBackend for NullRecognizer {
    fn is_available(&self) -> bool {
        false
    }

    fn begin(&self, _generation: u64) -> Result<(), SpeechError> {
        Err(SpeechError::UnsupportedCapability)
    }

    fn end(&self) {}
}

/// Start/stop state machine over a recognition backend.
pub struct SpeechController {
    backend: Box<dyn RecognitionBackend>,
    state: Mutex<RecordingState>,
    generation: AtomicU64,
    transcript_tx: watch::Sender<String>,
}

impl SpeechController {
    /// Create a controller in the `Idle` state.
    pub fn new(backend: Box<dyn RecognitionBackend>) -> Self {
        let (transcript_tx, _) = watch::channel(String::new());
        Self {
            backend,
            state: Mutex::new(RecordingState::Idle),
            generation: AtomicU64::new(0),
            transcript_tx,
        }
    }

    /// Current state.
    pub fn state(&self) -> RecordingState {
        self.state.lock().expect("state mutex poisoned").clone()
    }

    /// Whether updates are currently being accepted.
    pub fn is_recording(&self) -> bool {
        self.state().is_recording()
    }

    /// The latest full transcript.
    pub fn transcript(&self) -> String {
        self.transcript_tx.borrow().clone()
    }

    /// Subscribe to transcript updates. Each received value is the full
    /// transcript, not a delta.
    pub fn subscribe(&self) -> watch::Receiver<String> {
        self.transcript_tx.subscribe()
    }

    /// Start a new recording session and return its generation token.
    ///
    /// Fails with `UnsupportedCapability` when the platform has no
    /// recognizer; the state is left untouched and no side effects occur.
    /// A successful start clears any prior error state and resets the
    /// transcript.
    pub fn start(&self) -> Result<u64, SpeechError> {
        if !self.backend.is_available() {
            tracing::warn!("Speech recognition unavailable on this platform");
            return Err(SpeechError::UnsupportedCapability);
        }

        let mut state = self.state.lock().expect("state mutex poisoned");
        if state.is_recording() {
            return Err(SpeechError::Recognition(
                "recording is already active".to_string(),
            ));
        }

        let generation = self.generation.fetch_add(1, Ordering::SeqCst) + 1;
        self.transcript_tx.send_replace(String::new());
        *state = RecordingState::Recording;
        drop(state);

        if let Err(e) = self.backend.begin(generation) {
            tracing::warn!(error = %e, "Failed to start recognition");
            let mut state = self.state.lock().expect("state mutex poisoned");
            *state = RecordingState::Idle;
            return Err(e);
        }

        tracing::debug!(generation, "Recording started");
        Ok(generation)
    }

    /// Stop recording. Idempotent: safe to call in any state.
    ///
    /// Bumps the generation so that updates still in flight from the ended
    /// session are discarded on delivery.
    pub fn stop(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.backend.end();
        let mut state = self.state.lock().expect("state mutex poisoned");
        if *state != RecordingState::Idle {
            tracing::debug!("Recording stopped from {}", *state);
        }
        *state = RecordingState::Idle;
    }

    /// Deliver the full transcript for `generation`.
    ///
    /// Updates from a cancelled or superseded recording session are no-ops.
    pub fn push_transcript(&self, generation: u64, transcript: &str) {
        if generation != self.generation.load(Ordering::SeqCst) {
            tracing::debug!(generation, "Discarding stale transcript update");
            return;
        }
        if !self.state.lock().expect("state mutex poisoned").is_recording() {
            tracing::debug!("Discarding transcript update while not recording");
            return;
        }
        self.transcript_tx.send_replace(transcript.to_string());
    }

    /// Report a recognition failure for `generation`.
    ///
    /// Recording stops, the message becomes display state, and the
    /// transcript captured so far is retained for the composer.
    pub fn report_error(&self, generation: u64, message: &str) {
        if generation != self.generation.load(Ordering::SeqCst) {
            tracing::debug!(generation, "Discarding stale recognition error");
            return;
        }
        tracing::warn!(message, "Recognition error; recording stopped");
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.backend.end();
        let mut state = self.state.lock().expect("state mutex poisoned");
        *state = RecordingState::Error(message.to_string());
    }
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    /// Recognizer test double: records begin/end calls, never delivers on
    /// its own (tests push transcripts through the controller directly).
    struct FakeRecognizer {
        available: bool,
        fail_begin: bool,
        begins: Arc<AtomicUsize>,
        ends: Arc<AtomicUsize>,
    }

    impl FakeRecognizer {
        fn available() -> Self {
            Self {
                available: true,
                fail_begin: false,
                begins: Arc::new(AtomicUsize::new(0)),
                ends: Arc::new(AtomicUsize::new(0)),
            }
        }

        fn unavailable() -> Self {
            Self {
                available: false,
                ..Self::available()
            }
        }

        fn failing() -> Self {
            Self {
                fail_begin: true,
                ..Self::available()
            }
        }
    }

    impl RecognitionBackend for FakeRecognizer {
        fn is_available(&self) -> bool {
            self.available
        }

        fn begin(&self, _generation: u64) -> Result<(), SpeechError> {
            if self.fail_begin {
                return Err(SpeechError::Recognition("device busy".to_string()));
            }
            self.begins.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn end(&self) {
            self.ends.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn make_controller() -> SpeechController {
        SpeechController::new(Box::new(FakeRecognizer::available()))
    }

    // ---- Capability ----

    #[test]
    fn test_unsupported_platform_stays_idle() {
        let controller = SpeechController::new(Box::new(FakeRecognizer::unavailable()));
        let result = controller.start();
        assert!(matches!(result, Err(SpeechError::UnsupportedCapability)));
        assert_eq!(controller.state(), RecordingState::Idle);
        assert!(controller.transcript().is_empty());
    }

    #[test]
    fn test_null_recognizer_unavailable() {
        let controller = SpeechController::new(Box::new(NullRecognizer));
        assert!(matches!(
            controller.start(),
            Err(SpeechError::UnsupportedCapability)
        ));
    }

    // ---- Start / stop ----

    #[test]
    fn test_start_transitions_to_recording() {
        let controller = make_controller();
        let generation = controller.start().unwrap();
        assert_eq!(generation, 1);
        assert_eq!(controller.state(), RecordingState::Recording);
    }

    #[test]
    fn test_start_while_recording_fails() {
        let controller = make_controller();
        controller.start().unwrap();
        let result = controller.start();
        assert!(matches!(result, Err(SpeechError::Recognition(_))));
        assert_eq!(controller.state(), RecordingState::Recording);
    }

    #[test]
    fn test_begin_failure_returns_to_idle() {
        let controller = SpeechController::new(Box::new(FakeRecognizer::failing()));
        let result = controller.start();
        assert!(matches!(result, Err(SpeechError::Recognition(_))));
        assert_eq!(controller.state(), RecordingState::Idle);
    }

    #[test]
    fn test_stop_is_idempotent() {
        let controller = make_controller();
        controller.stop();
        controller.stop();
        assert_eq!(controller.state(), RecordingState::Idle);

        controller.start().unwrap();
        controller.stop();
        controller.stop();
        assert_eq!(controller.state(), RecordingState::Idle);
    }

    // ---- Transcript delivery ----

    #[test]
    fn test_transcript_updates_replace() {
        let controller = make_controller();
        let generation = controller.start().unwrap();

        controller.push_transcript(generation, "find me");
        assert_eq!(controller.transcript(), "find me");

        // Each delivery is the full transcript, not a delta.
        controller.push_transcript(generation, "find me beaches");
        assert_eq!(controller.transcript(), "find me beaches");
    }

    #[test]
    fn test_late_update_after_stop_discarded() {
        let controller = make_controller();
        let generation = controller.start().unwrap();
        controller.push_transcript(generation, "partial");
        controller.stop();

        controller.push_transcript(generation, "partial plus late tail");
        assert_eq!(controller.transcript(), "partial");
    }

    #[test]
    fn test_update_from_previous_session_discarded() {
        let controller = make_controller();
        let first = controller.start().unwrap();
        controller.stop();
        let second = controller.start().unwrap();
        assert!(second > first);

        controller.push_transcript(first, "ghost");
        assert_eq!(controller.transcript(), "");

        controller.push_transcript(second, "current");
        assert_eq!(controller.transcript(), "current");
    }

    #[test]
    fn test_start_resets_transcript() {
        let controller = make_controller();
        let generation = controller.start().unwrap();
        controller.push_transcript(generation, "first session text");
        controller.stop();

        controller.start().unwrap();
        assert_eq!(controller.transcript(), "");
    }

    #[test]
    fn test_subscribe_sees_updates() {
        let controller = make_controller();
        let rx = controller.subscribe();
        let generation = controller.start().unwrap();
        controller.push_transcript(generation, "hello");
        assert_eq!(*rx.borrow(), "hello");
    }

    // ---- Recognition errors ----

    #[test]
    fn test_error_stops_recording_and_keeps_transcript() {
        let controller = make_controller();
        let generation = controller.start().unwrap();
        controller.push_transcript(generation, "so far so good");

        controller.report_error(generation, "Failed to record. Please try again.");
        assert_eq!(
            controller.state(),
            RecordingState::Error("Failed to record. Please try again.".to_string())
        );
        assert!(!controller.is_recording());
        // Whatever was transcribed stays in the composer.
        assert_eq!(controller.transcript(), "so far so good");
    }

    #[test]
    fn test_update_after_error_discarded() {
        let controller = make_controller();
        let generation = controller.start().unwrap();
        controller.report_error(generation, "boom");

        controller.push_transcript(generation, "late");
        assert_eq!(controller.transcript(), "");
    }

    #[test]
    fn test_stale_error_report_ignored() {
        let controller = make_controller();
        let first = controller.start().unwrap();
        controller.stop();
        controller.start().unwrap();

        controller.report_error(first, "stale failure");
        assert_eq!(controller.state(), RecordingState::Recording);
    }

    #[test]
    fn test_start_clears_error_state() {
        let controller = make_controller();
        let generation = controller.start().unwrap();
        controller.report_error(generation, "boom");

        controller.start().unwrap();
        assert_eq!(controller.state(), RecordingState::Recording);
    }

    #[test]
    fn test_stop_clears_error_state() {
        let controller = make_controller();
        let generation = controller.start().unwrap();
        controller.report_error(generation, "boom");

        controller.stop();
        assert_eq!(controller.state(), RecordingState::Idle);
    }

    // ---- Backend lifecycle ----

    #[test]
    fn test_backend_end_called_on_stop_and_error() {
        let recognizer = FakeRecognizer::available();
        let ends = Arc::clone(&recognizer.ends);
        let controller = SpeechController::new(Box::new(recognizer));

        let generation = controller.start().unwrap();
        controller.stop();
        assert_eq!(ends.load(Ordering::SeqCst), 1);

        let generation2 = controller.start().unwrap();
        assert!(generation2 > generation);
        controller.report_error(generation2, "boom");
        assert_eq!(ends.load(Ordering::SeqCst), 2);
    }
}

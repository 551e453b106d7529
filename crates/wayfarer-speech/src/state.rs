//! Recording state machine.
//!
//! Enforces valid state transitions for the recording lifecycle:
//! - Idle -> Recording (start)
//! - Recording -> Idle (stop)
//! - Recording -> Error (recognition failure)
//! - Error -> Idle (stop / dismiss)
//! - Error -> Recording (start again; clears the error)

use std::fmt;

/// Operational state of the speech input controller.
///
/// `Error` is a display-only resting state: recording has already stopped
/// and the message is cleared by the next successful start.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordingState {
    /// Not recording. Ready to start.
    Idle,
    /// Actively listening and emitting transcript updates.
    Recording,
    /// Recognition failed; carries the user-visible message.
    Error(String),
}

impl fmt::Display for RecordingState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordingState::Idle => write!(f, "Idle"),
            RecordingState::Recording => write!(f, "Recording"),
            RecordingState::Error(_) => write!(f, "Error"),
        }
    }
}

impl RecordingState {
    /// Returns whether a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: &RecordingState) -> bool {
        matches!(
            (self, target),
            (RecordingState::Idle, RecordingState::Recording)
                | (RecordingState::Recording, RecordingState::Idle)
                | (RecordingState::Recording, RecordingState::Error(_))
                | (RecordingState::Error(_), RecordingState::Idle)
                | (RecordingState::Error(_), RecordingState::Recording)
        )
    }

    /// Whether transcript updates should be accepted in this state.
    pub fn is_recording(&self) -> bool {
        matches!(self, RecordingState::Recording)
    }
}

// =============================================================================
// Tests
// =============================================================================

//! Speech input for message composition.
//!
//! Wraps a platform speech-recognition capability into a small start/stop
//! state machine that emits full-transcript updates while recording. Late
//! callbacks after a stop are discarded via a per-recording generation
//! token.

pub mod controller;
pub mod error;
pub mod state;

pub use controller::{NullRecognizer, RecognitionBackend, SpeechController};
pub use error::SpeechError;
pub use state::RecordingState;

//! Assistant reply parsing and expansion.

use serde::Deserialize;
use serde_json::Value;

use wayfarer_core::{PlaceContent, Turn};

/// Text of the assistant turn appended when a reply cannot be parsed or a
/// query fails. The conversation always progresses; a user turn is never
/// left without an assistant-side resolution.
pub const FALLBACK_REPLY: &str = "An error occurred. Please try again.";

/// A well-formed reply payload: one message plus zero or more places.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ReplyPayload {
    pub message: String,
    #[serde(default)]
    pub places: Vec<PlaceContent>,
}

impl ReplyPayload {
    /// Expand into display turns: the message first, then one turn per
    /// place in backend order.
    pub fn into_turns(self) -> Vec<Turn> {
        let mut turns = Vec::with_capacity(1 + self.places.len());
        turns.push(Turn::assistant(self.message));
        turns.extend(self.places.into_iter().map(Turn::place));
        turns
    }
}

/// Parse a raw reply payload. `None` means the shape is malformed and the
/// caller should fall back to [`FALLBACK_REPLY`].
pub fn parse_reply(value: &Value) -> Option<ReplyPayload> {
    serde_json::from_value(value.clone()).ok()
}

// =============================================================================
// Tests
// =============================================================================

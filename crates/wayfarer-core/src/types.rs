use serde::{Deserialize, Serialize};
use uuid::Uuid;

// =============================================================================
// Identity
// =============================================================================

/// The authenticated user or guest on whose behalf all backend calls run.
///
/// Exactly one identity is live at a time, held by
/// [`crate::identity::IdentityContext`]. A `token` is required for any
/// protected backend call; guests receive a short-lived token from guest
/// entry but no server-side history is kept for them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub token: Option<String>,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub guest: bool,
}

impl Identity {
    /// Returns the auth token, if this identity carries one.
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    /// Display name used in greetings.
    pub fn display_name(&self) -> &str {
        if self.first_name.is_empty() {
            "traveller"
        } else {
            &self.first_name
        }
    }
}

// =============================================================================
// Conversation turns
// =============================================================================

/// Who produced a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    User,
    Assistant,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Assistant => write!(f, "assistant"),
        }
    }
}

/// Plain text payload of a turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TextContent {
    pub text: String,
}

/// A structured place recommendation returned by the assistant.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaceContent {
    pub place_id: String,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
    pub lat: f64,
    pub lng: f64,
}

/// Payload of a single turn: plain text or one place card.
///
/// A backend reply carrying places expands into one text turn followed by
/// one place turn per entry, so the display order is exactly the insertion
/// order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnContent {
    Text(TextContent),
    Place(PlaceContent),
}

impl TurnContent {
    pub fn text(text: impl Into<String>) -> Self {
        TurnContent::Text(TextContent { text: text.into() })
    }
}

/// One entry in a conversation timeline. Appended, never mutated or
/// reordered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub role: Role,
    pub content: TurnContent,
}

impl Turn {
    /// A user turn with plain text content.
    pub fn user(text: impl Into<String>) -> Self {
        Turn {
            role: Role::User,
            content: TurnContent::text(text),
        }
    }

    /// An assistant turn with plain text content.
    pub fn assistant(text: impl Into<String>) -> Self {
        Turn {
            role: Role::Assistant,
            content: TurnContent::text(text),
        }
    }

    /// An assistant turn carrying one place recommendation.
    pub fn place(place: PlaceContent) -> Self {
        Turn {
            role: Role::Assistant,
            content: TurnContent::Place(place),
        }
    }
}

// =============================================================================
// Tests
// =============================================================================

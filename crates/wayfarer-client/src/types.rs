use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use wayfarer_core::Role;

/// A session as the backend reports it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub session_id: String,
    pub session_name: String,
    pub created_at: DateTime<Utc>,
}

/// One history entry as the backend reports it.
///
/// `content` is kept raw: the assistant side may carry `{message}` alone or
/// `{message, places}`, and malformed shapes must survive to the parse
/// boundary instead of failing the whole fetch.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub role: Role,
    pub content: serde_json::Value,
    #[serde(default = "Utc::now")]
    pub timestamp: DateTime<Utc>,
}

impl HistoryEntry {
    pub fn new(role: Role, content: serde_json::Value) -> Self {
        Self {
            role,
            content,
            timestamp: Utc::now(),
        }
    }
}

/// Fields submitted on registration. Consumed only for the confirmation it
/// produces.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RegistrationFields {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub password: String,
}

/// Fields submitted on a profile update.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProfileFields {
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_session_record_roundtrip() {
        let record = SessionRecord {
            session_id: "s1".to_string(),
            session_name: "New Chat".to_string(),
            created_at: Utc::now(),
        };
        let json = serde_json::to_string(&record).unwrap();
        let back: SessionRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(record, back);
    }

    #[test]
    fn test_history_entry_keeps_raw_content() {
        let entry = HistoryEntry::new(Role::Assistant, json!({"unexpected": true}));
        assert_eq!(entry.role, Role::Assistant);
        assert_eq!(entry.content["unexpected"], json!(true));
    }

    #[test]
    fn test_history_entry_deserializes_roles() {
        let raw = r#"{"role":"user","content":{"message":"hi"}}"#;
        let entry: HistoryEntry = serde_json::from_str(raw).unwrap();
        assert_eq!(entry.role, Role::User);
        assert_eq!(entry.content["message"], json!("hi"));
    }

    #[test]
    fn test_profile_fields_default_empty() {
        let fields = ProfileFields::default();
        assert!(fields.first_name.is_none());
        assert!(fields.last_name.is_none());
        assert!(fields.email.is_none());
    }
}

//! Message and chat identity value types.
//!
//! These flow through the whole pipeline:
//! source batch → conversation store → prompt renderer → model → extractor → store.

use crate::error::ValidationError;
use serde::{Deserialize, Serialize};

/// Opaque key naming one conversation thread.
///
/// Case-sensitive and never normalized: `"Bob"` and `"bob"` are different chats.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatId(pub String);

impl ChatId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for ChatId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ChatId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl std::fmt::Display for ChatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A single chat message.
///
/// Immutable once created; ordering is insertion order. `date` and `time`
/// keep whatever format the message source produced.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Display name of whoever sent the message
    pub sender: String,

    /// The text content, possibly multi-line
    #[serde(rename = "message")]
    pub text: String,

    /// Source-defined date string
    #[serde(default)]
    pub date: String,

    /// Source-defined time string
    #[serde(default)]
    pub time: String,
}

impl Message {
    pub fn new(
        sender: impl Into<String>,
        text: impl Into<String>,
        date: impl Into<String>,
        time: impl Into<String>,
    ) -> Self {
        Self {
            sender: sender.into(),
            text: text.into(),
            date: date.into(),
            time: time.into(),
        }
    }

    /// Check the fields a durable record requires.
    ///
    /// `sender` and `message` must carry non-blank text; `date` and `time`
    /// are optional and may be empty.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.sender.trim().is_empty() {
            return Err(ValidationError::MissingField("sender"));
        }
        if self.text.trim().is_empty() {
            return Err(ValidationError::MissingField("message"));
        }
        Ok(())
    }
}

/// Ordered messages belonging to one chat, oldest first.
pub type ChatHistory = Vec<Message>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_text_as_message_field() {
        let msg = Message::new("Ana", "hola\nqué tal", "2024-05-01", "10:15");
        let json = serde_json::to_value(&msg).unwrap();
        assert_eq!(json["sender"], "Ana");
        assert_eq!(json["message"], "hola\nqué tal");
        assert!(json.get("text").is_none());
    }

    #[test]
    fn date_and_time_default_to_empty() {
        let msg: Message = serde_json::from_str(r#"{"sender":"Ana","message":"hi"}"#).unwrap();
        assert_eq!(msg.date, "");
        assert_eq!(msg.time, "");
    }

    #[test]
    fn unknown_fields_are_ignored() {
        let msg: Message = serde_json::from_str(
            r#"{"sender":"Ana","message":"hi","date":"d","time":"t","reactions":3}"#,
        )
        .unwrap();
        assert_eq!(msg.text, "hi");
    }

    #[test]
    fn missing_sender_fails_validation() {
        let msg = Message::new("  ", "hello", "", "");
        assert_eq!(msg.validate(), Err(ValidationError::MissingField("sender")));
    }

    #[test]
    fn missing_text_fails_validation() {
        let msg = Message::new("Ana", "", "", "");
        assert_eq!(msg.validate(), Err(ValidationError::MissingField("message")));
    }

    #[test]
    fn chat_id_is_case_sensitive() {
        assert_ne!(ChatId::from("Bob"), ChatId::from("bob"));
        assert_eq!(ChatId::from("Bob").to_string(), "Bob");
    }
}

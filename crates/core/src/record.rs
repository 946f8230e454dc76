//! Durable chat records and the storage trait behind them.
//!
//! One record per chat identity:
//!
//! ```json
//! {
//!   "last_updated": "2026-01-01T10:00:00Z",
//!   "messages": [
//!     { "sender": "Ana", "message": "hola", "date": "2026-01-01", "time": "10:00" }
//!   ]
//! }
//! ```
//!
//! Loading is lenient: `lastUpdated` is accepted as an alias, naive local
//! timestamps are accepted, unknown fields are ignored, and message entries
//! missing a required field are skipped rather than failing the record. A
//! field that is present but empty still counts as present.

use async_trait::async_trait;
use chrono::{DateTime, Local, NaiveDateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;
use crate::error::StoreError;
use crate::message::{ChatId, Message};

/// Persisted form of one chat's bounded history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChatRecord {
    /// When the record was last written
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<DateTime<Utc>>,

    /// The history, oldest first
    pub messages: Vec<Message>,
}

/// Wire shape accepted on load.
#[derive(Deserialize)]
struct RawRecord {
    #[serde(default, alias = "lastUpdated")]
    last_updated: Option<serde_json::Value>,

    #[serde(default)]
    messages: Vec<serde_json::Value>,
}

impl ChatRecord {
    /// Stamp a history with the current time.
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            last_updated: Some(Utc::now()),
            messages,
        }
    }

    /// Serialize as pretty-printed JSON.
    pub fn encode(&self, key: &str) -> Result<String, StoreError> {
        serde_json::to_string_pretty(self).map_err(|e| StoreError::Serialization {
            key: key.to_string(),
            reason: e.to_string(),
        })
    }

    /// Parse a stored record, skipping malformed message entries.
    pub fn decode(key: &str, json: &str) -> Result<Self, StoreError> {
        let raw: RawRecord = serde_json::from_str(json).map_err(|e| StoreError::Corrupted {
            key: key.to_string(),
            reason: e.to_string(),
        })?;

        let last_updated = raw
            .last_updated
            .as_ref()
            .and_then(serde_json::Value::as_str)
            .and_then(parse_timestamp);

        let messages = raw
            .messages
            .into_iter()
            .enumerate()
            .filter_map(|(index, value)| {
                match serde_json::from_value::<Message>(value) {
                    Ok(msg) => Some(msg),
                    Err(e) => {
                        warn!(record = key, index, error = %e, "Skipping malformed stored message");
                        None
                    }
                }
            })
            .collect();

        Ok(Self {
            last_updated,
            messages,
        })
    }
}

/// Accept RFC 3339 or a naive ISO-8601 timestamp in local time.
fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(ts) = DateTime::parse_from_rfc3339(s) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .and_then(|naive| naive.and_local_timezone(Local).single())
        .map(|ts| ts.with_timezone(&Utc))
}

/// The durable backing store for chat records.
///
/// Implementations: JSON files on disk, in-memory (for testing).
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// The backend name (e.g., "json", "in_memory").
    fn name(&self) -> &str;

    /// Load a chat's record. `Ok(None)` when no record exists.
    async fn load(&self, chat: &ChatId) -> std::result::Result<Option<ChatRecord>, StoreError>;

    /// Replace a chat's record atomically; readers see the old or the new
    /// record, never a partial one.
    async fn save(&self, chat: &ChatId, record: &ChatRecord) -> std::result::Result<(), StoreError>;

    /// Delete a chat's record. Returns whether one existed.
    async fn delete(&self, chat: &ChatId) -> std::result::Result<bool, StoreError>;

    /// Every chat identity that has a record.
    async fn list(&self) -> std::result::Result<Vec<ChatId>, StoreError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encode_uses_fixed_field_names() {
        let record = ChatRecord::new(vec![Message::new("Ana", "hola", "d", "t")]);
        let json = record.encode("Ana").unwrap();
        assert!(json.contains("\"last_updated\""));
        assert!(json.contains("\"messages\""));
        assert!(json.contains("\"message\": \"hola\""));
    }

    #[test]
    fn decode_accepts_camel_case_timestamp_and_extra_fields() {
        let json = r#"{
            "lastUpdated": "2026-03-01T08:30:00Z",
            "owner": "someone",
            "messages": [{"sender":"Ana","message":"hi","date":"d","time":"t","extra":1}]
        }"#;
        let record = ChatRecord::decode("Ana", json).unwrap();
        assert_eq!(record.messages.len(), 1);
        assert_eq!(
            record.last_updated.unwrap().to_rfc3339(),
            "2026-03-01T08:30:00+00:00"
        );
    }

    #[test]
    fn decode_accepts_naive_timestamp() {
        let json = r#"{"last_updated":"2025-11-02T14:05:09.123456","messages":[]}"#;
        let record = ChatRecord::decode("x", json).unwrap();
        assert!(record.last_updated.is_some());
    }

    #[test]
    fn decode_skips_entries_missing_required_fields() {
        let json = r#"{"messages":[
            {"sender":"Ana","message":"first"},
            {"message":"no sender"},
            {"sender":"Ana"},
            {"sender":"Ana","message":"last"}
        ]}"#;
        let record = ChatRecord::decode("Ana", json).unwrap();
        let texts: Vec<&str> = record.messages.iter().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "last"]);
    }

    #[test]
    fn decode_keeps_entries_with_empty_fields() {
        let json = r#"{"messages":[
            {"sender":"Ana","message":""},
            {"sender":"","message":"anonymous"}
        ]}"#;
        let record = ChatRecord::decode("Ana", json).unwrap();
        assert_eq!(record.messages.len(), 2);
        assert_eq!(record.messages[0].text, "");
        assert_eq!(record.messages[1].sender, "");
    }

    #[test]
    fn decode_rejects_non_json() {
        let err = ChatRecord::decode("Ana", "not json").unwrap_err();
        assert!(matches!(err, StoreError::Corrupted { .. }));
    }

    #[test]
    fn encode_decode_preserves_messages() {
        let record = ChatRecord::new(vec![
            Message::new("Ana", "línea 1\nlínea 2", "01/02/2026", "09:00"),
            Message::new("Bot", "ok", "", ""),
        ]);
        let json = record.encode("Ana").unwrap();
        let back = ChatRecord::decode("Ana", &json).unwrap();
        assert_eq!(back.messages, record.messages);
    }
}

//! File-based record store: one pretty-printed JSON file per chat.
//!
//! Storage location: `~/.chatrelay/chat_history/<key>.json`, where `<key>` is
//! the URL-encoded chat identity, so any identity (slashes, dots, emoji) maps
//! to a single file name inside the directory and can be decoded back.
//!
//! Writes go to a temporary file in the same directory and are renamed over
//! the record, so a reader sees either the previous record or the new one.
//! Files are human-inspectable and compatible with records written by hand.

use async_trait::async_trait;
use chatrelay_core::error::StoreError;
use chatrelay_core::message::ChatId;
use chatrelay_core::record::{ChatRecord, RecordStore};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use uuid::Uuid;

const RECORD_EXTENSION: &str = ".json";

/// A directory of JSON chat records.
pub struct JsonFileStore {
    dir: PathBuf,
}

impl JsonFileStore {
    /// Create a store rooted at `dir`. The directory is created on first write.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        let dir = dir.into();
        debug!(dir = %dir.display(), "JSON record store opened");
        Self { dir }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the record for a chat.
    pub fn record_path(&self, chat: &ChatId) -> PathBuf {
        self.dir
            .join(format!("{}{RECORD_EXTENSION}", record_key(chat)))
    }

    async fn write_atomically(&self, path: &Path, key: &str, content: &str) -> Result<(), StoreError> {
        let io_err = |e: std::io::Error| StoreError::Io {
            key: key.to_string(),
            reason: e.to_string(),
        };

        tokio::fs::create_dir_all(&self.dir).await.map_err(io_err)?;

        let tmp_path = self.dir.join(format!(".{key}.{}.tmp", Uuid::new_v4()));
        let written = async {
            let mut file = tokio::fs::File::create(&tmp_path).await?;
            file.write_all(content.as_bytes()).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp_path, path).await
        }
        .await;

        if let Err(e) = written {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp_path).await {
                if cleanup.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp_path.display(), error = %cleanup, "Failed to remove temporary record");
                }
            }
            return Err(io_err(e));
        }

        Ok(())
    }
}

/// File-name key for a chat identity.
pub fn record_key(chat: &ChatId) -> String {
    urlencoding::encode(chat.as_str()).into_owned()
}

/// Recover the chat identity from a record file name.
fn chat_from_file_name(name: &str) -> Option<ChatId> {
    let key = name.strip_suffix(RECORD_EXTENSION)?;
    match urlencoding::decode(key) {
        Ok(id) => Some(ChatId::new(id.into_owned())),
        Err(e) => {
            warn!(file = name, error = %e, "Skipping record with undecodable name");
            None
        }
    }
}

#[async_trait]
impl RecordStore for JsonFileStore {
    fn name(&self) -> &str {
        "json"
    }

    async fn load(&self, chat: &ChatId) -> Result<Option<ChatRecord>, StoreError> {
        let path = self.record_path(chat);
        let key = record_key(chat);

        let content = match tokio::fs::read_to_string(&path).await {
            Ok(c) => c,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                debug!(%chat, "No stored history for chat");
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::Io {
                    key,
                    reason: e.to_string(),
                });
            }
        };

        let record = ChatRecord::decode(&key, &content)?;
        debug!(%chat, count = record.messages.len(), "Stored history loaded");
        Ok(Some(record))
    }

    async fn save(&self, chat: &ChatId, record: &ChatRecord) -> Result<(), StoreError> {
        let key = record_key(chat);
        let content = record.encode(&key)?;
        self.write_atomically(&self.record_path(chat), &key, &content)
            .await?;
        debug!(%chat, count = record.messages.len(), "History saved");
        Ok(())
    }

    async fn delete(&self, chat: &ChatId) -> Result<bool, StoreError> {
        match tokio::fs::remove_file(self.record_path(chat)).await {
            Ok(()) => {
                debug!(%chat, "Stored history deleted");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::Io {
                key: record_key(chat),
                reason: e.to_string(),
            }),
        }
    }

    async fn list(&self) -> Result<Vec<ChatId>, StoreError> {
        let io_err = |e: std::io::Error| StoreError::Io {
            key: self.dir.display().to_string(),
            reason: e.to_string(),
        };

        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(io_err(e)),
        };

        let mut chats = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(io_err)? {
            let file_name = entry.file_name();
            let Some(name) = file_name.to_str() else {
                continue;
            };
            if let Some(chat) = chat_from_file_name(name) {
                chats.push(chat);
            }
        }
        chats.sort();
        Ok(chats)
    }
}

//! In-memory record store, useful for testing and ephemeral sessions.

use async_trait::async_trait;
use chatrelay_core::error::StoreError;
use chatrelay_core::message::ChatId;
use chatrelay_core::record::{ChatRecord, RecordStore};
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use tokio::sync::RwLock;

/// A record store that keeps records in a map.
///
/// Can be told to fail every write, which simulates an unavailable disk.
pub struct InMemoryRecordStore {
    records: Arc<RwLock<HashMap<ChatId, ChatRecord>>>,
    fail_writes: AtomicBool,
    saves: AtomicUsize,
}

impl InMemoryRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            fail_writes: AtomicBool::new(false),
            saves: AtomicUsize::new(0),
        }
    }

    /// Make subsequent saves and deletes fail (or succeed again).
    pub fn set_fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    /// Number of successful saves so far.
    pub fn save_count(&self) -> usize {
        self.saves.load(Ordering::SeqCst)
    }

    /// Copy of the stored record, bypassing the trait.
    pub async fn snapshot(&self, chat: &ChatId) -> Option<ChatRecord> {
        self.records.read().await.get(chat).cloned()
    }

    /// Seed a record directly, as if written by an earlier process.
    pub async fn insert(&self, chat: ChatId, record: ChatRecord) {
        self.records.write().await.insert(chat, record);
    }

    fn check_writable(&self, chat: &ChatId) -> Result<(), StoreError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(StoreError::Unavailable(format!(
                "writes disabled for '{chat}'"
            )));
        }
        Ok(())
    }
}

impl Default for InMemoryRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    fn name(&self) -> &str {
        "in_memory"
    }

    async fn load(&self, chat: &ChatId) -> Result<Option<ChatRecord>, StoreError> {
        Ok(self.records.read().await.get(chat).cloned())
    }

    async fn save(&self, chat: &ChatId, record: &ChatRecord) -> Result<(), StoreError> {
        self.check_writable(chat)?;
        self.records
            .write()
            .await
            .insert(chat.clone(), record.clone());
        self.saves.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn delete(&self, chat: &ChatId) -> Result<bool, StoreError> {
        self.check_writable(chat)?;
        Ok(self.records.write().await.remove(chat).is_some())
    }

    async fn list(&self) -> Result<Vec<ChatId>, StoreError> {
        let mut chats: Vec<ChatId> = self.records.read().await.keys().cloned().collect();
        chats.sort();
        Ok(chats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatrelay_core::message::Message;

    fn record(text: &str) -> ChatRecord {
        ChatRecord::new(vec![Message::new("Ana", text, "", "")])
    }

    #[tokio::test]
    async fn save_load_delete() {
        let store = InMemoryRecordStore::new();
        let chat = ChatId::from("Ana");

        assert!(store.load(&chat).await.unwrap().is_none());
        store.save(&chat, &record("hi")).await.unwrap();
        assert_eq!(store.load(&chat).await.unwrap().unwrap().messages[0].text, "hi");
        assert_eq!(store.save_count(), 1);

        assert!(store.delete(&chat).await.unwrap());
        assert!(!store.delete(&chat).await.unwrap());
    }

    #[tokio::test]
    async fn failing_writes_leave_records_untouched() {
        let store = InMemoryRecordStore::new();
        let chat = ChatId::from("Ana");
        store.save(&chat, &record("before")).await.unwrap();

        store.set_fail_writes(true);
        assert!(matches!(
            store.save(&chat, &record("after")).await,
            Err(StoreError::Unavailable(_))
        ));
        assert!(store.delete(&chat).await.is_err());
        assert_eq!(store.snapshot(&chat).await.unwrap().messages[0].text, "before");

        store.set_fail_writes(false);
        store.save(&chat, &record("after")).await.unwrap();
        assert_eq!(store.snapshot(&chat).await.unwrap().messages[0].text, "after");
    }

    #[tokio::test]
    async fn list_is_sorted() {
        let store = InMemoryRecordStore::new();
        store.insert(ChatId::from("b"), record("x")).await;
        store.insert(ChatId::from("a"), record("x")).await;
        assert_eq!(
            store.list().await.unwrap(),
            vec![ChatId::from("a"), ChatId::from("b")]
        );
    }
}

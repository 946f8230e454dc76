//! Bounded, write-through conversation store.
//!
//! Keeps a per-chat sliding window of the most recent messages in memory and
//! mirrors every change to a [`RecordStore`]. The in-memory copy is always
//! authoritative: when a durable write fails the mutation is kept, the chat
//! is flagged stale, and the failure is handed back to the caller as a
//! warning rather than an error.
//!
//! Operations on one chat are serialized by a per-chat mutex held across the
//! whole load/append/persist sequence. Different chats never wait on each
//! other beyond the brief map lookup.

use chatrelay_config::{ChatConfig, ConfigError};
use chatrelay_core::error::{StoreError, ValidationError};
use chatrelay_core::message::{ChatHistory, ChatId, Message};
use chatrelay_core::record::{ChatRecord, RecordStore};
use std::collections::{BTreeSet, HashMap};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::{Mutex, OwnedMutexGuard, RwLock};
use tracing::{debug, info, warn};

use crate::file_backend::JsonFileStore;

/// Cached state for one chat.
#[derive(Debug, Default)]
struct ChatSlot {
    /// `None` until loaded from durable storage
    history: Option<ChatHistory>,
    /// The last durable write for this chat failed
    stale: bool,
    /// Removed from the slot map by a clear; lockers must fetch a fresh slot
    retired: bool,
}

/// A message dropped from an append batch.
#[derive(Debug, Clone, PartialEq)]
pub struct RejectedMessage {
    /// Position in the submitted batch
    pub index: usize,
    pub error: ValidationError,
}

/// What an append did.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct AppendReport {
    /// Messages accepted into the history
    pub appended: usize,
    /// Oldest messages dropped to respect the bound
    pub evicted: usize,
    /// History length after the append
    pub retained: usize,
    pub rejected: Vec<RejectedMessage>,
    /// Set when the durable write failed; the in-memory history still changed
    pub persistence: Option<StoreError>,
}

impl AppendReport {
    pub fn is_persisted(&self) -> bool {
        self.persistence.is_none()
    }
}

/// What a clear did.
#[must_use]
#[derive(Debug, Clone, Default)]
pub struct ClearReport {
    /// Chats whose cache and durable record are both gone
    pub cleared: Vec<ChatId>,
    /// Chats whose durable delete failed; their cache now holds an empty, stale history
    pub failures: Vec<(ChatId, StoreError)>,
    /// Durable chats could not be enumerated; only cached chats were cleared
    pub listing: Option<StoreError>,
}

impl ClearReport {
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty() && self.listing.is_none()
    }
}

/// Per-chat bounded history with write-through persistence.
pub struct ConversationStore {
    backend: Arc<dyn RecordStore>,
    max_history: NonZeroUsize,
    slots: RwLock<HashMap<ChatId, Arc<Mutex<ChatSlot>>>>,
}

impl ConversationStore {
    pub fn new(backend: Arc<dyn RecordStore>, max_history: NonZeroUsize) -> Self {
        info!(
            backend = backend.name(),
            max_history = max_history.get(),
            "Conversation store initialized"
        );
        Self {
            backend,
            max_history,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Build a store over the configured JSON directory.
    pub fn from_config(config: &ChatConfig) -> Result<Self, ConfigError> {
        let bound = config.max_history_bound()?;
        let backend = Arc::new(JsonFileStore::new(config.storage_dir()));
        Ok(Self::new(backend, bound))
    }

    pub fn max_history(&self) -> NonZeroUsize {
        self.max_history
    }

    pub fn backend_name(&self) -> &str {
        self.backend.name()
    }

    async fn slot(&self, chat: &ChatId) -> Arc<Mutex<ChatSlot>> {
        if let Some(slot) = self.slots.read().await.get(chat) {
            return Arc::clone(slot);
        }
        let mut slots = self.slots.write().await;
        Arc::clone(slots.entry(chat.clone()).or_default())
    }

    /// Lock the live slot for a chat, skipping any retired by a clear.
    async fn lock_slot(&self, chat: &ChatId) -> OwnedMutexGuard<ChatSlot> {
        loop {
            let guard = self.slot(chat).await.lock_owned().await;
            if !guard.retired {
                return guard;
            }
        }
    }

    /// Drop the oldest messages beyond the bound; returns how many went.
    fn enforce_bound(&self, history: &mut ChatHistory) -> usize {
        let excess = history.len().saturating_sub(self.max_history.get());
        history.drain(..excess);
        excess
    }

    /// Read the durable record, bounded to the current limit. Also returns
    /// how many stored messages fell outside the bound.
    async fn load_bounded(&self, chat: &ChatId) -> Result<(ChatHistory, usize), StoreError> {
        let Some(record) = self.backend.load(chat).await? else {
            return Ok((Vec::new(), 0));
        };
        let mut history = record.messages;
        let evicted = self.enforce_bound(&mut history);
        if evicted > 0 {
            debug!(%chat, evicted, "Stored history exceeded bound, truncated on load");
        }
        Ok((history, evicted))
    }

    /// Append messages to a chat, enforce the bound, and persist.
    ///
    /// Invalid messages are rejected one by one; the rest of the batch still
    /// goes in. When the existing record cannot be read the append starts
    /// from an empty history and the next write replaces the unreadable one.
    /// A stored record longer than the bound is rewritten truncated even if
    /// the whole batch is rejected.
    pub async fn append(
        &self,
        chat: &ChatId,
        messages: impl IntoIterator<Item = Message>,
    ) -> AppendReport {
        let mut slot = self.lock_slot(chat).await;
        let mut report = AppendReport::default();

        let (mut history, truncated_on_load) = match slot.history.take() {
            Some(history) => (history, 0),
            None => self.load_bounded(chat).await.unwrap_or_else(|e| {
                warn!(%chat, error = %e, "Could not read stored history, starting fresh");
                (Vec::new(), 0)
            }),
        };

        for (index, message) in messages.into_iter().enumerate() {
            match message.validate() {
                Ok(()) => {
                    history.push(message);
                    report.appended += 1;
                }
                Err(error) => {
                    warn!(%chat, index, %error, "Rejected inbound message");
                    report.rejected.push(RejectedMessage { index, error });
                }
            }
        }

        report.evicted = self.enforce_bound(&mut history);
        report.retained = history.len();

        if report.appended > 0 || truncated_on_load > 0 {
            let record = ChatRecord::new(history.clone());
            match self.backend.save(chat, &record).await {
                Ok(()) => slot.stale = false,
                Err(e) => {
                    warn!(%chat, error = %e, "Failed to persist history, keeping in memory");
                    slot.stale = true;
                    report.persistence = Some(e);
                }
            }
        }

        debug!(
            %chat,
            appended = report.appended,
            evicted = report.evicted,
            retained = report.retained,
            "Messages appended"
        );
        slot.history = Some(history);
        report
    }

    /// The current bounded history for a chat, oldest first.
    ///
    /// A read failure yields an empty history and caches nothing, so the
    /// next call tries the durable store again.
    pub async fn get_history(&self, chat: &ChatId) -> ChatHistory {
        let mut slot = self.lock_slot(chat).await;

        if let Some(history) = &slot.history {
            return history.clone();
        }

        match self.load_bounded(chat).await {
            Ok((history, _)) => {
                slot.history = Some(history.clone());
                history
            }
            Err(e) => {
                warn!(%chat, error = %e, "Failed to load history");
                Vec::new()
            }
        }
    }

    /// Clear one chat, or every known chat when `chat` is `None`.
    pub async fn clear(&self, chat: Option<&ChatId>) -> ClearReport {
        let mut report = ClearReport::default();

        let targets: BTreeSet<ChatId> = match chat {
            Some(chat) => BTreeSet::from([chat.clone()]),
            None => {
                let mut targets: BTreeSet<ChatId> =
                    self.slots.read().await.keys().cloned().collect();
                match self.backend.list().await {
                    Ok(durable) => targets.extend(durable),
                    Err(e) => {
                        warn!(error = %e, "Could not list stored chats, clearing cached chats only");
                        report.listing = Some(e);
                    }
                }
                targets
            }
        };

        for chat in targets {
            match self.clear_one(&chat).await {
                Ok(()) => report.cleared.push(chat),
                Err(e) => report.failures.push((chat, e)),
            }
        }

        info!(
            cleared = report.cleared.len(),
            failed = report.failures.len(),
            "History cleared"
        );
        report
    }

    async fn clear_one(&self, chat: &ChatId) -> Result<(), StoreError> {
        let mut slot = self.lock_slot(chat).await;

        match self.backend.delete(chat).await {
            Ok(existed) => {
                debug!(%chat, existed, "Chat cleared");
                slot.stale = false;
                slot.retired = true;
                self.slots.write().await.remove(chat);
                Ok(())
            }
            Err(e) => {
                warn!(%chat, error = %e, "Failed to delete stored history, clearing memory only");
                slot.history = Some(Vec::new());
                slot.stale = true;
                Err(e)
            }
        }
    }

    /// Chats with a durable record.
    pub async fn list_known_chats(&self) -> Result<BTreeSet<ChatId>, StoreError> {
        Ok(self.backend.list().await?.into_iter().collect())
    }

    /// Load every durable record into the cache. Returns how many chats are
    /// now resident; unreadable records are logged and skipped.
    pub async fn preload(&self) -> Result<usize, StoreError> {
        let mut loaded = 0;
        for chat in self.backend.list().await? {
            let mut slot = self.lock_slot(&chat).await;
            if slot.history.is_some() {
                loaded += 1;
                continue;
            }
            match self.load_bounded(&chat).await {
                Ok((history, _)) => {
                    slot.history = Some(history);
                    loaded += 1;
                }
                Err(e) => warn!(%chat, error = %e, "Skipping unreadable history during preload"),
            }
        }
        info!(chats = loaded, "History preloaded");
        Ok(loaded)
    }

    /// Whether the last durable write for a chat failed.
    pub async fn is_stale(&self, chat: &ChatId) -> bool {
        let slot = self.slots.read().await.get(chat).cloned();
        match slot {
            Some(slot) => slot.lock().await.stale,
            None => false,
        }
    }
}

//! One relay cycle per chat with unread messages.
//!
//! 1. **Record** the inbound batch in the conversation store
//! 2. **Render** the bounded history into a prompt
//! 3. **Generate** a raw reply through the model provider
//! 4. **Extract** the user-facing messages, falling back to the raw reply
//! 5. **Record** the reply as an assistant message and hand it back
//!
//! Delivering the reply to the chat surface is the caller's job.

use chatrelay_config::{AppConfig, ConfigError};
use chatrelay_core::error::{ProviderError, SourceError};
use chatrelay_core::message::{ChatId, Message};
use chatrelay_core::provider::ModelProvider;
use chatrelay_core::source::{InboundBatch, MessageSource};
use chatrelay_extractor::{extract_detailed, Strategy};
use chatrelay_memory::ConversationStore;
use chrono::Local;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::prompt::PromptRenderer;

/// Date format of recorded assistant replies.
pub const REPLY_DATE_FORMAT: &str = "%Y-%m-%d";

/// Time format of recorded assistant replies.
pub const REPLY_TIME_FORMAT: &str = "%H:%M";

/// How a batch was handled.
#[derive(Debug, Clone)]
pub enum RelayOutcome {
    /// The batch had no messages
    Skipped,
    /// The provider failed; nothing to send this cycle
    NoResponse { reason: ProviderError },
    /// The provider answered with blank text
    Silent,
    /// A reply is ready for delivery
    Replied {
        reply: String,
        /// `false` when no messages could be extracted and the raw output is used
        extracted: bool,
        strategy: Option<Strategy>,
    },
}

impl RelayOutcome {
    pub fn reply(&self) -> Option<&str> {
        match self {
            RelayOutcome::Replied { reply, .. } => Some(reply),
            _ => None,
        }
    }
}

/// Orchestrates store, renderer, provider and extractor for each batch.
pub struct Relay {
    store: Arc<ConversationStore>,
    renderer: PromptRenderer,
    provider: Arc<dyn ModelProvider>,
    assistant_name: String,
    record_replies: bool,
}

impl Relay {
    pub fn new(
        store: Arc<ConversationStore>,
        renderer: PromptRenderer,
        provider: Arc<dyn ModelProvider>,
        assistant_name: impl Into<String>,
    ) -> Self {
        Self {
            store,
            renderer,
            provider,
            assistant_name: assistant_name.into(),
            record_replies: true,
        }
    }

    /// Wire a relay from configuration with the JSON record store.
    pub fn from_config(
        config: &AppConfig,
        provider: Arc<dyn ModelProvider>,
    ) -> Result<Self, ConfigError> {
        let store = Arc::new(ConversationStore::from_config(&config.chat)?);
        let renderer = PromptRenderer::from_config(&config.prompt);
        Ok(Self::new(
            store,
            renderer,
            provider,
            config.prompt.assistant_name.clone(),
        ))
    }

    /// Whether replies are appended to the history (default: yes).
    pub fn with_record_replies(mut self, enabled: bool) -> Self {
        self.record_replies = enabled;
        self
    }

    pub fn store(&self) -> &Arc<ConversationStore> {
        &self.store
    }

    /// Run the cycle for one chat's inbound batch.
    pub async fn handle_batch(&self, batch: InboundBatch) -> RelayOutcome {
        let InboundBatch { chat, messages } = batch;
        if messages.is_empty() {
            debug!(%chat, "Empty batch, nothing to relay");
            return RelayOutcome::Skipped;
        }

        info!(%chat, count = messages.len(), "Processing chat");
        let report = self.store.append(&chat, messages).await;
        if !report.rejected.is_empty() {
            warn!(%chat, rejected = report.rejected.len(), "Some inbound messages were rejected");
        }
        if let Some(e) = &report.persistence {
            warn!(%chat, error = %e, "Inbound messages kept in memory only");
        }

        let history = self.store.get_history(&chat).await;
        let prompt = self.renderer.render(&chat, &history);
        debug!(%chat, history = history.len(), prompt_len = prompt.len(), "Prompt rendered");

        let raw = match self.provider.generate(&prompt).await {
            Ok(raw) => raw,
            Err(e) => {
                warn!(%chat, provider = self.provider.name(), error = %e, "Provider failed, no response this cycle");
                return RelayOutcome::NoResponse { reason: e };
            }
        };

        let extraction = extract_detailed(&raw);
        let (reply, extracted) = match extraction.joined() {
            Some(text) => (text, true),
            None => {
                debug!(%chat, "No messages extracted, using raw output");
                (raw.trim().to_string(), false)
            }
        };

        if reply.is_empty() {
            info!(%chat, "Provider returned a blank reply");
            return RelayOutcome::Silent;
        }

        if self.record_replies {
            self.record_reply(&chat, &reply).await;
        }

        info!(%chat, extracted, strategy = ?extraction.strategy, "Reply ready");
        RelayOutcome::Replied {
            reply,
            extracted,
            strategy: extraction.strategy,
        }
    }

    async fn record_reply(&self, chat: &ChatId, reply: &str) {
        let now = Local::now();
        let message = Message::new(
            self.assistant_name.as_str(),
            reply,
            now.format(REPLY_DATE_FORMAT).to_string(),
            now.format(REPLY_TIME_FORMAT).to_string(),
        );
        let report = self.store.append(chat, [message]).await;
        if let Some(e) = report.persistence {
            warn!(%chat, error = %e, "Reply kept in memory only");
        }
    }

    /// Fetch unread batches and handle each in turn.
    ///
    /// A failure in one chat never stops the others; only a failing source
    /// aborts the pass.
    pub async fn run_once(
        &self,
        source: &dyn MessageSource,
    ) -> Result<Vec<(ChatId, RelayOutcome)>, SourceError> {
        let batches = source.unread().await?;
        debug!(source = source.name(), chats = batches.len(), "Unread chats fetched");

        let mut outcomes = Vec::with_capacity(batches.len());
        for batch in batches {
            let chat = batch.chat.clone();
            let outcome = self.handle_batch(batch).await;
            outcomes.push((chat, outcome));
        }
        Ok(outcomes)
    }
}

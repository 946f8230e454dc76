//! Message source trait: the abstraction over the chat surface.
//!
//! A source hands over batches of inbound messages, one batch per chat with
//! unread activity. Scraping, sessions and delivery all live behind it.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use crate::error::SourceError;
use crate::message::{ChatId, Message};

/// Inbound messages for one chat, in the order the surface showed them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InboundBatch {
    pub chat: ChatId,
    pub messages: Vec<Message>,
}

impl InboundBatch {
    pub fn new(chat: impl Into<ChatId>, messages: Vec<Message>) -> Self {
        Self {
            chat: chat.into(),
            messages,
        }
    }
}

#[async_trait]
pub trait MessageSource: Send + Sync {
    /// The source name (e.g., "whatsapp-web", "static").
    fn name(&self) -> &str;

    /// Fetch every chat with unread messages.
    async fn unread(&self) -> std::result::Result<Vec<InboundBatch>, SourceError>;
}

//! Shared test doubles for the relay tests.

use chatrelay_core::error::{ProviderError, SourceError};
use chatrelay_core::message::Message;
use chatrelay_core::provider::ModelProvider;
use chatrelay_core::source::{InboundBatch, MessageSource};
use std::collections::VecDeque;
use std::sync::Mutex;

/// A provider that answers with a queue of scripted results and remembers
/// every prompt it was given.
///
/// Panics if called more often than results were provided.
pub struct ScriptedProvider {
    results: Mutex<VecDeque<Result<String, ProviderError>>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedProvider {
    pub fn new(results: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            results: Mutex::new(results.into()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    /// Only successful replies.
    pub fn replies<S: Into<String>>(replies: impl IntoIterator<Item = S>) -> Self {
        Self::new(replies.into_iter().map(|r| Ok(r.into())).collect())
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl ModelProvider for ScriptedProvider {
    fn name(&self) -> &str {
        "scripted"
    }

    async fn generate(&self, prompt: &str) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.results
            .lock()
            .unwrap()
            .pop_front()
            .expect("ScriptedProvider: no more scripted results")
    }
}

/// A source that hands out a fixed set of batches once, or always fails.
pub struct StaticSource {
    batches: Mutex<Option<Vec<InboundBatch>>>,
    fail: bool,
}

impl StaticSource {
    pub fn new(batches: Vec<InboundBatch>) -> Self {
        Self {
            batches: Mutex::new(Some(batches)),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            batches: Mutex::new(None),
            fail: true,
        }
    }
}

#[async_trait::async_trait]
impl MessageSource for StaticSource {
    fn name(&self) -> &str {
        "static"
    }

    async fn unread(&self) -> Result<Vec<InboundBatch>, SourceError> {
        if self.fail {
            return Err(SourceError::ConnectionLost("session expired".into()));
        }
        Ok(self.batches.lock().unwrap().take().unwrap_or_default())
    }
}

/// A batch of messages from `chat`, sent by `chat`.
pub fn inbound(chat: &str, texts: &[&str]) -> InboundBatch {
    InboundBatch::new(
        chat,
        texts
            .iter()
            .map(|t| Message::new(chat, *t, "2026-01-01", "10:00"))
            .collect(),
    )
}

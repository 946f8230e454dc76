//! Model collaborator trait.
//!
//! A provider takes a fully rendered prompt and returns the model's raw,
//! untrusted text. Nothing in the core implements it; the relay cycle only
//! depends on this contract.

use async_trait::async_trait;
use crate::error::ProviderError;

/// The model side of a relay cycle.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    /// The provider name (e.g., "gemini", "mock").
    fn name(&self) -> &str;

    /// Send a rendered prompt and return the raw response text.
    ///
    /// An error means "no response this cycle"; callers never retry inside
    /// the core.
    async fn generate(&self, prompt: &str) -> std::result::Result<String, ProviderError>;
}

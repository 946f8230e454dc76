//! The relay side of chatrelay: prompt rendering and the per-chat cycle.
//!
//! Each cycle follows **Record → Render → Generate → Extract → Record**:
//!
//! 1. **Record** inbound messages in the bounded conversation store
//! 2. **Render** the chat's history through the prompt template
//! 3. **Generate** a raw reply with the configured model provider
//! 4. **Extract** user-facing messages, falling back to the raw text
//! 5. **Record** the reply so the next prompt sees it

pub mod prompt;
pub mod relay;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use prompt::{PromptRenderer, PromptTemplate, TemplateError, TemplateSource};
pub use relay::{Relay, RelayOutcome};

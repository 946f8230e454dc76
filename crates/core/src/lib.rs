//! # chatrelay Core
//!
//! Domain types, traits, and error definitions for the chatrelay
//! conversational pipeline. Every other crate depends inward on this one.
//!
//! ## Design Philosophy
//!
//! The durable record store and the two external collaborators (the chat
//! surface that supplies inbound messages and the model that produces raw
//! replies) are defined as traits here. Implementations live elsewhere:
//! - `chatrelay-memory` implements [`RecordStore`]
//! - the embedding application implements [`MessageSource`] and [`ModelProvider`]
//!
//! Tests swap any of them for in-memory doubles.

pub mod error;
pub mod message;
pub mod provider;
pub mod record;
pub mod source;

// Re-export key types at crate root for ergonomics
pub use error::{ProviderError, SourceError, StoreError, ValidationError};
pub use message::{ChatHistory, ChatId, Message};
pub use provider::ModelProvider;
pub use record::{ChatRecord, RecordStore};
pub use source::{InboundBatch, MessageSource};

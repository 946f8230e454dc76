//! Conversation history for chatrelay: the bounded per-chat store and the
//! durable record backends behind it.

pub mod file_backend;
pub mod in_memory;
pub mod store;

pub use file_backend::JsonFileStore;
pub use in_memory::InMemoryRecordStore;
pub use store::{AppendReport, ClearReport, ConversationStore, RejectedMessage};

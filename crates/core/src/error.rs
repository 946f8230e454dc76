//! Error types for the chatrelay domain.
//!
//! Uses `thiserror` for ergonomic error definitions.
//! Each bounded context has its own error enum.

use thiserror::Error;

// --- Bounded context errors ---

/// A durable read, write, or delete failed.
///
/// Never fatal to a relay cycle: the conversation store keeps serving from
/// memory and reports the failure as a warning.
#[derive(Debug, Clone, Error)]
pub enum StoreError {
    #[error("I/O failure on record '{key}': {reason}")]
    Io { key: String, reason: String },

    #[error("Failed to serialize record '{key}': {reason}")]
    Serialization { key: String, reason: String },

    #[error("Record '{key}' is corrupted: {reason}")]
    Corrupted { key: String, reason: String },

    #[error("Storage unavailable: {0}")]
    Unavailable(String),
}

/// The model collaborator failed; the cycle gets no response.
#[derive(Debug, Clone, Error)]
pub enum ProviderError {
    #[error("API request failed: {message} (status: {status_code})")]
    ApiError { status_code: u16, message: String },

    #[error("Rate limited by provider, retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u64 },

    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Network error: {0}")]
    Network(String),
}

/// The inbound message source failed.
#[derive(Debug, Clone, Error)]
pub enum SourceError {
    #[error("Source connection lost: {0}")]
    ConnectionLost(String),

    #[error("Invalid inbound payload: {0}")]
    InvalidPayload(String),
}

/// A message record is missing a required field.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("message is missing required field '{0}'")]
    MissingField(&'static str),
}

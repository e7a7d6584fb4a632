//! Bounded, ordered conversation history for chat-style LLM calls.
//!
//! A [`ConversationStore`] keeps an ordered window of [`MessageRecord`]
//! turns together with an optional system prompt. Callers append turns with
//! [`ConversationStore::add`], read them back filtered or formatted, and
//! round-trip the whole store through JSON for persistence. The store never
//! performs network I/O; it only feeds the client code that does.

use thiserror::Error;

pub mod message;
pub mod store;

pub use message::MessageRecord;
pub use store::{ChatMessage, ConversationStore, FilterOptions};

/// Failures raised by parsing, converting or serializing stored messages.
#[derive(Debug, Error)]
pub enum ContextError {
    /// The serialized input was not the expected export shape.
    #[error("failed to parse messages: {0}")]
    Parse(String),
    /// A single message entry was missing a required field or had the wrong type.
    #[error("invalid message record: {0}")]
    Record(String),
    /// A bulk load failed; the store was left untouched.
    #[error("failed to load messages: {0}")]
    Load(#[source] Box<ContextError>),
    /// Exporting the store to JSON failed.
    #[error("serialization error: {0}")]
    Serialize(String),
}

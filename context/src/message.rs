//! A single immutable turn in a conversation.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::ContextError;

const DEFAULT_ASSISTANT: &str = "default";

fn default_assistant_name() -> String {
    DEFAULT_ASSISTANT.to_string()
}

/// One turn of a conversation: who spoke, what they said, and when.
///
/// Records are immutable once constructed; the builder setters consume the
/// record and may only be used before it is handed to a store.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct MessageRecord {
    role: String,
    content: String,
    #[serde(default = "default_assistant_name")]
    assistant_name: String,
    #[serde(default = "Utc::now")]
    timestamp: DateTime<Utc>,
}

impl MessageRecord {
    /// Create a record stamped with the current time for the default assistant.
    pub fn new(role: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            role: role.into(),
            content: content.into(),
            assistant_name: default_assistant_name(),
            timestamp: Utc::now(),
        }
    }

    /// Tag the record with an assistant identity other than `"default"`.
    pub fn with_assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = name.into();
        self
    }

    /// Override the creation timestamp.
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    pub fn role(&self) -> &str {
        &self.role
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn assistant_name(&self) -> &str {
        &self.assistant_name
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }

    /// Render the turn as a display line.
    ///
    /// The three well-known roles map to fixed display names (`system` →
    /// `System`, `user` → `Human`, `assistant` → `Assistant`); any other
    /// role is shown with its first character upper-cased. A non-default
    /// assistant identity is appended in parentheses.
    pub fn format_message(&self) -> String {
        let display = match self.role.as_str() {
            "system" => "System".to_string(),
            "user" => "Human".to_string(),
            "assistant" => "Assistant".to_string(),
            other => capitalize(other),
        };
        if self.assistant_name == DEFAULT_ASSISTANT {
            format!("{}: {}", display, self.content)
        } else {
            format!("{} ({}): {}", display, self.assistant_name, self.content)
        }
    }

    /// Convert to the wire shape used by the store's JSON export.
    ///
    /// The timestamp is emitted as an RFC 3339 string.
    pub fn to_value(&self) -> Value {
        json!({
            "role": self.role,
            "content": self.content,
            "assistant_name": self.assistant_name,
            "timestamp": self.timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, true),
        })
    }

    /// Parse a record from the wire shape.
    ///
    /// `assistant_name` defaults to `"default"` and `timestamp` to the
    /// current time when absent. A missing or non-string `role`/`content`
    /// fails with [`ContextError::Record`].
    pub fn from_value(value: &Value) -> Result<Self, ContextError> {
        serde_json::from_value(value.clone()).map_err(|e| ContextError::Record(e.to_string()))
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
        None => String::new(),
    }
}

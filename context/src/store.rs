//! Ordered, windowed store of conversation turns.

use log::debug;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::message::MessageRecord;
use crate::ContextError;

/// A role/content pair, the shape chat APIs consume.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

/// Narrowing options for [`ConversationStore::filter`] and
/// [`ConversationStore::format`]. Unset fields leave the sequence untouched.
#[derive(Clone, Debug, Default)]
pub struct FilterOptions {
    pub assistant_name: Option<String>,
    pub role: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl FilterOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assistant_name(mut self, name: impl Into<String>) -> Self {
        self.assistant_name = Some(name.into());
        self
    }

    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub fn offset(mut self, offset: usize) -> Self {
        self.offset = Some(offset);
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// JSON export shape: `{ system_prompt?, messages: [...] }`.
#[derive(Serialize)]
struct StoreExport {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_prompt: Option<String>,
    messages: Vec<Value>,
}

/// Ordered history of [`MessageRecord`] turns plus a fixed system prompt and
/// an optional window size.
///
/// Insertion order is conversation order. When a window is configured the
/// oldest turns are evicted first; only [`ConversationStore::add`] enforces
/// the window. The store is single-owner and fully synchronous.
#[derive(Debug, Default)]
pub struct ConversationStore {
    messages: Vec<MessageRecord>,
    system_prompt: Option<String>,
    max_messages: Option<usize>,
}

impl ConversationStore {
    /// Empty store with no system prompt and no window.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the system prompt. Fixed for the lifetime of the store.
    pub fn with_system_prompt(mut self, prompt: impl Into<String>) -> Self {
        self.system_prompt = Some(prompt.into());
        self
    }

    /// Cap the history at `max` turns, evicting oldest-first on `add`.
    pub fn with_max_messages(mut self, max: usize) -> Self {
        self.max_messages = Some(max);
        self
    }

    /// Seed the store with an initial set of records.
    pub fn with_records(mut self, records: Vec<MessageRecord>) -> Self {
        self.messages = records;
        self
    }

    /// Append a turn stamped with the current time, then evict from the
    /// front until the window invariant holds. Always succeeds.
    pub fn add(
        &mut self,
        content: impl Into<String>,
        role: impl Into<String>,
        assistant_name: impl Into<String>,
    ) {
        self.messages
            .push(MessageRecord::new(role, content).with_assistant_name(assistant_name));
        if let Some(max) = self.max_messages {
            if self.messages.len() > max {
                let excess = self.messages.len() - max;
                self.messages.drain(0..excess);
                debug!("evicted {excess} oldest turns to keep window of {max}");
            }
        }
    }

    /// Append a `user` turn for the default assistant.
    pub fn add_user(&mut self, content: impl Into<String>) {
        self.add(content, "user", "default");
    }

    /// Append an `assistant` turn for the default assistant.
    pub fn add_assistant(&mut self, content: impl Into<String>) {
        self.add(content, "assistant", "default");
    }

    /// Narrow the history to role/content pairs.
    ///
    /// Predicates apply in a fixed order, each narrowing the previous
    /// result: assistant-name equality, role equality, `offset` skipped from
    /// the front, then at most `limit` kept. No match yields an empty vec.
    pub fn filter(&self, options: &FilterOptions) -> Vec<ChatMessage> {
        self.messages
            .iter()
            .filter(|m| {
                options
                    .assistant_name
                    .as_deref()
                    .map_or(true, |name| m.assistant_name() == name)
            })
            .filter(|m| options.role.as_deref().map_or(true, |role| m.role() == role))
            .skip(options.offset.unwrap_or(0))
            .take(options.limit.unwrap_or(usize::MAX))
            .map(|m| ChatMessage {
                role: m.role().to_string(),
                content: m.content().to_string(),
            })
            .collect()
    }

    /// Every stored turn as a role/content pair, in order.
    pub fn messages(&self) -> Vec<ChatMessage> {
        self.filter(&FilterOptions::default())
    }

    /// Render the (optionally filtered) history as a transcript.
    ///
    /// A configured system prompt becomes a leading `System: ...` block.
    /// Every rendered line uses `options.assistant_name` (or `"default"`)
    /// as the assistant identity, regardless of each turn's stored identity.
    /// Blocks are joined by a blank line.
    pub fn format(&self, options: &FilterOptions) -> String {
        let mut blocks = Vec::new();
        if let Some(prompt) = &self.system_prompt {
            blocks.push(format!("System: {prompt}"));
        }
        let name = options.assistant_name.as_deref().unwrap_or("default");
        blocks.extend(self.filter(options).into_iter().map(|msg| {
            MessageRecord::new(msg.role, msg.content)
                .with_assistant_name(name)
                .format_message()
        }));
        blocks.join("\n\n")
    }

    /// Content of the most recent turn, optionally restricted to one
    /// assistant identity. `None` when nothing matches.
    pub fn latest(&self, assistant_name: Option<&str>) -> Option<&str> {
        self.messages
            .iter()
            .rev()
            .find(|m| assistant_name.map_or(true, |name| m.assistant_name() == name))
            .map(|m| m.content())
    }

    /// Export the store as a JSON string in stored order.
    ///
    /// The `system_prompt` key is omitted when no prompt is configured.
    pub fn to_json(&self) -> Result<String, ContextError> {
        let export = StoreExport {
            system_prompt: self.system_prompt.clone(),
            messages: self.messages.iter().map(MessageRecord::to_value).collect(),
        };
        serde_json::to_string(&export).map_err(|e| ContextError::Serialize(e.to_string()))
    }

    /// Replace the history from a serialized export.
    ///
    /// JSON syntax failures and a missing or non-array `messages` field are
    /// parse causes; each element then converts like
    /// [`MessageRecord::from_value`]. Any failure aborts the whole load with
    /// [`ContextError::Load`] and leaves the store unchanged. The window is
    /// not re-applied here.
    pub fn load_json(&mut self, input: &str) -> Result<(), ContextError> {
        let entries = parse_export(input).map_err(|e| ContextError::Load(Box::new(e)))?;
        self.load_records(&entries)
    }

    /// Replace the history from structured message entries.
    ///
    /// Same atomicity as [`ConversationStore::load_json`]: all entries
    /// convert, or the store is untouched.
    pub fn load_records(&mut self, entries: &[Value]) -> Result<(), ContextError> {
        let records = entries
            .iter()
            .map(MessageRecord::from_value)
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| ContextError::Load(Box::new(e)))?;
        debug!("replacing history with {} loaded turns", records.len());
        self.messages = records;
        Ok(())
    }

    /// Remove turns. `None` empties the store; a name removes exactly the
    /// turns with that assistant identity, keeping the rest in order.
    pub fn clear(&mut self, assistant_name: Option<&str>) {
        match assistant_name {
            Some(name) => self.messages.retain(|m| m.assistant_name() != name),
            None => self.messages.clear(),
        }
    }

    pub fn system_prompt(&self) -> Option<&str> {
        self.system_prompt.as_deref()
    }

    pub fn max_messages(&self) -> Option<usize> {
        self.max_messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

fn parse_export(input: &str) -> Result<Vec<Value>, ContextError> {
    let data: Value =
        serde_json::from_str(input).map_err(|e| ContextError::Parse(e.to_string()))?;
    match data.get("messages") {
        Some(Value::Array(entries)) => Ok(entries.clone()),
        _ => Err(ContextError::Parse(
            "`messages` is missing or not an array".to_string(),
        )),
    }
}

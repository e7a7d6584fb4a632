//! Records a chat exchange around a caller-supplied API call.
//!
//! [`with_context`] appends the outgoing user turn to a
//! [`ConversationStore`], awaits the call, pulls the assistant's text out of
//! the raw response and appends it as the incoming assistant turn. The call
//! itself is opaque: any future producing a JSON response in one of the two
//! shapes [`extract_content`] understands.

use std::future::Future;

use log::debug;
use serde_json::Value;
use thiserror::Error;

use context::ConversationStore;

/// Failures raised while wrapping a chat call.
#[derive(Debug, Error)]
pub enum ChatError {
    /// The prompt handed to the wrapped call was not a string.
    #[error("first argument must be a string prompt")]
    InvalidPrompt,
    /// The response matched neither known provider shape.
    #[error("unsupported API response format")]
    UnsupportedFormat,
    /// The wrapped call itself failed.
    #[error("chat call failed: {0}")]
    Call(String),
}

/// Pull the assistant's text out of a raw provider response.
///
/// Probes `content[0].text` first, then `choices[0].message.content`.
pub fn extract_content(response: &Value) -> Result<String, ChatError> {
    if let Some(text) = response.pointer("/content/0/text").and_then(Value::as_str) {
        return Ok(text.to_string());
    }
    if let Some(text) = response
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
    {
        return Ok(text.to_string());
    }
    Err(ChatError::UnsupportedFormat)
}

/// Run `call` with the user and assistant turns recorded around it.
///
/// The user turn is appended strictly before the call future is awaited and
/// the assistant turn strictly after it resolves, so conversation order
/// survives the suspension. A non-string `prompt` fails before anything is
/// recorded; an unrecognized response shape fails after the user turn was
/// already appended, matching what the API actually saw.
pub async fn with_context<F, Fut>(
    store: &mut ConversationStore,
    assistant_name: &str,
    prompt: &Value,
    call: F,
) -> Result<Value, ChatError>
where
    F: FnOnce(String) -> Fut,
    Fut: Future<Output = Result<Value, ChatError>>,
{
    let text = prompt.as_str().ok_or(ChatError::InvalidPrompt)?;
    store.add(text, "user", assistant_name);
    let response = call(text.to_string()).await?;
    let content = extract_content(&response)?;
    debug!("recorded exchange for assistant `{assistant_name}`");
    store.add(content, "assistant", assistant_name);
    Ok(response)
}

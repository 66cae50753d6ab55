//! Reply extraction: turns free-form model output into validated
//! [`ReplyMessage`]s.
//!
//! Precedence is fixed: a fenced code block wins, otherwise the whole
//! trimmed text is parsed. The parsed value may be the message list itself
//! or an object wrapping it under `messages`.

use std::sync::LazyLock;

use regex::Regex;
use serde_json::Value;

use therapist_core::ReplyMessage;

use crate::error::ChatError;

/// Upper bound on messages returned for a single request.
pub const MAX_REPLY_MESSAGES: usize = 3;

static FENCED_BLOCK: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```[\w-]*\s*(.*?)\s*```").expect("Invalid fenced block regex")
});

/// Locate the JSON payload inside raw model text.
pub fn extract_payload(text: &str) -> &str {
    match FENCED_BLOCK.captures(text).and_then(|c| c.get(1)) {
        Some(inner) => inner.as_str().trim(),
        None => text.trim(),
    }
}

/// Extract, parse, unwrap and validate the reply messages in `text`.
pub fn parse_reply_messages(text: &str) -> Result<Vec<ReplyMessage>, ChatError> {
    let payload = extract_payload(text);
    let parsed: Value =
        serde_json::from_str(payload).map_err(|e| ChatError::Extraction(e.to_string()))?;

    let list = match parsed {
        Value::Object(mut map) if map.contains_key("messages") => {
            map.remove("messages").unwrap_or(Value::Null)
        }
        other => other,
    };

    let items = match list {
        Value::Array(items) => items,
        other => {
            return Err(ChatError::InvalidReply(format!(
                "expected a list of messages, got {}",
                json_kind(&other)
            )))
        }
    };

    if items.is_empty() {
        return Err(ChatError::InvalidReply("no messages".to_string()));
    }

    let total = items.len();
    let mut messages = items
        .into_iter()
        .enumerate()
        .map(|(i, item)| validate_message(i, item))
        .collect::<Result<Vec<_>, _>>()?;

    if total > MAX_REPLY_MESSAGES {
        tracing::warn!(
            received = total,
            kept = MAX_REPLY_MESSAGES,
            "Model returned too many messages, truncating"
        );
        messages.truncate(MAX_REPLY_MESSAGES);
    }

    Ok(messages)
}

fn validate_message(index: usize, item: Value) -> Result<ReplyMessage, ChatError> {
    let message: ReplyMessage = serde_json::from_value(item)
        .map_err(|e| ChatError::InvalidReply(format!("message {}: {}", index, e)))?;

    if message.text.trim().is_empty() {
        return Err(ChatError::InvalidReply(format!(
            "message {}: text is empty",
            index
        )));
    }
    if !message.animation.is_model_selectable() {
        return Err(ChatError::InvalidReply(format!(
            "message {}: animation {:?} is not allowed",
            index, message.animation
        )));
    }
    Ok(message)
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

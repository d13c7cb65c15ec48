//! Discussion message content.

use serde_json::{Value, json};

/// Message content as callers hand it in.
///
/// Normalized once into the token list the discussions API stores.
#[derive(Debug, Clone, PartialEq)]
pub enum MessageContent {
    /// Plain text; becomes a single `text` token.
    Text(String),
    /// Already a token list; sent as-is.
    Tokens(Vec<Value>),
    /// A single structured token (mention, link, ...).
    Structured(Value),
}

impl MessageContent {
    /// The canonical token list.
    pub fn into_tokens(self) -> Vec<Value> {
        match self {
            MessageContent::Text(text) => vec![json!({ "type": "text", "value": text })],
            MessageContent::Tokens(tokens) => tokens,
            MessageContent::Structured(value) => vec![value],
        }
    }

    /// `{"content": [...]}` request body.
    pub fn into_body(self) -> Value {
        json!({ "content": self.into_tokens() })
    }
}

impl From<&str> for MessageContent {
    fn from(text: &str) -> Self {
        MessageContent::Text(text.to_string())
    }
}

impl From<String> for MessageContent {
    fn from(text: String) -> Self {
        MessageContent::Text(text)
    }
}

impl From<Vec<Value>> for MessageContent {
    fn from(tokens: Vec<Value>) -> Self {
        MessageContent::Tokens(tokens)
    }
}

impl From<Value> for MessageContent {
    fn from(value: Value) -> Self {
        match value {
            Value::String(text) => MessageContent::Text(text),
            Value::Array(tokens) => MessageContent::Tokens(tokens),
            other => MessageContent::Structured(other),
        }
    }
}

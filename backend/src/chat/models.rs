//! Chat data models
//!
//! Defines the record stored under each key of the `chats` namespace.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Role of a message sender
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Message from the user
    User,
    /// Message from the assistant/AI
    Assistant,
}

/// A single message in a chat
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    /// Role of the message sender
    pub role: MessageRole,
    /// Content of the message
    pub content: String,
    /// When the message was created (Unix timestamp)
    #[serde(default)]
    pub created_at: i64,
}

impl ChatMessage {
    /// Create a new message stamped with the current time
    pub fn new(role: MessageRole, content: impl Into<String>) -> Self {
        Self {
            role,
            content: content.into(),
            created_at: Utc::now().timestamp(),
        }
    }
}

/// A stored chat conversation
///
/// Records written by other producers may omit any field; missing fields
/// take their defaults when decoded. Fields this service does not know about
/// are kept in `extra` and written back untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Chat {
    /// Unique identifier (the storage key)
    #[serde(default)]
    pub id: String,
    /// Human-readable title, if one was set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Messages in chronological order
    #[serde(default)]
    pub messages: Vec<ChatMessage>,
    /// When the chat was created (Unix timestamp)
    #[serde(default)]
    pub created_at: i64,
    /// When the chat was last written (Unix timestamp)
    #[serde(default)]
    pub updated_at: i64,
    /// Any other fields found on the stored record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Chat {
    /// Create a new, empty chat
    pub fn new(id: impl Into<String>, title: Option<String>) -> Self {
        let now = Utc::now().timestamp();
        Self {
            id: id.into(),
            title,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
            extra: Map::new(),
        }
    }
}

/// Extract the `title` of a raw stored record
///
/// Only a string `title` counts; anything else (missing, null, a number)
/// yields `None`. The string is returned untouched.
pub fn title_of(record: &Value) -> Option<String> {
    record.get("title")?.as_str().map(str::to_string)
}

//! Message entities and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest message body accepted.
pub const MAX_MESSAGE_LENGTH: usize = 4000;

/// Largest page a listing may request.
pub const MAX_PAGE_SIZE: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    #[default]
    Text,
    Image,
    File,
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: String,
    pub channel_id: String,
    pub sender_id: String,
    pub content: String,
    pub kind: MessageKind,
    pub reply_to: Option<String>,
    pub edited: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One page of a message listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessagePage {
    pub messages: Vec<Message>,
    pub total: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageStats {
    pub total_messages: usize,
    pub unique_senders: usize,
    pub last_message_at: Option<DateTime<Utc>>,
}

/// Limit/offset window over a listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Page {
    pub limit: usize,
    pub offset: usize,
}

impl Page {
    pub fn new(limit: usize, offset: usize) -> Self {
        Self { limit, offset }
    }

    pub fn validate(&self) -> Option<String> {
        if self.limit == 0 || self.limit > MAX_PAGE_SIZE {
            return Some(format!("Limit must be between 1 and {}", MAX_PAGE_SIZE));
        }
        None
    }

    /// Slices `items` to this window and reports whether more remain.
    pub fn slice<T: Clone>(&self, items: &[T]) -> (Vec<T>, bool) {
        let window: Vec<T> = items.iter().skip(self.offset).take(self.limit).cloned().collect();
        let has_more = self.offset + window.len() < items.len();
        (window, has_more)
    }
}

impl Default for Page {
    fn default() -> Self {
        Self { limit: 20, offset: 0 }
    }
}

// == Requests ==

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendMessageRequest {
    pub channel_id: String,
    pub sender_id: String,
    pub content: String,
    #[serde(default)]
    pub kind: MessageKind,
    #[serde(default)]
    pub reply_to: Option<String>,
}

impl SendMessageRequest {
    pub fn validate(&self) -> Option<String> {
        if self.channel_id.trim().is_empty() {
            return Some("Channel ID is required".to_string());
        }
        if self.sender_id.trim().is_empty() {
            return Some("Sender ID is required".to_string());
        }
        validate_content(&self.content)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMessageRequest {
    pub message_id: String,
    pub user_id: String,
    pub content: String,
}

impl UpdateMessageRequest {
    pub fn validate(&self) -> Option<String> {
        if self.message_id.trim().is_empty() || self.user_id.trim().is_empty() {
            return Some("Message ID and user ID are required".to_string());
        }
        validate_content(&self.content)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeleteMessageRequest {
    pub message_id: String,
    pub user_id: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchMessagesRequest {
    pub query: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default = "default_search_limit")]
    pub limit: usize,
}

impl SearchMessagesRequest {
    pub fn validate(&self) -> Option<String> {
        if self.query.trim().is_empty() {
            return Some("Search query cannot be empty".to_string());
        }
        Page::new(self.limit, 0).validate()
    }
}

fn default_search_limit() -> usize {
    20
}

fn validate_content(content: &str) -> Option<String> {
    if content.trim().is_empty() {
        return Some("Message content cannot be empty".to_string());
    }
    if content.chars().count() > MAX_MESSAGE_LENGTH {
        return Some(format!(
            "Message exceeds maximum length of {} characters",
            MAX_MESSAGE_LENGTH
        ));
    }
    None
}

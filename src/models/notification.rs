//! Notification entities and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    Message,
    Invitation,
    Mention,
    #[default]
    System,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Notification {
    pub id: String,
    pub user_id: String,
    pub channel_id: Option<String>,
    pub title: String,
    pub message: String,
    pub kind: NotificationKind,
    pub read: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationPage {
    pub notifications: Vec<Notification>,
    pub total: usize,
    pub unread: usize,
    pub has_more: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationStats {
    pub user_id: String,
    pub total: usize,
    pub unread: usize,
}

// == Requests ==

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SendNotificationRequest {
    /// Recipient
    pub user_id: String,
    #[serde(default)]
    pub channel_id: Option<String>,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
}

impl SendNotificationRequest {
    pub fn validate(&self) -> Option<String> {
        if self.user_id.trim().is_empty() {
            return Some("User ID is required".to_string());
        }
        validate_text(&self.title, &self.message)
    }
}

/// Broadcast to every member of a channel.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelNotificationRequest {
    pub channel_id: String,
    pub sender_id: String,
    pub title: String,
    pub message: String,
    #[serde(default)]
    pub kind: NotificationKind,
}

impl ChannelNotificationRequest {
    pub fn validate(&self) -> Option<String> {
        if self.channel_id.trim().is_empty() || self.sender_id.trim().is_empty() {
            return Some("Channel ID and sender ID are required".to_string());
        }
        validate_text(&self.title, &self.message)
    }
}

/// Mark-as-read or delete, performed by `user_id` on their own notification.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NotificationActionRequest {
    pub notification_id: String,
    pub user_id: String,
}

impl NotificationActionRequest {
    pub fn validate(&self) -> Option<String> {
        if self.notification_id.trim().is_empty() || self.user_id.trim().is_empty() {
            return Some("Notification ID and user ID are required".to_string());
        }
        None
    }
}

fn validate_text(title: &str, message: &str) -> Option<String> {
    if title.trim().is_empty() {
        return Some("Notification title cannot be empty".to_string());
    }
    if message.trim().is_empty() {
        return Some("Notification message cannot be empty".to_string());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_send_request_validation() {
        let mut req = SendNotificationRequest {
            user_id: "u1".to_string(),
            title: "Hi".to_string(),
            message: "there".to_string(),
            ..Default::default()
        };
        assert!(req.validate().is_none());

        req.title.clear();
        assert_eq!(
            req.validate().as_deref(),
            Some("Notification title cannot be empty")
        );
    }

    #[test]
    fn test_kind_wire_format() {
        let kind: NotificationKind = serde_json::from_str(r#""mention""#).unwrap();
        assert_eq!(kind, NotificationKind::Mention);
    }
}

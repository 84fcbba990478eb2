//! Channel entities and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest channel name accepted.
pub const MAX_CHANNEL_NAME: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelKind {
    Direct,
    #[default]
    Group,
    Private,
}

/// A conversation space shared by its members.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub description: Option<String>,
    pub kind: ChannelKind,
    pub owner_id: String,
    pub members: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Channel {
    pub fn has_member(&self, user_id: &str) -> bool {
        self.owner_id == user_id || self.members.iter().any(|m| m == user_id)
    }
}

/// Partial update; None leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub kind: Option<ChannelKind>,
}

impl ChannelUpdate {
    pub fn is_empty(&self) -> bool {
        self.name.is_none() && self.description.is_none() && self.kind.is_none()
    }

    /// Applies the update in place and bumps `updated_at`.
    pub fn apply_to(&self, channel: &mut Channel) {
        if let Some(name) = &self.name {
            channel.name = name.clone();
        }
        if let Some(description) = &self.description {
            channel.description = Some(description.clone());
        }
        if let Some(kind) = self.kind {
            channel.kind = kind;
        }
        channel.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelStats {
    pub channel_id: String,
    pub member_count: usize,
    pub message_count: u64,
    pub last_activity_at: Option<DateTime<Utc>>,
}

// == Requests ==

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateChannelRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub kind: ChannelKind,
    pub owner_id: String,
    #[serde(default)]
    pub members: Vec<String>,
}

impl CreateChannelRequest {
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.owner_id.trim().is_empty() {
            return Some("Owner ID is required".to_string());
        }
        validate_name(&self.name)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateChannelRequest {
    pub channel_id: String,
    pub user_id: String,
    pub updates: ChannelUpdate,
}

impl UpdateChannelRequest {
    pub fn validate(&self) -> Option<String> {
        if self.channel_id.trim().is_empty() {
            return Some("Channel ID is required".to_string());
        }
        if self.user_id.trim().is_empty() {
            return Some("User ID is required".to_string());
        }
        if self.updates.is_empty() {
            return Some("No updates provided".to_string());
        }
        self.updates.name.as_deref().and_then(validate_name)
    }
}

/// Add or remove `member_id`, performed by `user_id`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberRequest {
    pub channel_id: String,
    pub user_id: String,
    pub member_id: String,
}

impl MemberRequest {
    pub fn validate(&self) -> Option<String> {
        if self.channel_id.trim().is_empty() {
            return Some("Channel ID is required".to_string());
        }
        if self.user_id.trim().is_empty() || self.member_id.trim().is_empty() {
            return Some("User ID and member ID are required".to_string());
        }
        None
    }
}

fn validate_name(name: &str) -> Option<String> {
    if name.trim().is_empty() {
        return Some("Channel name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_CHANNEL_NAME {
        return Some(format!(
            "Channel name exceeds maximum length of {} characters",
            MAX_CHANNEL_NAME
        ));
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_create_request_deserialize_defaults() {
        let json = r#"{"name": "Team", "ownerId": "u1"}"#;
        let req: CreateChannelRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.kind, ChannelKind::Group);
        assert!(req.members.is_empty());
        assert!(req.validate().is_none());
    }

    #[test]
    fn test_create_request_rejects_blank_name() {
        let req = CreateChannelRequest {
            name: "  ".to_string(),
            owner_id: "u1".to_string(),
            ..Default::default()
        };
        assert_eq!(req.validate().as_deref(), Some("Channel name cannot be empty"));
    }

    #[test]
    fn test_update_request_requires_changes() {
        let req = UpdateChannelRequest {
            channel_id: "c1".to_string(),
            user_id: "u1".to_string(),
            updates: ChannelUpdate::default(),
        };
        assert_eq!(req.validate().as_deref(), Some("No updates provided"));
    }

    #[test]
    fn test_apply_update() {
        let now = Utc::now();
        let mut channel = Channel {
            id: "c1".to_string(),
            name: "Team".to_string(),
            description: None,
            kind: ChannelKind::Group,
            owner_id: "u1".to_string(),
            members: vec!["u2".to_string()],
            created_at: now,
            updated_at: now,
        };
        let update = ChannelUpdate {
            name: Some("Team2".to_string()),
            ..Default::default()
        };

        update.apply_to(&mut channel);

        assert_eq!(channel.name, "Team2");
        assert!(channel.updated_at >= now);
        assert!(channel.has_member("u1"));
        assert!(channel.has_member("u2"));
        assert!(!channel.has_member("u3"));
    }
}

//! User entities and requests.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Longest display name accepted.
pub const MAX_DISPLAY_NAME: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    Away,
    Busy,
    #[default]
    Offline,
}

impl std::str::FromStr for UserStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "online" => Ok(UserStatus::Online),
            "away" => Ok(UserStatus::Away),
            "busy" => Ok(UserStatus::Busy),
            "offline" => Ok(UserStatus::Offline),
            other => Err(format!("Invalid user status: {}", other)),
        }
    }
}

/// Profile of one user; `partner_id` links the two halves of a couple.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub id: String,
    pub display_name: String,
    pub email: String,
    pub avatar_url: Option<String>,
    pub status: UserStatus,
    pub partner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileUpdate {
    pub display_name: Option<String>,
    pub avatar_url: Option<String>,
    pub status: Option<UserStatus>,
    pub partner_id: Option<String>,
}

impl ProfileUpdate {
    pub fn is_empty(&self) -> bool {
        self.display_name.is_none()
            && self.avatar_url.is_none()
            && self.status.is_none()
            && self.partner_id.is_none()
    }

    pub fn apply_to(&self, profile: &mut UserProfile) {
        if let Some(name) = &self.display_name {
            profile.display_name = name.clone();
        }
        if let Some(avatar) = &self.avatar_url {
            profile.avatar_url = Some(avatar.clone());
        }
        if let Some(status) = self.status {
            profile.status = status;
        }
        if let Some(partner) = &self.partner_id {
            profile.partner_id = Some(partner.clone());
        }
        profile.updated_at = Utc::now();
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub user_id: String,
    pub channel_count: usize,
    pub message_count: usize,
    pub last_active_at: Option<DateTime<Utc>>,
}

/// Optional listing filters. Serialized into the listing's cache key.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserFilters {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<UserStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub has_partner: Option<bool>,
}

impl UserFilters {
    pub fn matches(&self, profile: &UserProfile) -> bool {
        self.status.map_or(true, |s| s == profile.status)
            && self
                .has_partner
                .map_or(true, |p| p == profile.partner_id.is_some())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserPage {
    pub users: Vec<UserProfile>,
    pub total: usize,
    pub page: usize,
    pub total_pages: usize,
}

// == Requests ==

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub user_id: String,
    pub updates: ProfileUpdate,
}

impl UpdateProfileRequest {
    pub fn validate(&self) -> Option<String> {
        if self.user_id.trim().is_empty() {
            return Some("User ID is required".to_string());
        }
        if self.updates.is_empty() {
            return Some("No updates provided".to_string());
        }
        if let Some(name) = &self.updates.display_name {
            if name.trim().is_empty() {
                return Some("Display name cannot be empty".to_string());
            }
            if name.chars().count() > MAX_DISPLAY_NAME {
                return Some(format!(
                    "Display name exceeds maximum length of {} characters",
                    MAX_DISPLAY_NAME
                ));
            }
        }
        None
    }
}

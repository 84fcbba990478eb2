//! File entities and requests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Upload metadata; the bytes themselves travel through the collaborator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileUpload {
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRecord {
    pub id: String,
    pub file_name: String,
    pub mime_type: String,
    pub size_bytes: u64,
    pub url: String,
    pub channel_id: String,
    pub sender_id: String,
    pub uploaded_at: DateTime<Utc>,
}

/// A time-limited link to a stored file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDownload {
    pub file_id: String,
    pub file_name: String,
    pub mime_type: String,
    pub download_url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileValidation {
    pub is_valid: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl FileValidation {
    pub fn valid() -> Self {
        Self {
            is_valid: true,
            error: None,
        }
    }

    pub fn invalid(reason: impl Into<String>) -> Self {
        Self {
            is_valid: false,
            error: Some(reason.into()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStats {
    pub total_files: usize,
    pub total_bytes: u64,
    pub by_mime_type: BTreeMap<String, usize>,
}

// == Requests ==

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadFileRequest {
    pub channel_id: String,
    pub sender_id: String,
    pub file: FileUpload,
}

impl UploadFileRequest {
    pub fn validate(&self) -> Option<String> {
        if self.channel_id.trim().is_empty() || self.sender_id.trim().is_empty() {
            return Some("Channel ID and sender ID are required".to_string());
        }
        if self.file.file_name.trim().is_empty() {
            return Some("File name is required".to_string());
        }
        None
    }
}

/// Scope for file statistics; None widens to every channel or user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileStatsRequest {
    #[serde(default)]
    pub channel_id: Option<String>,
    #[serde(default)]
    pub user_id: Option<String>,
}

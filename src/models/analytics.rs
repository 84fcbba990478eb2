//! Analytics entities and requests.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Inclusive time window.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeRange {
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    pub fn validate(&self) -> Option<String> {
        (self.start > self.end).then(|| "Start date must be before end date".to_string())
    }

    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        self.start <= at && at <= self.end
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackedEvent {
    pub event_id: String,
    pub user_id: String,
    pub event_type: String,
    #[serde(default)]
    pub properties: Value,
    pub session_id: Option<String>,
    pub recorded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalyticsReport {
    pub range: TimeRange,
    pub total_events: usize,
    pub unique_users: usize,
    pub events_by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserBehavior {
    pub user_id: String,
    pub range: TimeRange,
    pub event_count: usize,
    pub session_count: usize,
    pub events_by_type: BTreeMap<String, usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivitySnapshot {
    pub active_users: usize,
    pub recent_events: usize,
    pub captured_at: DateTime<Utc>,
}

/// Ordered event types a user went through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserJourney {
    pub user_id: String,
    pub steps: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChurnPrediction {
    pub user_id: String,
    /// 0.0 (active) to 1.0 (gone)
    pub risk_score: f64,
    pub days_since_last_event: Option<i64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    Json,
    Csv,
}

// == Requests ==

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackEventRequest {
    pub user_id: String,
    pub event_type: String,
    #[serde(default)]
    pub properties: Value,
    #[serde(default)]
    pub session_id: Option<String>,
}

impl TrackEventRequest {
    pub fn validate(&self) -> Option<String> {
        if self.user_id.trim().is_empty() {
            return Some("User ID is required".to_string());
        }
        if self.event_type.trim().is_empty() {
            return Some("Event type is required".to_string());
        }
        None
    }
}

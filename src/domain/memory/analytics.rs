use std::collections::{BTreeMap, HashSet};

use async_trait::async_trait;
use chrono::{Duration, Utc};

use super::InMemoryDomain;
use crate::domain::AnalyticsRepository;
use crate::error::ServiceResult;
use crate::models::{
    ActivitySnapshot, AnalyticsReport, ChurnPrediction, ExportFormat, TimeRange,
    TrackEventRequest, TrackedEvent, UserBehavior, UserJourney,
};

/// Window counted as "real time".
const ACTIVITY_WINDOW_MINUTES: i64 = 5;

/// Days of silence after which churn risk saturates.
const CHURN_HORIZON_DAYS: i64 = 30;

fn count_by_type<'a>(events: impl Iterator<Item = &'a TrackedEvent>) -> BTreeMap<String, usize> {
    let mut counts = BTreeMap::new();
    for event in events {
        *counts.entry(event.event_type.clone()).or_insert(0) += 1;
    }
    counts
}

fn csv_field(value: &str) -> String {
    if value.contains(|c: char| matches!(c, ',' | '"' | '\n')) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

#[async_trait]
impl AnalyticsRepository for InMemoryDomain {
    async fn record_event(&self, request: &TrackEventRequest) -> ServiceResult<TrackedEvent> {
        self.ensure_available()?;
        let event = TrackedEvent {
            event_id: self.next_id("evt"),
            user_id: request.user_id.clone(),
            event_type: request.event_type.clone(),
            properties: request.properties.clone(),
            session_id: request.session_id.clone(),
            recorded_at: Utc::now(),
        };
        self.tables.write().await.events.push(event.clone());
        Ok(event)
    }

    async fn report(&self, range: &TimeRange) -> ServiceResult<AnalyticsReport> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let in_range: Vec<&TrackedEvent> = tables
            .events
            .iter()
            .filter(|e| range.contains(e.recorded_at))
            .collect();
        let users: HashSet<&str> = in_range.iter().map(|e| e.user_id.as_str()).collect();

        Ok(AnalyticsReport {
            range: *range,
            total_events: in_range.len(),
            unique_users: users.len(),
            events_by_type: count_by_type(in_range.into_iter()),
        })
    }

    async fn user_behavior(&self, user_id: &str, range: &TimeRange) -> ServiceResult<UserBehavior> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        let events: Vec<&TrackedEvent> = tables
            .events
            .iter()
            .filter(|e| e.user_id == user_id && range.contains(e.recorded_at))
            .collect();
        let sessions: HashSet<&str> = events
            .iter()
            .filter_map(|e| e.session_id.as_deref())
            .collect();

        Ok(UserBehavior {
            user_id: user_id.to_string(),
            range: *range,
            event_count: events.len(),
            session_count: sessions.len(),
            events_by_type: count_by_type(events.into_iter()),
        })
    }

    async fn real_time_activity(&self) -> ServiceResult<ActivitySnapshot> {
        self.begin_read()?;
        let now = Utc::now();
        let since = now - Duration::minutes(ACTIVITY_WINDOW_MINUTES);
        let tables = self.tables.read().await;
        let recent: Vec<&TrackedEvent> = tables
            .events
            .iter()
            .filter(|e| e.recorded_at >= since)
            .collect();
        let users: HashSet<&str> = recent.iter().map(|e| e.user_id.as_str()).collect();

        Ok(ActivitySnapshot {
            active_users: users.len(),
            recent_events: recent.len(),
            captured_at: now,
        })
    }

    async fn user_journey(&self, user_id: &str) -> ServiceResult<UserJourney> {
        self.begin_read()?;
        let steps = self
            .tables
            .read()
            .await
            .events
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.event_type.clone())
            .collect();
        Ok(UserJourney {
            user_id: user_id.to_string(),
            steps,
        })
    }

    async fn churn_prediction(&self, user_id: &str) -> ServiceResult<ChurnPrediction> {
        self.begin_read()?;
        let last_seen = self
            .tables
            .read()
            .await
            .events
            .iter()
            .filter(|e| e.user_id == user_id)
            .map(|e| e.recorded_at)
            .max();
        let days = last_seen.map(|at| (Utc::now() - at).num_days());
        let risk_score = match days {
            Some(d) => (d.clamp(0, CHURN_HORIZON_DAYS) as f64) / CHURN_HORIZON_DAYS as f64,
            None => 1.0,
        };

        Ok(ChurnPrediction {
            user_id: user_id.to_string(),
            risk_score,
            days_since_last_event: days,
        })
    }

    async fn export_events(&self, format: ExportFormat) -> ServiceResult<String> {
        self.begin_read()?;
        let tables = self.tables.read().await;
        match format {
            ExportFormat::Json => Ok(serde_json::to_string(&tables.events)
                .map_err(|e| anyhow::anyhow!("export failed: {}", e))?),
            ExportFormat::Csv => {
                let mut out = String::from("eventId,userId,eventType,sessionId,recordedAt\n");
                for event in &tables.events {
                    out.push_str(&format!(
                        "{},{},{},{},{}\n",
                        csv_field(&event.event_id),
                        csv_field(&event.user_id),
                        csv_field(&event.event_type),
                        csv_field(event.session_id.as_deref().unwrap_or("")),
                        event.recorded_at.to_rfc3339(),
                    ));
                }
                Ok(out)
            }
        }
    }
}

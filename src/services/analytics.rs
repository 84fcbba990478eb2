//! Analytics use cases
//!
//! Key layout:
//! - `analytics:report:{start}:{end}`
//! - `analytics:behavior:{user}:{start}:{end}`
//! - `analytics:realtime`
//! - `analytics:journey:{user}`
//! - `analytics:churn:{user}`
//!
//! Range bounds are rendered as unix seconds. Reports are left to expire on
//! their own TTL; per-user views are dropped as soon as that user tracks
//! something.

use std::sync::Arc;

use tracing::{info, warn};

use crate::domain::AnalyticsRepository;
use crate::error::ServiceError;
use crate::models::{
    ActivitySnapshot, AnalyticsReport, ChurnPrediction, ExportFormat, ReadResponse,
    ServiceCacheStats, TimeRange, TrackEventRequest, TrackedEvent, UserBehavior, UserJourney,
    WriteResponse,
};
use crate::orchestrator::{CacheKey, CacheOrchestrator, DataCategory, InvalidationMap};
use crate::services::{check, read_rejected, write_response};

pub const NAMESPACE: &str = "analytics";
const SERVICE: &str = "AnalyticsUseCaseService";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalyticsMutation {
    Track,
    /// Explicit per-user flush, no data change.
    InvalidateUser,
}

pub static ANALYTICS_INVALIDATIONS: InvalidationMap<AnalyticsMutation> = InvalidationMap::new(&[
    (
        AnalyticsMutation::Track,
        &[
            "analytics:behavior:{user}",
            "analytics:realtime",
            "analytics:journey:{user}",
            "analytics:churn:{user}",
        ],
    ),
    (
        AnalyticsMutation::InvalidateUser,
        &[
            "analytics:behavior:{user}",
            "analytics:journey:{user}",
            "analytics:churn:{user}",
        ],
    ),
]);

pub struct AnalyticsUseCaseService {
    cache: CacheOrchestrator,
    analytics: Arc<dyn AnalyticsRepository>,
}

impl AnalyticsUseCaseService {
    pub fn new(cache: CacheOrchestrator, analytics: Arc<dyn AnalyticsRepository>) -> Self {
        Self { cache, analytics }
    }

    // == Writes ==

    pub async fn track_event(&self, request: &TrackEventRequest) -> WriteResponse<TrackedEvent> {
        let result = async {
            check(request.validate())?;
            let event = self.analytics.record_event(request).await?;
            self.invalidate(AnalyticsMutation::Track, &event.user_id)
                .await;
            Ok::<_, ServiceError>(event)
        }
        .await;
        write_response("track_event", result)
    }

    /// Drops every cached per-user view for `user_id`.
    pub async fn invalidate_user_cache(&self, user_id: &str) {
        if user_id.trim().is_empty() {
            warn!("Skipping analytics invalidation for empty user id");
            return;
        }
        self.invalidate(AnalyticsMutation::InvalidateUser, user_id)
            .await;
        info!("Analytics cache invalidated for user {}", user_id);
    }

    // == Reads ==

    pub async fn generate_analytics_report(
        &self,
        range: &TimeRange,
    ) -> ReadResponse<AnalyticsReport> {
        if let Err(e) = check(range.validate()) {
            return read_rejected("generate_analytics_report", e);
        }
        let key = CacheKey::new(NAMESPACE)
            .with("report")
            .with(range.start.timestamp())
            .with(range.end.timestamp());
        self.cache
            .read_through(&key, DataCategory::AnalyticsReport, || {
                self.analytics.report(range)
            })
            .await
    }

    pub async fn analyze_user_behavior(
        &self,
        user_id: &str,
        range: &TimeRange,
    ) -> ReadResponse<UserBehavior> {
        if user_id.trim().is_empty() {
            return read_rejected("analyze_user_behavior", missing_user());
        }
        if let Err(e) = check(range.validate()) {
            return read_rejected("analyze_user_behavior", e);
        }
        let key = CacheKey::new(NAMESPACE)
            .with("behavior")
            .with(user_id)
            .with(range.start.timestamp())
            .with(range.end.timestamp());
        self.cache
            .read_through(&key, DataCategory::UserProfile, || {
                self.analytics.user_behavior(user_id, range)
            })
            .await
    }

    /// Cached briefly so bursts of dashboard refreshes share one snapshot.
    pub async fn get_real_time_activity(&self) -> ReadResponse<ActivitySnapshot> {
        let key = CacheKey::new(NAMESPACE).with("realtime");
        self.cache
            .read_through(&key, DataCategory::Temporary, || {
                self.analytics.real_time_activity()
            })
            .await
    }

    pub async fn analyze_user_journey(&self, user_id: &str) -> ReadResponse<UserJourney> {
        if user_id.trim().is_empty() {
            return read_rejected("analyze_user_journey", missing_user());
        }
        let key = CacheKey::new(NAMESPACE).with("journey").with(user_id);
        self.cache
            .read_through(&key, DataCategory::UserProfile, || {
                self.analytics.user_journey(user_id)
            })
            .await
    }

    pub async fn predict_user_churn(&self, user_id: &str) -> ReadResponse<ChurnPrediction> {
        if user_id.trim().is_empty() {
            return read_rejected("predict_user_churn", missing_user());
        }
        let key = CacheKey::new(NAMESPACE).with("churn").with(user_id);
        self.cache
            .read_through(&key, DataCategory::UserProfile, || {
                self.analytics.churn_prediction(user_id)
            })
            .await
    }

    /// Uncached; exports always reflect the current event log.
    pub async fn export_data(&self, format: ExportFormat) -> ReadResponse<String> {
        match self.analytics.export_events(format).await {
            Ok(body) => ReadResponse::fresh(body),
            Err(e) => read_rejected("export_data", e),
        }
    }

    pub async fn get_analytics_cache_stats(&self) -> ServiceCacheStats {
        ServiceCacheStats::new(SERVICE, NAMESPACE, self.cache.get_cache_stats().await)
    }

    async fn invalidate(&self, mutation: AnalyticsMutation, user_id: &str) {
        let patterns = ANALYTICS_INVALIDATIONS.patterns_for(mutation, &[("user", user_id)]);
        self.cache.invalidate_patterns(&patterns).await;
    }
}

fn missing_user() -> ServiceError {
    ServiceError::Validation("User ID is required".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MemoryBackend;
    use crate::domain::InMemoryDomain;
    use chrono::{Duration, Utc};

    fn setup() -> (AnalyticsUseCaseService, Arc<InMemoryDomain>) {
        let domain = Arc::new(InMemoryDomain::new());
        let service = AnalyticsUseCaseService::new(
            CacheOrchestrator::new(MemoryBackend::new(100)),
            domain.clone(),
        );
        (service, domain)
    }

    fn track(user: &str, event_type: &str) -> TrackEventRequest {
        TrackEventRequest {
            user_id: user.to_string(),
            event_type: event_type.to_string(),
            ..Default::default()
        }
    }

    fn around_now() -> TimeRange {
        let now = Utc::now();
        TimeRange::new(now - Duration::hours(1), now + Duration::hours(1))
    }

    #[tokio::test]
    async fn test_track_invalidates_that_users_views() {
        let (service, _) = setup();
        let range = around_now();
        service.analyze_user_behavior("u1", &range).await;
        service.analyze_user_journey("u1").await;
        service.analyze_user_journey("u2").await;
        service.get_real_time_activity().await;

        assert!(service.track_event(&track("u1", "login")).await.success);

        let behavior = service.analyze_user_behavior("u1", &range).await;
        assert!(!behavior.cached);
        assert_eq!(behavior.payload.unwrap().event_count, 1);
        assert!(!service.analyze_user_journey("u1").await.cached);
        assert!(service.analyze_user_journey("u2").await.cached);
        let activity = service.get_real_time_activity().await;
        assert!(!activity.cached);
        assert_eq!(activity.payload.unwrap().recent_events, 1);
    }

    #[tokio::test]
    async fn test_report_cached_until_ttl() {
        let (service, domain) = setup();
        let range = around_now();
        service.track_event(&track("u1", "login")).await;

        let first = service.generate_analytics_report(&range).await;
        service.track_event(&track("u2", "login")).await;
        let second = service.generate_analytics_report(&range).await;

        assert!(!first.cached);
        assert!(second.cached);
        assert_eq!(second.payload.unwrap().total_events, 1);
        assert_eq!(domain.read_count(), 1);
    }

    #[tokio::test]
    async fn test_inverted_range_rejected() {
        let (service, domain) = setup();
        let now = Utc::now();

        let resp = service
            .generate_analytics_report(&TimeRange::new(now, now - Duration::days(1)))
            .await;

        assert_eq!(resp.error.as_deref(), Some("Start date must be before end date"));
        assert_eq!(domain.read_count(), 0);
    }

    #[tokio::test]
    async fn test_track_validation() {
        let (service, _) = setup();

        let resp = service.track_event(&track("u1", " ")).await;

        assert!(!resp.success);
        assert_eq!(resp.error.as_deref(), Some("Event type is required"));
    }

    #[tokio::test]
    async fn test_invalidate_user_cache() {
        let (service, _) = setup();
        service.predict_user_churn("u1").await;
        service.predict_user_churn("u2").await;

        service.invalidate_user_cache("u1").await;

        let stats = service.get_analytics_cache_stats().await;
        assert_eq!(stats.snapshot.keys, vec!["analytics:churn:u2"]);
        let churn = service.predict_user_churn("u1").await;
        assert!(!churn.cached);
        assert_eq!(churn.payload.unwrap().risk_score, 1.0);
    }

    #[tokio::test]
    async fn test_export_not_cached() {
        let (service, _) = setup();
        service.track_event(&track("u1", "login")).await;

        let csv = service.export_data(ExportFormat::Csv).await;

        assert!(!csv.cached);
        assert!(csv.payload.unwrap().contains(",u1,login,"));
        assert_eq!(service.get_analytics_cache_stats().await.snapshot.total_keys, 0);
    }
}

//! Response envelopes returned by the use-case services
//!
//! Every read and write produces one of these; failures are data, not errors.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::cache::StoreMetrics;
use crate::error::ServiceError;

// == Read Response ==
/// Envelope for a cache-aside read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResponse<T> {
    /// The fetched value, None on failure
    pub payload: Option<T>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// True when served from the cache
    #[serde(default)]
    pub cached: bool,
    /// When the collaborator produced the payload
    pub fetched_at: DateTime<Utc>,
}

impl<T> ReadResponse<T> {
    /// Freshly fetched payload.
    pub fn fresh(payload: T) -> Self {
        Self {
            payload: Some(payload),
            success: true,
            error: None,
            cached: false,
            fetched_at: Utc::now(),
        }
    }

    /// Failed read carrying the rendered error.
    pub fn failed(error: &ServiceError) -> Self {
        Self {
            payload: None,
            success: false,
            error: Some(error.to_string()),
            cached: false,
            fetched_at: Utc::now(),
        }
    }

    /// Marks an envelope as served from the cache.
    pub fn into_cached(mut self) -> Self {
        self.cached = true;
        self
    }
}

// == Write Response ==
/// Envelope for a mutation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WriteResponse<T> {
    /// Entity as it stands after the mutation, when the collaborator returns one
    pub payload: Option<T>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub completed_at: DateTime<Utc>,
}

impl<T> WriteResponse<T> {
    pub fn ok(payload: T) -> Self {
        Self {
            payload: Some(payload),
            success: true,
            error: None,
            completed_at: Utc::now(),
        }
    }

    pub fn failed(error: &ServiceError) -> Self {
        Self {
            payload: None,
            success: false,
            error: Some(error.to_string()),
            completed_at: Utc::now(),
        }
    }
}

impl WriteResponse<()> {
    /// Successful mutation with nothing to return.
    pub fn done() -> Self {
        Self::ok(())
    }
}

// == Cache Stats Snapshot ==
/// Point-in-time view of one orchestrator's store, recomputed on demand.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CacheStatsSnapshot {
    pub total_keys: usize,
    pub keys: Vec<String>,
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub hit_rate: f64,
}

impl CacheStatsSnapshot {
    pub fn new(keys: Vec<String>, metrics: StoreMetrics) -> Self {
        Self {
            total_keys: keys.len(),
            keys,
            hits: metrics.hits,
            misses: metrics.misses,
            evictions: metrics.evictions,
            expirations: metrics.expirations,
            hit_rate: metrics.hit_rate(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new(), StoreMetrics::default())
    }

    /// Keys belonging to `namespace` (the segment before the first `:`).
    pub fn namespace_keys(&self, namespace: &str) -> usize {
        self.keys
            .iter()
            .filter(|key| key.split(':').next() == Some(namespace))
            .count()
    }
}

// == Service Cache Stats ==
/// Snapshot plus the size of one service's own namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCacheStats {
    pub service: String,
    pub namespace_keys: usize,
    #[serde(flatten)]
    pub snapshot: CacheStatsSnapshot,
    pub timestamp: DateTime<Utc>,
}

impl ServiceCacheStats {
    pub fn new(service: &str, namespace: &str, snapshot: CacheStatsSnapshot) -> Self {
        Self {
            service: service.to_string(),
            namespace_keys: snapshot.namespace_keys(namespace),
            snapshot,
            timestamp: Utc::now(),
        }
    }
}

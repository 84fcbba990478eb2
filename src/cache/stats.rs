//! Store Metrics Module
//!
//! Counters kept by each expiring store: hits, misses, evictions, expirations.

use serde::{Deserialize, Serialize};

// == Store Metrics ==
/// Running counters for one store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreMetrics {
    /// Reads that returned a fresh value
    pub hits: u64,
    /// Reads that found nothing or found a stale entry
    pub misses: u64,
    /// Entries dropped to stay under the capacity bound
    pub evictions: u64,
    /// Stale entries reclaimed by lazy reads, enumeration, or the sweep
    pub expirations: u64,
}

impl StoreMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// hits / (hits + misses), or 0.0 before any read.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    pub fn record_hit(&mut self) {
        self.hits += 1;
    }

    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    pub fn record_eviction(&mut self) {
        self.evictions += 1;
    }

    pub fn record_expirations(&mut self, count: usize) {
        self.expirations += count as u64;
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_start_at_zero() {
        let metrics = StoreMetrics::new();
        assert_eq!(metrics, StoreMetrics::default());
        assert_eq!(metrics.hit_rate(), 0.0);
    }

    #[test]
    fn test_hit_rate_mixed() {
        let mut metrics = StoreMetrics::new();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_hit();
        metrics.record_miss();
        assert_eq!(metrics.hit_rate(), 0.75);
    }

    #[test]
    fn test_counters_accumulate() {
        let mut metrics = StoreMetrics::new();
        metrics.record_eviction();
        metrics.record_expirations(3);
        metrics.record_expirations(0);
        assert_eq!(metrics.evictions, 1);
        assert_eq!(metrics.expirations, 3);
    }

    #[test]
    fn test_serializes_camel_case() {
        let json = serde_json::to_value(StoreMetrics::new()).unwrap();
        assert!(json.get("expirations").is_some());
        assert!(json.get("hits").is_some());
    }
}

//! Configuration Module
//!
//! Handles loading cache sizing and sweep settings from environment variables.
//! TTLs per data category are not configurable here; see `orchestrator::ttl`.

use std::env;
use std::time::Duration;

/// Cache layer configuration.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Maximum number of entries each store may hold before LRU eviction
    pub max_entries: usize,
    /// Background sweep interval in seconds (0 disables the sweep)
    pub sweep_interval: u64,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `CACHE_MAX_ENTRIES` - Maximum entries per store (default: 10000)
    /// - `CACHE_SWEEP_INTERVAL` - Sweep frequency in seconds (default: 60)
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            max_entries: env::var("CACHE_MAX_ENTRIES")
                .ok()
                .and_then(|v| v.parse().ok())
                .filter(|v: &usize| *v > 0)
                .unwrap_or(defaults.max_entries),
            sweep_interval: env::var("CACHE_SWEEP_INTERVAL")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.sweep_interval),
        }
    }

    /// Sweep period, or None when the sweep is disabled.
    pub fn sweep_period(&self) -> Option<Duration> {
        (self.sweep_interval > 0).then(|| Duration::from_secs(self.sweep_interval))
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_entries: 10_000,
            sweep_interval: 60,
        }
    }
}

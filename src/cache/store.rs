//! Expiring Store Module
//!
//! In-memory key/value map with per-entry TTL, lazy expiry on access, and a
//! capacity bound enforced by LRU eviction.

use std::collections::HashMap;

use crate::cache::entry::current_timestamp_ms;
use crate::cache::{CacheEntry, LruTracker, StoreMetrics, MAX_KEY_LENGTH};
use crate::error::{CacheError, CacheResult};

// == Expiring Store ==
/// Key/value storage where absence is a normal result, never an error.
#[derive(Debug)]
pub struct ExpiringStore<V> {
    entries: HashMap<String, CacheEntry<V>>,
    lru: LruTracker,
    metrics: StoreMetrics,
    max_entries: usize,
}

impl<V: Clone> ExpiringStore<V> {
    // == Constructor ==
    /// Creates a store that holds at most `max_entries` entries.
    pub fn new(max_entries: usize) -> Self {
        Self {
            entries: HashMap::new(),
            lru: LruTracker::new(),
            metrics: StoreMetrics::new(),
            max_entries: max_entries.max(1),
        }
    }

    // == Set ==
    /// Stores a value, replacing any existing entry for the key.
    ///
    /// `ttl_seconds = None` keeps the entry until it is deleted or cleared.
    /// When a new key would exceed capacity, expired entries are reclaimed
    /// first and the least recently used entry is evicted only if needed.
    pub fn set(&mut self, key: &str, value: V, ttl_seconds: Option<u64>) -> CacheResult<()> {
        if key.is_empty() {
            return Err(CacheError::InvalidKey("key cannot be empty".to_string()));
        }
        if key.len() > MAX_KEY_LENGTH {
            return Err(CacheError::InvalidKey(format!(
                "key exceeds maximum length of {} bytes",
                MAX_KEY_LENGTH
            )));
        }

        if !self.entries.contains_key(key) && self.entries.len() >= self.max_entries {
            self.purge_expired();
            if self.entries.len() >= self.max_entries {
                if let Some(victim) = self.lru.evict_oldest() {
                    self.entries.remove(&victim);
                    self.metrics.record_eviction();
                }
            }
        }

        self.entries
            .insert(key.to_string(), CacheEntry::new(value, ttl_seconds));
        self.lru.touch(key);
        Ok(())
    }

    // == Get ==
    /// Returns a clone of the value if present and fresh.
    ///
    /// A stale entry is removed on the way out and reported as absent.
    pub fn get(&mut self, key: &str) -> Option<V> {
        let now = current_timestamp_ms();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => {
                let value = entry.value.clone();
                self.metrics.record_hit();
                self.lru.touch(key);
                Some(value)
            }
            Some(_) => {
                self.remove_entry(key);
                self.metrics.record_expirations(1);
                self.metrics.record_miss();
                None
            }
            None => {
                self.metrics.record_miss();
                None
            }
        }
    }

    // == Has ==
    /// Same freshness check as `get`, without cloning the value or touching
    /// recency and hit/miss counters.
    pub fn has(&mut self, key: &str) -> bool {
        let now = current_timestamp_ms();
        match self.entries.get(key) {
            Some(entry) if !entry.is_expired_at(now) => true,
            Some(_) => {
                self.remove_entry(key);
                self.metrics.record_expirations(1);
                false
            }
            None => false,
        }
    }

    // == Delete ==
    /// Removes an entry. Returns whether anything was removed; deleting an
    /// absent key is a no-op.
    pub fn delete(&mut self, key: &str) -> bool {
        self.remove_entry(key)
    }

    // == Clear ==
    /// Removes every entry. Counters are kept.
    pub fn clear(&mut self) {
        self.entries.clear();
        self.lru.clear();
    }

    // == Keys ==
    /// Returns every key that is fresh right now, pruning stale ones.
    pub fn keys(&mut self) -> Vec<String> {
        self.purge_expired();
        let mut keys: Vec<String> = self.entries.keys().cloned().collect();
        keys.sort();
        keys
    }

    // == Purge Expired ==
    /// Removes all stale entries and returns how many were removed.
    pub fn purge_expired(&mut self) -> usize {
        let now = current_timestamp_ms();
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|(_, entry)| entry.is_expired_at(now))
            .map(|(key, _)| key.clone())
            .collect();

        for key in &stale {
            self.remove_entry(key);
        }
        self.metrics.record_expirations(stale.len());
        stale.len()
    }

    /// Current counters.
    pub fn metrics(&self) -> StoreMetrics {
        self.metrics
    }

    /// Number of entries held, including stale ones not yet reclaimed.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.max_entries
    }

    fn remove_entry(&mut self, key: &str) -> bool {
        self.lru.remove(key);
        self.entries.remove(key).is_some()
    }
}

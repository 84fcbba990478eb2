//! LRU Tracker Module
//!
//! Recency ordering used to pick an eviction victim when a store is full.

use std::collections::{BTreeMap, HashMap};

// == LRU Tracker ==
/// Tracks key recency with a monotonically increasing access tick.
///
/// `ticks` maps key -> last tick, `order` maps tick -> key, so the smallest
/// tick in `order` is always the least recently used key.
#[derive(Debug, Default)]
pub struct LruTracker {
    ticks: HashMap<String, u64>,
    order: BTreeMap<u64, String>,
    clock: u64,
}

impl LruTracker {
    // == Constructor ==
    pub fn new() -> Self {
        Self::default()
    }

    // == Touch ==
    /// Marks a key as most recently used, inserting it if unknown.
    pub fn touch(&mut self, key: &str) {
        self.clock += 1;
        let tick = self.clock;
        if let Some(previous) = self.ticks.insert(key.to_string(), tick) {
            self.order.remove(&previous);
        }
        self.order.insert(tick, key.to_string());
    }

    // == Remove ==
    /// Stops tracking a key. Unknown keys are ignored.
    pub fn remove(&mut self, key: &str) {
        if let Some(tick) = self.ticks.remove(key) {
            self.order.remove(&tick);
        }
    }

    // == Evict Oldest ==
    /// Removes and returns the least recently used key.
    pub fn evict_oldest(&mut self) -> Option<String> {
        let (_, key) = self.order.pop_first()?;
        self.ticks.remove(&key);
        Some(key)
    }

    /// Returns the least recently used key without removing it.
    pub fn peek_oldest(&self) -> Option<&str> {
        self.order.values().next().map(String::as_str)
    }

    /// Forgets every key.
    pub fn clear(&mut self) {
        self.ticks.clear();
        self.order.clear();
    }

    pub fn len(&self) -> usize {
        self.ticks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ticks.is_empty()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.ticks.contains_key(key)
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lru_new() {
        let lru = LruTracker::new();
        assert!(lru.is_empty());
        assert_eq!(lru.peek_oldest(), None);
    }

    #[test]
    fn test_lru_insertion_order() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");
        lru.touch("c");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.peek_oldest(), Some("a"));
    }

    #[test]
    fn test_lru_touch_refreshes_key() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");
        lru.touch("c");
        lru.touch("a");

        assert_eq!(lru.len(), 3);
        assert_eq!(lru.evict_oldest(), Some("b".to_string()));
        assert_eq!(lru.evict_oldest(), Some("c".to_string()));
        assert_eq!(lru.evict_oldest(), Some("a".to_string()));
        assert_eq!(lru.evict_oldest(), None);
    }

    #[test]
    fn test_lru_remove() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");

        lru.remove("a");
        lru.remove("missing");

        assert!(!lru.contains("a"));
        assert!(lru.contains("b"));
        assert_eq!(lru.peek_oldest(), Some("b"));
    }

    #[test]
    fn test_lru_repeated_touch_keeps_single_entry() {
        let mut lru = LruTracker::new();
        lru.touch("k");
        lru.touch("k");
        lru.touch("k");

        assert_eq!(lru.len(), 1);
        assert_eq!(lru.evict_oldest(), Some("k".to_string()));
        assert!(lru.is_empty());
    }

    #[test]
    fn test_lru_clear() {
        let mut lru = LruTracker::new();
        lru.touch("a");
        lru.touch("b");
        lru.clear();

        assert!(lru.is_empty());
        assert_eq!(lru.evict_oldest(), None);
    }
}

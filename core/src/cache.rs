//! Query-keyed result cache with TTL and bounded capacity
//!
//! Keys are normalized query text. Entries expire once strictly older than
//! the TTL; an entry exactly TTL old is still served. When the cache is full
//! the least recently used entry is evicted.

use std::collections::{HashMap, VecDeque};
use std::time::Duration;

use tokio::time::Instant;

use crate::types::ResultSet;

/// Default time-to-live for cached results (5 minutes)
pub const DEFAULT_TTL: Duration = Duration::from_secs(300);

/// Default maximum number of cached queries
pub const DEFAULT_CAPACITY: usize = 100;

#[derive(Clone, Debug)]
pub struct CacheEntry {
    pub query: String,
    pub result: ResultSet,
    pub stored_at: Instant,
}

impl CacheEntry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.stored_at) > ttl
    }
}

pub struct SearchCache {
    ttl: Duration,
    capacity: usize,
    map: HashMap<String, CacheEntry>,
    order: VecDeque<String>,
}

impl Default for SearchCache {
    fn default() -> Self {
        Self::new(DEFAULT_TTL, DEFAULT_CAPACITY)
    }
}

impl SearchCache {
    pub fn new(ttl: Duration, capacity: usize) -> Self {
        Self {
            ttl,
            capacity: capacity.max(1),
            map: HashMap::new(),
            order: VecDeque::new(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a query. Expired entries are dropped and reported as a miss.
    pub fn get(&mut self, key: &str, now: Instant) -> Option<CacheEntry> {
        let expired = self.map.get(key)?.is_expired(now, self.ttl);
        if expired {
            self.remove(key);
            return None;
        }

        self.touch(key);
        self.map.get(key).cloned()
    }

    pub fn insert(&mut self, key: String, result: ResultSet, now: Instant) {
        let entry = CacheEntry {
            query: key.clone(),
            result,
            stored_at: now,
        };

        if self.map.contains_key(&key) {
            self.touch(&key);
            self.map.insert(key, entry);
            return;
        }

        self.order.push_back(key.clone());
        self.map.insert(key, entry);

        while self.map.len() > self.capacity {
            if let Some(old_key) = self.order.pop_front() {
                self.map.remove(&old_key);
            } else {
                break;
            }
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.map.contains_key(key)
    }

    /// Drop every entry, returning how many were removed.
    pub fn clear(&mut self) -> usize {
        let removed = self.map.len();
        self.map.clear();
        self.order.clear();
        removed
    }

    /// Drop entries strictly older than the TTL, returning how many were removed.
    pub fn sweep_expired(&mut self, now: Instant) -> usize {
        let ttl = self.ttl;
        let before = self.map.len();
        self.map.retain(|_, entry| !entry.is_expired(now, ttl));
        let map = &self.map;
        self.order.retain(|k| map.contains_key(k));
        before - self.map.len()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    fn remove(&mut self, key: &str) {
        self.map.remove(key);
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            if let Some(k) = self.order.remove(pos) {
                self.order.push_back(k);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn result(n: u64) -> ResultSet {
        ResultSet::new(json!({"success": true, "count": n, "data": []}))
    }

    #[test]
    fn test_hit_and_miss() {
        let now = Instant::now();
        let mut cache = SearchCache::default();
        cache.insert("zelda".into(), result(3), now);

        let hit = cache.get("zelda", now).expect("should hit");
        assert_eq!(hit.result.count(), 3);
        assert_eq!(hit.query, "zelda");

        assert!(cache.get("mario", now).is_none());
        // Keys are exact: no case folding
        assert!(cache.get("Zelda", now).is_none());
    }

    #[test]
    fn test_sweep_boundary_is_inclusive() {
        let t0 = Instant::now();
        let ttl = Duration::from_secs(300);
        let mut cache = SearchCache::new(ttl, 10);
        cache.insert("old".into(), result(1), t0);
        cache.insert("young".into(), result(2), t0 + Duration::from_secs(10));

        // Exactly at the TTL boundary: survives
        assert_eq!(cache.sweep_expired(t0 + ttl), 0);
        assert!(cache.contains("old"));

        // One nanosecond past: removed, younger entry stays
        assert_eq!(cache.sweep_expired(t0 + ttl + Duration::from_nanos(1)), 1);
        assert!(!cache.contains("old"));
        assert!(cache.contains("young"));
    }

    #[test]
    fn test_get_drops_expired_entry() {
        let t0 = Instant::now();
        let mut cache = SearchCache::new(Duration::from_secs(60), 10);
        cache.insert("halo".into(), result(1), t0);

        assert!(cache.get("halo", t0 + Duration::from_secs(60)).is_some());
        assert!(cache.get("halo", t0 + Duration::from_secs(61)).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_clear() {
        let now = Instant::now();
        let mut cache = SearchCache::default();
        cache.insert("a1".into(), result(1), now);
        cache.insert("b2".into(), result(1), now);

        assert_eq!(cache.clear(), 2);
        assert!(cache.is_empty());
        assert!(cache.get("a1", now).is_none());
    }

    #[test]
    fn test_capacity_evicts_least_recently_used() {
        let now = Instant::now();
        let mut cache = SearchCache::new(DEFAULT_TTL, 2);
        cache.insert("aa".into(), result(1), now);
        cache.insert("bb".into(), result(1), now);

        // Reading "aa" makes "bb" the eviction candidate
        assert!(cache.get("aa", now).is_some());
        cache.insert("cc".into(), result(1), now);

        assert_eq!(cache.len(), 2);
        assert!(cache.contains("aa"));
        assert!(!cache.contains("bb"));
        assert!(cache.contains("cc"));
    }

    #[test]
    fn test_reinsert_refreshes_timestamp() {
        let t0 = Instant::now();
        let ttl = Duration::from_secs(300);
        let mut cache = SearchCache::new(ttl, 10);
        cache.insert("doom".into(), result(1), t0);
        cache.insert("doom".into(), result(2), t0 + Duration::from_secs(200));

        assert_eq!(cache.sweep_expired(t0 + Duration::from_secs(400)), 0);
        assert_eq!(cache.len(), 1);
        let entry = cache.get("doom", t0 + Duration::from_secs(400)).expect("hit");
        assert_eq!(entry.result.count(), 2);
    }
}

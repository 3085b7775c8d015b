// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-memory read-through cache with per-entry expiry.
//!
//! Shared across requests within one Cloud Run instance. Entries are
//! invalidated explicitly on writes, so the TTL only bounds staleness of
//! writes made by other instances.

use chrono::{DateTime, Duration, Utc};
use dashmap::DashMap;
use std::hash::Hash;

struct CacheEntry<V> {
    value: V,
    expires_at: DateTime<Utc>,
}

pub struct TtlCache<K, V> {
    ttl: Duration,
    entries: DashMap<K, CacheEntry<V>>,
}

impl<K: Eq + Hash, V: Clone> TtlCache<K, V> {
    /// A zero TTL disables the cache: inserts are dropped.
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            entries: DashMap::new(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.ttl > Duration::zero()
    }

    /// Return a live entry, evicting it if it has expired.
    pub fn get(&self, key: &K, now: DateTime<Utc>) -> Option<V> {
        if let Some(entry) = self.entries.get(key) {
            if now < entry.expires_at {
                return Some(entry.value.clone());
            }
        }
        // Expired (or absent); the guard above is dropped before removal.
        self.entries
            .remove_if(key, |_, entry| now >= entry.expires_at);
        None
    }

    pub fn insert(&self, key: K, value: V, now: DateTime<Utc>) {
        if !self.is_enabled() {
            return;
        }
        self.entries.insert(
            key,
            CacheEntry {
                value,
                expires_at: now + self.ttl,
            },
        );
    }

    pub fn invalidate(&self, key: &K) {
        self.entries.remove(key);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    #[test]
    fn test_hit_before_expiry() {
        let cache = TtlCache::new(Duration::seconds(60));
        cache.insert("k", 1, t0());
        assert_eq!(cache.get(&"k", t0() + Duration::seconds(59)), Some(1));
    }

    #[test]
    fn test_miss_and_evict_after_expiry() {
        let cache = TtlCache::new(Duration::seconds(60));
        cache.insert("k", 1, t0());
        assert_eq!(cache.get(&"k", t0() + Duration::seconds(60)), None);
        assert!(cache.entries.is_empty());
    }

    #[test]
    fn test_invalidate_one_key() {
        let cache = TtlCache::new(Duration::seconds(60));
        cache.insert("a", 1, t0());
        cache.insert("b", 2, t0());
        cache.invalidate(&"a");
        assert_eq!(cache.get(&"a", t0()), None);
        assert_eq!(cache.get(&"b", t0()), Some(2));
    }

    #[test]
    fn test_zero_ttl_disables() {
        let cache = TtlCache::new(Duration::zero());
        cache.insert("k", 1, t0());
        assert!(!cache.is_enabled());
        assert_eq!(cache.get(&"k", t0()), None);
    }
}

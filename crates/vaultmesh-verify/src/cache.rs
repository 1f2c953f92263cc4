//! Bounded TTL cache for cross-domain verification results.
//!
//! Positive and negative results get independent TTLs; negative entries
//! expire faster so a since-fixed "false" doesn't linger. Capacity is
//! capped at [`MAX_ENTRIES`] — on overflow the cache evicts an arbitrary
//! entry rather than maintaining real LRU order, since amplification
//! resistance only needs *a* bound, not precise recency.

use std::time::{Duration, Instant};

use dashmap::DashMap;

pub const MAX_ENTRIES: usize = 1024;
pub const POSITIVE_TTL: Duration = Duration::from_secs(60);
pub const NEGATIVE_TTL: Duration = Duration::from_secs(10);

#[derive(Clone, Copy)]
struct Entry {
    valid: bool,
    expires_at: Instant,
}

pub struct VerificationCache {
    entries: DashMap<(String, [u8; 33]), Entry>,
    capacity: usize,
    positive_ttl: Duration,
    negative_ttl: Duration,
}

impl VerificationCache {
    pub fn new() -> Self {
        Self::with_config(MAX_ENTRIES, POSITIVE_TTL, NEGATIVE_TTL)
    }

    pub fn with_config(capacity: usize, positive_ttl: Duration, negative_ttl: Duration) -> Self {
        Self {
            entries: DashMap::new(),
            capacity,
            positive_ttl,
            negative_ttl,
        }
    }

    pub fn get(&self, address: &str, engagement_pub_key: &[u8; 33]) -> Option<bool> {
        let key = (address.to_string(), *engagement_pub_key);
        let entry = self.entries.get(&key)?;
        if Instant::now() >= entry.expires_at {
            drop(entry);
            self.entries.remove(&key);
            return None;
        }
        Some(entry.valid)
    }

    pub fn put(&self, address: &str, engagement_pub_key: &[u8; 33], valid: bool) {
        if self.entries.len() >= self.capacity {
            if let Some(arbitrary) = self.entries.iter().next().map(|e| e.key().clone()) {
                self.entries.remove(&arbitrary);
            }
        }
        let ttl = if valid { self.positive_ttl } else { self.negative_ttl };
        self.entries.insert(
            (address.to_string(), *engagement_pub_key),
            Entry {
                valid,
                expires_at: Instant::now() + ttl,
            },
        );
    }

    /// Drops any cached positive result for `address` — called whenever a
    /// local mutation could invalidate it (e.g. a send key is deleted).
    pub fn invalidate(&self, address: &str, engagement_pub_key: &[u8; 33]) {
        self.entries.remove(&(address.to_string(), *engagement_pub_key));
    }
}

impl Default for VerificationCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn negative_entries_expire_faster_than_positive() {
        let cache = VerificationCache::new();
        cache.put("alice@d1", &[1u8; 33], true);
        cache.put("bob@d1", &[2u8; 33], false);

        assert_eq!(cache.get("alice@d1", &[1u8; 33]), Some(true));
        assert_eq!(cache.get("bob@d1", &[2u8; 33]), Some(false));
    }

    #[test]
    fn invalidate_removes_entry_regardless_of_ttl() {
        let cache = VerificationCache::new();
        cache.put("alice@d1", &[1u8; 33], true);
        cache.invalidate("alice@d1", &[1u8; 33]);
        assert_eq!(cache.get("alice@d1", &[1u8; 33]), None);
    }
}

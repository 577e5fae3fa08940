//! Event-id de-duplication, per spec.md §4.8: a bounded LRU of recently
//! seen ids, capacity 10,000, oldest entries purged on overflow.

use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::Mutex;

const DEDUP_CAPACITY: usize = 10_000;

pub struct DedupCache {
    seen: Mutex<LruCache<String, ()>>,
}

impl DedupCache {
    pub fn new() -> Self {
        Self { seen: Mutex::new(LruCache::new(NonZeroUsize::new(DEDUP_CAPACITY).unwrap())) }
    }

    /// Records `event_id` and returns `true` if it had already been seen
    /// (i.e. this event should be dropped).
    pub fn is_duplicate(&self, event_id: &str) -> bool {
        let mut seen = self.seen.lock().unwrap();
        if seen.contains(event_id) {
            seen.promote(event_id);
            true
        } else {
            seen.put(event_id.to_string(), ());
            false
        }
    }
}

impl Default for DedupCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_sighting_is_not_a_duplicate_second_is() {
        let cache = DedupCache::new();
        assert!(!cache.is_duplicate("evt-1"));
        assert!(cache.is_duplicate("evt-1"));
    }

    #[test]
    fn distinct_ids_are_tracked_independently() {
        let cache = DedupCache::new();
        assert!(!cache.is_duplicate("evt-1"));
        assert!(!cache.is_duplicate("evt-2"));
    }
}

use std::sync::{Mutex, PoisonError};

use ahash::AHashMap;
use tracing::debug;

use crate::wire::RawResponse;

/// In-memory response cache keyed by full request URL.
///
/// Bounded by entry count; once full it is cleared wholesale instead of tracking recency.
#[derive(Debug)]
pub(crate) struct ResponseCache {
    entries: Mutex<AHashMap<String, RawResponse>>,
    capacity: usize,
}

impl ResponseCache {
    pub(crate) fn new(capacity: usize) -> Self {
        Self {
            entries: Mutex::new(AHashMap::new()),
            capacity,
        }
    }

    pub(crate) fn get(&self, key: &str) -> Option<RawResponse> {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub(crate) fn insert(&self, key: String, response: RawResponse) {
        if self.capacity == 0 {
            return;
        }
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        if entries.len() >= self.capacity && !entries.contains_key(&key) {
            debug!(capacity = self.capacity, "Response cache full, clearing");
            entries.clear();
        }
        entries.insert(key, response);
    }

    pub(crate) fn len(&self) -> usize {
        self.entries
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_after_insert() {
        let cache = ResponseCache::new(4);
        assert!(cache.get("a").is_none());

        cache.insert("a".into(), RawResponse::from_value(json!({"k": 1})));
        assert_eq!(
            cache.get("a"),
            Some(RawResponse::from_value(json!({"k": 1})))
        );
    }

    #[test]
    fn test_clears_when_full() {
        let cache = ResponseCache::new(2);
        cache.insert("a".into(), RawResponse::from_value(json!(1)));
        cache.insert("b".into(), RawResponse::from_value(json!(2)));
        assert_eq!(cache.len(), 2);

        // Overwriting an existing key does not count as growth
        cache.insert("b".into(), RawResponse::from_value(json!(3)));
        assert_eq!(cache.len(), 2);

        cache.insert("c".into(), RawResponse::from_value(json!(4)));
        assert_eq!(cache.len(), 1);
        assert!(cache.get("a").is_none());
        assert!(cache.get("c").is_some());
    }

    #[test]
    fn test_zero_capacity_disables_cache() {
        let cache = ResponseCache::new(0);
        cache.insert("a".into(), RawResponse::from_value(json!(1)));
        assert_eq!(cache.len(), 0);
    }
}

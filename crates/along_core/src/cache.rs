//! crates/along_core/src/cache.rs
//!
//! An explicit, injected cache abstraction for memoizing lookup results
//! (geocodes, museum artifacts). Cache lifetime is whatever the backing
//! store gives it; the in-process implementation is lost on restart, which
//! is acceptable for these lookups.

use std::collections::HashMap;
use std::sync::Mutex;

/// A string-keyed cache. Implementations must tolerate concurrent access.
pub trait KeyValueCache<V>: Send + Sync {
    fn get(&self, key: &str) -> Option<V>;
    fn set(&self, key: &str, value: V);
}

/// Process-lifetime in-memory cache. No eviction; the key spaces it serves
/// (culture×category, geocode queries within a batch) stay small.
pub struct MemoryCache<V> {
    entries: Mutex<HashMap<String, V>>,
}

impl<V> MemoryCache<V> {
    pub fn new() -> Self {
        Self {
            entries: Mutex::new(HashMap::new()),
        }
    }
}

impl<V> Default for MemoryCache<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone + Send> KeyValueCache<V> for MemoryCache<V> {
    fn get(&self, key: &str) -> Option<V> {
        self.entries.lock().expect("cache lock poisoned").get(key).cloned()
    }

    fn set(&self, key: &str, value: V) {
        self.entries
            .lock()
            .expect("cache lock poisoned")
            .insert(key.to_string(), value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips_and_overwrites() {
        let cache = MemoryCache::new();
        assert_eq!(cache.get("k"), None);
        cache.set("k", 1u32);
        assert_eq!(cache.get("k"), Some(1));
        cache.set("k", 2u32);
        assert_eq!(cache.get("k"), Some(2));
    }

    #[test]
    fn negative_results_are_cacheable() {
        // Option<V> as the value type memoizes "looked up, found nothing".
        let cache: MemoryCache<Option<String>> = MemoryCache::new();
        cache.set("met|cafe", None);
        assert_eq!(cache.get("met|cafe"), Some(None));
        assert_eq!(cache.get("met|bar"), None);
    }
}

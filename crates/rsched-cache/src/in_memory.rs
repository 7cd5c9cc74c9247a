//! Default `CacheBackend`: an LRU-bounded, TTL-checked in-process store,
//! following the `Mutex<LruCache<..>>` shape used elsewhere in the
//! workspace for compiled-rule and value-set caches.

use std::num::NonZeroUsize;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use lru::LruCache;

use crate::backend::CacheBackend;
use crate::error::Result;

struct Entry {
    value: String,
    expires_at: Instant,
}

pub struct InMemoryCacheBackend {
    entries: Mutex<LruCache<String, Entry>>,
}

impl InMemoryCacheBackend {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::new(1).unwrap());
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }
}

impl Default for InMemoryCacheBackend {
    fn default() -> Self {
        Self::new(1024)
    }
}

impl CacheBackend for InMemoryCacheBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.expires_at > Instant::now() => Ok(Some(entry.value.clone())),
            Some(_) => {
                entries.pop(key);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut entries = self.entries.lock().unwrap();
        entries.put(
            key.to_string(),
            Entry {
                value,
                expires_at: Instant::now() + ttl,
            },
        );
        Ok(())
    }

    fn invalidate_prefix(&self, prefix: &str) -> Result<usize> {
        let mut entries = self.entries.lock().unwrap();
        let matching: Vec<String> = entries
            .iter()
            .filter(|(k, _)| k.starts_with(prefix))
            .map(|(k, _)| k.clone())
            .collect();
        for key in &matching {
            entries.pop(key);
        }
        Ok(matching.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn set_then_get_round_trips() {
        let cache = InMemoryCacheBackend::new(16);
        cache.set("k", "v".to_string(), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("k").unwrap(), Some("v".to_string()));
    }

    #[test]
    fn expired_entry_reads_as_miss() {
        let cache = InMemoryCacheBackend::new(16);
        cache.set("k", "v".to_string(), Duration::from_millis(1)).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert_eq!(cache.get("k").unwrap(), None);
    }

    #[test]
    fn invalidate_prefix_clears_only_matching_keys() {
        let cache = InMemoryCacheBackend::new(16);
        cache.set("schedule_solution:a", "1".to_string(), Duration::from_secs(60)).unwrap();
        cache.set("schedule_solution:b", "2".to_string(), Duration::from_secs(60)).unwrap();
        cache.set("partial_solution:a:x:y", "3".to_string(), Duration::from_secs(60)).unwrap();

        let removed = cache.invalidate_prefix("schedule_solution:").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(cache.get("partial_solution:a:x:y").unwrap(), Some("3".to_string()));
    }

    #[test]
    fn over_capacity_evicts_least_recently_used() {
        let cache = InMemoryCacheBackend::new(2);
        cache.set("a", "1".to_string(), Duration::from_secs(60)).unwrap();
        cache.set("b", "2".to_string(), Duration::from_secs(60)).unwrap();
        cache.set("c", "3".to_string(), Duration::from_secs(60)).unwrap();
        assert_eq!(cache.get("a").unwrap(), None);
        assert_eq!(cache.get("c").unwrap(), Some("3".to_string()));
    }
}

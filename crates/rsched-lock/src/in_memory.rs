//! Default `LockBackend` for single-process deployments and tests: a mutex
//! guarded expiry map standing in for Redis's SETNX/TTL semantics.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crate::backend::LockBackend;
use crate::error::Result;

struct Entry {
    value: String,
    expires_at: Instant,
}

#[derive(Default)]
pub struct InMemoryLockBackend {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryLockBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LockBackend for InMemoryLockBackend {
    fn try_acquire(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        if let Some(existing) = entries.get(key) {
            if existing.expires_at > now {
                return Ok(false);
            }
        }
        entries.insert(
            key.to_string(),
            Entry {
                value: value.to_string(),
                expires_at: now + ttl,
            },
        );
        Ok(true)
    }

    fn release(&self, key: &str, value: &str) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        match entries.get(key) {
            Some(entry) if entry.value == value && entry.expires_at > Instant::now() => {
                entries.remove(key);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    fn is_locked(&self, key: &str) -> Result<bool> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).is_some_and(|e| e.expires_at > Instant::now()))
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let entries = self.entries.lock().unwrap();
        Ok(entries.get(key).and_then(|e| {
            let now = Instant::now();
            (e.expires_at > now).then(|| e.expires_at - now)
        }))
    }

    fn force_release(&self, key: &str) -> Result<bool> {
        let mut entries = self.entries.lock().unwrap();
        Ok(entries.remove(key).is_some())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_acquire_fails_while_held() {
        let backend = InMemoryLockBackend::new();
        assert!(backend.try_acquire("k", "a", Duration::from_secs(5)).unwrap());
        assert!(!backend.try_acquire("k", "b", Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn release_requires_matching_value() {
        let backend = InMemoryLockBackend::new();
        backend.try_acquire("k", "a", Duration::from_secs(5)).unwrap();
        assert!(!backend.release("k", "wrong").unwrap());
        assert!(backend.is_locked("k").unwrap());
        assert!(backend.release("k", "a").unwrap());
        assert!(!backend.is_locked("k").unwrap());
    }

    #[test]
    fn expired_entry_can_be_reacquired() {
        let backend = InMemoryLockBackend::new();
        backend.try_acquire("k", "a", Duration::from_millis(1)).unwrap();
        std::thread::sleep(Duration::from_millis(20));
        assert!(backend.try_acquire("k", "b", Duration::from_secs(5)).unwrap());
    }

    #[test]
    fn force_release_ignores_ownership() {
        let backend = InMemoryLockBackend::new();
        backend.try_acquire("k", "a", Duration::from_secs(5)).unwrap();
        assert!(backend.force_release("k").unwrap());
        assert!(!backend.is_locked("k").unwrap());
    }
}

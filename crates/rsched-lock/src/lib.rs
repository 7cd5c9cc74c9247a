//! Distributed exclusive lock over schedule generation runs (spec.md §4.6).
//!
//! Confirmed against the original `ScheduleGenerationLock`: SETNX-with-TTL
//! acquisition, exponential backoff, and an ownership-checked release so a
//! process that held the lock past its TTL can't delete someone else's
//! lock out from under them.

pub mod backend;
pub mod error;
pub mod in_memory;
#[cfg(feature = "redis")]
pub mod redis_backend;

use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};
use uuid::Uuid;

pub use backend::LockBackend;
pub use error::{LockError, Result};
pub use in_memory::InMemoryLockBackend;
#[cfg(feature = "redis")]
pub use redis_backend::RedisLockBackend;

/// Maximum duration a lock is held before it expires on its own, even if
/// the holder never releases it.
pub const LOCK_TIMEOUT_SECONDS: u64 = 600;
/// Default ceiling on how long `acquire` will retry before giving up.
pub const DEFAULT_LOCK_ACQUISITION_TIMEOUT_SECONDS: u64 = 30;
const INITIAL_RETRY_DELAY: Duration = Duration::from_millis(100);
const MAX_RETRY_DELAY: Duration = Duration::from_secs(2);

fn lock_key(year_id: &str) -> String {
    format!("lock:schedule_generation:{year_id}")
}

/// Exclusive lock over schedule generation for one academic year, backed by
/// a pluggable [`LockBackend`].
pub struct ScheduleGenerationLock {
    backend: Arc<dyn LockBackend>,
    lock_timeout: Duration,
}

/// Holds the lock for `year_id` until dropped. Release failures (backend
/// unavailable) are logged, not panicked on; the lock simply expires.
pub struct LockGuard {
    backend: Arc<dyn LockBackend>,
    key: String,
    value: String,
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        match self.backend.release(&self.key, &self.value) {
            Ok(true) => debug!(key = %self.key, "released schedule generation lock"),
            Ok(false) => warn!(key = %self.key, "lock was not owned (or backend unavailable) at release time"),
            Err(e) => warn!(key = %self.key, error = %e, "error releasing schedule generation lock"),
        }
    }
}

impl ScheduleGenerationLock {
    pub fn new(backend: Arc<dyn LockBackend>) -> Self {
        Self {
            backend,
            lock_timeout: Duration::from_secs(LOCK_TIMEOUT_SECONDS),
        }
    }

    /// Acquires the lock for `year_id`, retrying with exponential backoff
    /// (100ms doubling to a 2s cap) until `timeout` elapses.
    pub fn acquire(&self, year_id: &str, timeout: Duration) -> Result<LockGuard> {
        let key = lock_key(year_id);
        let value = Uuid::new_v4().to_string();
        let start = Instant::now();
        let mut retry_delay = INITIAL_RETRY_DELAY;

        loop {
            if self.backend.try_acquire(&key, &value, self.lock_timeout)? {
                info!(year_id, "acquired schedule generation lock");
                return Ok(LockGuard {
                    backend: Arc::clone(&self.backend),
                    key,
                    value,
                });
            }

            let elapsed = start.elapsed();
            if elapsed >= timeout {
                return Err(LockError::AcquisitionTimeout {
                    key,
                    timeout_secs: timeout.as_secs(),
                });
            }

            std::thread::sleep(retry_delay.min(timeout - elapsed));
            retry_delay = (retry_delay * 2).min(MAX_RETRY_DELAY);
        }
    }

    pub fn is_locked(&self, year_id: &str) -> bool {
        self.backend.is_locked(&lock_key(year_id)).unwrap_or(false)
    }

    pub fn get_lock_ttl(&self, year_id: &str) -> Option<Duration> {
        self.backend.ttl(&lock_key(year_id)).ok().flatten()
    }

    /// Deletes the lock regardless of ownership. Operator escape hatch for
    /// a stuck lock; never called by normal generation flow.
    pub fn force_release(&self, year_id: &str) -> bool {
        self.backend.force_release(&lock_key(year_id)).unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lock() -> ScheduleGenerationLock {
        ScheduleGenerationLock::new(Arc::new(InMemoryLockBackend::new()))
    }

    #[test]
    fn second_acquire_times_out_while_first_is_held() {
        let lock = lock();
        let guard = lock.acquire("2024", Duration::from_secs(5)).unwrap();
        let result = lock.acquire("2024", Duration::from_millis(50));
        assert!(matches!(result, Err(LockError::AcquisitionTimeout { .. })));
        drop(guard);
        assert!(lock.acquire("2024", Duration::from_secs(1)).is_ok());
    }

    #[test]
    fn drop_releases_lock_for_next_acquirer() {
        let lock = lock();
        {
            let _guard = lock.acquire("2024", Duration::from_secs(5)).unwrap();
            assert!(lock.is_locked("2024"));
        }
        assert!(!lock.is_locked("2024"));
    }

    #[test]
    fn different_years_do_not_contend() {
        let lock = lock();
        let _a = lock.acquire("2024", Duration::from_secs(5)).unwrap();
        let _b = lock.acquire("2025", Duration::from_secs(5)).unwrap();
    }

    #[test]
    fn force_release_unblocks_a_stuck_lock() {
        let lock = lock();
        let guard = lock.acquire("2024", Duration::from_secs(5)).unwrap();
        assert!(lock.force_release("2024"));
        assert!(lock.acquire("2024", Duration::from_secs(1)).is_ok());
        drop(guard);
    }
}

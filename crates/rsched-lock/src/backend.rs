//! `LockBackend`: the storage capability `ScheduleGenerationLock` is built
//! on. The original implementation names Redis directly; here the store is
//! pluggable so the same locking algorithm runs against an in-process map in
//! tests and against Redis in deployments with the `redis` feature enabled.

use std::time::Duration;

use crate::error::Result;

/// SETNX-with-expiry semantics plus ownership-checked delete.
///
/// Implementations must make `try_acquire` atomic (set-if-absent with TTL in
/// one operation) and `release` must only delete the key if `value` still
/// matches what is stored, mirroring the Lua compare-and-delete script in
/// the original Redis implementation.
pub trait LockBackend: Send + Sync {
    /// Attempts to set `key` to `value` with the given TTL, only if `key` is
    /// currently absent or expired. Returns `true` on success.
    fn try_acquire(&self, key: &str, value: &str, ttl: Duration) -> Result<bool>;

    /// Deletes `key` only if its current value equals `value`. Returns
    /// `true` if deleted, `false` if the key was absent or owned by someone
    /// else. Backends should fail closed (return `Ok(false)`, never an
    /// error that aborts the caller) when the store is unreachable, since a
    /// lock that cannot be released will simply expire.
    fn release(&self, key: &str, value: &str) -> Result<bool>;

    /// Whether `key` currently holds an unexpired value. Backends fail open
    /// (`Ok(false)`) when the store is unreachable, so callers can proceed
    /// in degraded mode rather than be blocked by a lock they cannot see.
    fn is_locked(&self, key: &str) -> Result<bool>;

    /// Remaining time-to-live for `key`, or `None` if absent/expired.
    fn ttl(&self, key: &str) -> Result<Option<Duration>>;

    /// Deletes `key` unconditionally, regardless of its current value.
    fn force_release(&self, key: &str) -> Result<bool>;
}

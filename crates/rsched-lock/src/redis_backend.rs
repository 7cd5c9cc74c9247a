//! Redis-backed `LockBackend`, gated behind the `redis` feature. Mirrors the
//! original Python implementation: `SET key value NX EX ttl` for
//! acquisition and a Lua compare-and-delete script for release.

use std::time::Duration;

use redis::{Client, Commands, Script};
use tracing::warn;

use crate::backend::LockBackend;
use crate::error::{LockError, Result};

const RELEASE_SCRIPT: &str = r#"
if redis.call("get", KEYS[1]) == ARGV[1] then
    return redis.call("del", KEYS[1])
else
    return 0
end
"#;

pub struct RedisLockBackend {
    client: Client,
    release_script: Script,
}

impl RedisLockBackend {
    pub fn new(client: Client) -> Self {
        Self {
            client,
            release_script: Script::new(RELEASE_SCRIPT),
        }
    }

    pub fn open(redis_url: &str) -> Result<Self> {
        let client = Client::open(redis_url).map_err(|e| LockError::BackendUnavailable(e.to_string()))?;
        Ok(Self::new(client))
    }
}

impl LockBackend for RedisLockBackend {
    fn try_acquire(&self, key: &str, value: &str, ttl: Duration) -> Result<bool> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| LockError::BackendUnavailable(e.to_string()))?;
        let result: redis::RedisResult<Option<String>> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query(&mut conn);
        match result {
            Ok(Some(_)) => Ok(true),
            Ok(None) => Ok(false),
            Err(e) => Err(LockError::BackendUnavailable(e.to_string())),
        }
    }

    fn release(&self, key: &str, value: &str) -> Result<bool> {
        let mut conn = match self.client.get_connection() {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "redis unavailable, lock will expire on its own");
                return Ok(false);
            }
        };
        match self.release_script.key(key).arg(value).invoke::<i64>(&mut conn) {
            Ok(deleted) => Ok(deleted != 0),
            Err(e) => {
                warn!(error = %e, "redis unavailable while releasing lock");
                Ok(false)
            }
        }
    }

    fn is_locked(&self, key: &str) -> Result<bool> {
        let mut conn = match self.client.get_connection() {
            Ok(conn) => conn,
            Err(_) => return Ok(false),
        };
        match conn.exists::<_, i64>(key) {
            Ok(count) => Ok(count > 0),
            Err(_) => Ok(false),
        }
    }

    fn ttl(&self, key: &str) -> Result<Option<Duration>> {
        let mut conn = match self.client.get_connection() {
            Ok(conn) => conn,
            Err(_) => return Ok(None),
        };
        match conn.ttl::<_, i64>(key) {
            Ok(seconds) if seconds > 0 => Ok(Some(Duration::from_secs(seconds as u64))),
            _ => Ok(None),
        }
    }

    fn force_release(&self, key: &str) -> Result<bool> {
        let mut conn = match self.client.get_connection() {
            Ok(conn) => conn,
            Err(_) => return Ok(false),
        };
        match conn.del::<_, i64>(key) {
            Ok(count) => Ok(count > 0),
            Err(_) => Ok(false),
        }
    }
}

//! Redis-backed `CacheBackend`, gated behind the `redis` feature.

use std::time::Duration;

use redis::Commands;
use tracing::warn;

use crate::backend::CacheBackend;
use crate::error::{CacheError, Result};

pub struct RedisCacheBackend {
    client: redis::Client,
}

impl RedisCacheBackend {
    pub fn open(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).map_err(|e| CacheError::BackendUnavailable(e.to_string()))?;
        Ok(Self { client })
    }
}

impl CacheBackend for RedisCacheBackend {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let mut conn = match self.client.get_connection() {
            Ok(conn) => conn,
            Err(e) => {
                warn!(error = %e, "redis unavailable for cache read");
                return Ok(None);
            }
        };
        match conn.get::<_, Option<String>>(key) {
            Ok(v) => Ok(v),
            Err(e) => {
                warn!(error = %e, "redis error on cache read");
                Ok(None)
            }
        }
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> Result<()> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| CacheError::BackendUnavailable(e.to_string()))?;
        conn.set_ex::<_, _, ()>(key, value, ttl.as_secs().max(1))
            .map_err(|e| CacheError::BackendUnavailable(e.to_string()))
    }

    fn invalidate_prefix(&self, prefix: &str) -> Result<usize> {
        let mut conn = self
            .client
            .get_connection()
            .map_err(|e| CacheError::BackendUnavailable(e.to_string()))?;
        let pattern = format!("{prefix}*");
        let keys: Vec<String> = conn
            .scan_match(&pattern)
            .map_err(|e| CacheError::BackendUnavailable(e.to_string()))?
            .collect();
        if keys.is_empty() {
            return Ok(0);
        }
        conn.del::<_, ()>(&keys)
            .map_err(|e| CacheError::BackendUnavailable(e.to_string()))?;
        Ok(keys.len())
    }
}

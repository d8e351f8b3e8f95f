use redis::{aio::ConnectionManager, AsyncCommands};
use serde::{de::DeserializeOwned, Serialize};

use crate::{
    constants::CACHE_KEY_PREFIX,
    error::Result,
};

/// Thin wrapper over the shared Redis connection covering the three
/// concerns this service uses Redis for: response caching, fixed-window
/// rate limiting, and the refresh-token mirror.
#[derive(Clone)]
pub struct CacheService {
    redis: ConnectionManager,
}

impl CacheService {
    pub fn new(redis: ConnectionManager) -> Self {
        Self { redis }
    }

    // ==================== RESPONSE CACHE ====================

    /// Cache key for a GET response: method, path, caller identity and the
    /// raw query string.
    pub fn request_key(method: &str, path: &str, user: Option<i32>, query: &str) -> String {
        let identity = match user {
            Some(id) => id.to_string(),
            None => "anonymous".to_string(),
        };
        format!("{}:{}:{}:{}:{}", CACHE_KEY_PREFIX, method, path, identity, query)
    }

    /// Cache reads fail open: a Redis error is logged and treated as a miss.
    pub async fn get_json<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let mut conn = self.redis.clone();
        let raw: std::result::Result<Option<String>, redis::RedisError> = conn.get(key).await;
        match raw {
            Ok(Some(payload)) => serde_json::from_str(&payload).ok(),
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Cache read failed for {}: {}", key, e);
                None
            }
        }
    }

    /// Cache writes fail open as well.
    pub async fn set_json<T: Serialize>(&self, key: &str, value: &T, ttl_secs: u64) {
        let Ok(payload) = serde_json::to_string(value) else {
            return;
        };
        let mut conn = self.redis.clone();
        let result: std::result::Result<(), redis::RedisError> =
            conn.set_ex(key, payload, ttl_secs).await;
        if let Err(e) = result {
            tracing::warn!("Cache write failed for {}: {}", key, e);
        }
    }

    /// Deletes every key matching the pattern via SCAN, then a single DEL.
    pub async fn delete_pattern(&self, pattern: &str) -> Result<u64> {
        let mut conn = self.redis.clone();
        let mut cursor: u64 = 0;
        let mut keys: Vec<String> = Vec::new();

        loop {
            let (next, batch): (u64, Vec<String>) = redis::cmd("SCAN")
                .arg(cursor)
                .arg("MATCH")
                .arg(pattern)
                .arg("COUNT")
                .arg(100)
                .query_async(&mut conn)
                .await?;
            keys.extend(batch);
            cursor = next;
            if cursor == 0 {
                break;
            }
        }

        if keys.is_empty() {
            return Ok(0);
        }
        let deleted: u64 = conn.del(keys).await?;
        Ok(deleted)
    }

    // ==================== RATE LIMITING ====================

    /// Fixed-window counter: INCR, with the expiry set when the window
    /// opens. Errors propagate so a Redis outage cannot silently disable
    /// limiting.
    pub async fn increment_rate_limit(&self, key: &str, window_secs: u64) -> Result<i64> {
        let mut conn = self.redis.clone();
        let current: i64 = conn.incr(key, 1).await?;
        if current == 1 {
            let _: bool = conn.expire(key, window_secs as i64).await?;
        }
        Ok(current)
    }

    // ==================== REFRESH TOKEN MIRROR ====================

    pub async fn set_refresh_token(&self, user_id: i32, token: &str, ttl_secs: u64) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: () = conn
            .set_ex(format!("refresh_token:{}", user_id), token, ttl_secs)
            .await?;
        Ok(())
    }

    pub async fn delete_refresh_token(&self, user_id: i32) -> Result<()> {
        let mut conn = self.redis.clone();
        let _: i64 = conn.del(format!("refresh_token:{}", user_id)).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_key_includes_identity_and_query() {
        let key = CacheService::request_key("GET", "/api/v1/users", Some(7), "page=2&limit=10");
        assert_eq!(key, "cache:GET:/api/v1/users:7:page=2&limit=10");
    }

    #[test]
    fn request_key_defaults_to_anonymous() {
        let key = CacheService::request_key("GET", "/api/v1/properties", None, "");
        assert_eq!(key, "cache:GET:/api/v1/properties:anonymous:");
    }
}

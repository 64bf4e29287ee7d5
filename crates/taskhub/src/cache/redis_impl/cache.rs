//! Redis cache implementation.
//!
//! All keys are namespaced with a configurable prefix so several
//! deployments can share one Redis instance.

use std::time::Duration;

use async_trait::async_trait;
use redis::AsyncCommands;

use taskhub_core::cache::{resolve_ttl, Cache, Result};

use super::error::map_redis_error;

/// Redis cache backend using connection manager for pooling.
#[derive(Clone)]
pub struct RedisCache {
    conn: redis::aio::ConnectionManager,
    prefix: String,
}

impl RedisCache {
    /// Creates a new Redis cache connection.
    ///
    /// # Arguments
    ///
    /// * `url` - Redis connection URL (e.g., "redis://localhost:6379")
    /// * `prefix` - Prepended to every key (e.g., "taskhub:")
    ///
    /// # Errors
    ///
    /// Returns `CacheError::ConnectionFailed` if the connection cannot be established.
    pub async fn new(url: &str, prefix: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(url).map_err(map_redis_error)?;
        let conn = redis::aio::ConnectionManager::new(client)
            .await
            .map_err(map_redis_error)?;
        Ok(Self::from_connection(conn, prefix))
    }

    /// Wraps an existing connection manager.
    pub fn from_connection(conn: redis::aio::ConnectionManager, prefix: impl Into<String>) -> Self {
        Self {
            conn,
            prefix: prefix.into(),
        }
    }

    fn prefixed(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl Cache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let mut conn = self.conn.clone();
        let result: Option<Vec<u8>> = conn
            .get(self.prefixed(key))
            .await
            .map_err(map_redis_error)?;
        Ok(result)
    }

    async fn set(&self, key: &str, value: &[u8], ttl: Option<Duration>) -> Result<()> {
        let mut conn = self.conn.clone();
        // Redis expiry has one-second granularity.
        let seconds = resolve_ttl(ttl).as_secs().max(1);

        conn.set_ex::<_, _, ()>(self.prefixed(key), value, seconds)
            .await
            .map_err(map_redis_error)?;

        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.del::<_, ()>(self.prefixed(key))
            .await
            .map_err(map_redis_error)?;
        Ok(())
    }
}

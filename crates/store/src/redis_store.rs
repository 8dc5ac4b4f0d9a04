//! Redis-backed queue store.

use std::time::Duration;

use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Direction};

use crate::error::StoreError;
use crate::QueueStore;

/// Production [`QueueStore`] over a managed Redis connection.
///
/// [`ConnectionManager`] reconnects under the hood, so a dropped
/// connection surfaces as a transient error on the in-flight command
/// rather than poisoning the store handle.
#[derive(Clone)]
pub struct RedisStore {
    manager: ConnectionManager,
}

impl RedisStore {
    /// Connect to the store at `url` (e.g. `redis://127.0.0.1:6379`).
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let client = redis::Client::open(url).map_err(StoreError::Redis)?;
        let manager = client
            .get_connection_manager()
            .await
            .map_err(StoreError::Redis)?;
        Ok(Self { manager })
    }
}

#[async_trait]
impl QueueStore for RedisStore {
    async fn pop_move(
        &self,
        from: &str,
        to: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError> {
        let mut conn = self.manager.clone();
        let moved: Option<String> = conn
            .blmove(
                from,
                to,
                Direction::Right,
                Direction::Left,
                timeout.as_secs_f64(),
            )
            .await?;
        Ok(moved)
    }

    async fn list_prepend(&self, list: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let _: () = conn.lpush(list, value).await?;
        Ok(())
    }

    async fn list_remove(
        &self,
        list: &str,
        value: &str,
        count: usize,
    ) -> Result<usize, StoreError> {
        let mut conn = self.manager.clone();
        let removed: usize = conn.lrem(list, count as isize, value).await?;
        Ok(removed)
    }

    async fn list_values(&self, list: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.manager.clone();
        let values: Vec<String> = conn.lrange(list, 0, -1).await?;
        Ok(values)
    }

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let _: () = conn.hset_multiple(key, fields).await?;
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        let mut conn = self.manager.clone();
        let fields: Vec<(String, String)> = conn.hgetall(key).await?;
        Ok(fields)
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.manager.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut conn = self.manager.clone();
        // SET key value NX EX <secs>: nil reply means the key existed.
        let reply: Option<String> = redis::cmd("SET")
            .arg(key)
            .arg(value)
            .arg("NX")
            .arg("EX")
            .arg(ttl.as_secs().max(1))
            .query_async(&mut conn)
            .await?;
        Ok(reply.is_some())
    }
}

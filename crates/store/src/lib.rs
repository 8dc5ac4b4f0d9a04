//! Shared queue store abstraction.
//!
//! The pipeline's at-least-once queues are built on a small set of
//! list/hash operations against a Redis-like store:
//!
//! - [`QueueStore`] -- the operation set the pipeline consumes.
//! - [`RedisStore`] -- production implementation over a managed Redis
//!   connection.
//! - [`MemoryStore`] -- in-process implementation for tests and
//!   single-process deployments.
//! - [`LeaseQueue`] -- the pending/in-progress lease primitive giving
//!   at-least-once dequeue semantics.

pub mod error;
pub mod lease;
pub mod memory;
pub mod redis_store;

use std::time::Duration;

use async_trait::async_trait;

pub use error::StoreError;
pub use lease::{LeaseQueue, LeasedItem};
pub use memory::MemoryStore;
pub use redis_store::RedisStore;

/// Operations the pipeline requires of the shared store.
///
/// Lists are ordered FIFO: producers prepend to the head and
/// [`pop_move`](QueueStore::pop_move) takes from the tail. Hashes back
/// the queue records; string keys with TTL implement the dedup marker.
#[async_trait]
pub trait QueueStore: Send + Sync + 'static {
    /// Atomically move the tail element of `from` to the head of `to`,
    /// blocking up to `timeout`. Returns `None` when the timeout lapses
    /// with `from` still empty.
    async fn pop_move(
        &self,
        from: &str,
        to: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError>;

    /// Prepend a value to the head of a list.
    async fn list_prepend(&self, list: &str, value: &str) -> Result<(), StoreError>;

    /// Remove up to `count` entries equal to `value`; returns how many
    /// were removed.
    async fn list_remove(&self, list: &str, value: &str, count: usize)
        -> Result<usize, StoreError>;

    /// All current values of a list, head first.
    async fn list_values(&self, list: &str) -> Result<Vec<String>, StoreError>;

    /// Set every field of the hash at `key`.
    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError>;

    /// All fields of the hash at `key`; empty when the key is absent.
    async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>, StoreError>;

    /// Delete a key (hash or string). Deleting an absent key is not an
    /// error.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Set `key` to `value` with the given TTL only if it does not
    /// already exist. Returns `true` when the key was set (the caller
    /// may proceed) and `false` when it already existed.
    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError>;
}

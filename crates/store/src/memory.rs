//! In-process queue store.
//!
//! [`MemoryStore`] implements [`QueueStore`] over plain collections
//! behind a mutex. It backs the pipeline's tests and is a valid store
//! for single-process deployments; it provides none of the cross-process
//! guarantees of the Redis implementation.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tokio::sync::Notify;

use crate::error::StoreError;
use crate::QueueStore;

#[derive(Default)]
struct Inner {
    lists: HashMap<String, VecDeque<String>>,
    hashes: HashMap<String, Vec<(String, String)>>,
    /// String keys with an optional expiry deadline, purged lazily.
    strings: HashMap<String, (String, Option<Instant>)>,
}

impl Inner {
    fn purge_expired(&mut self, key: &str) {
        if let Some((_, Some(deadline))) = self.strings.get(key) {
            if Instant::now() >= *deadline {
                self.strings.remove(key);
            }
        }
    }
}

/// Mutex-guarded, in-process [`QueueStore`].
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    /// Woken whenever a list gains an element, to unblock `pop_move`.
    pushed: Notify,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn try_pop_move(&self, from: &str, to: &str) -> Option<String> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let value = inner.lists.get_mut(from)?.pop_back()?;
        inner
            .lists
            .entry(to.to_string())
            .or_default()
            .push_front(value.clone());
        Some(value)
    }
}

#[async_trait]
impl QueueStore for MemoryStore {
    async fn pop_move(
        &self,
        from: &str,
        to: &str,
        timeout: Duration,
    ) -> Result<Option<String>, StoreError> {
        let deadline = Instant::now() + timeout;
        loop {
            // Register for wakeups before re-checking the list, so a
            // prepend landing between the check and the wait is not a
            // lost wakeup.
            let notified = self.pushed.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            if let Some(value) = self.try_pop_move(from, to) {
                return Ok(Some(value));
            }
            let Some(remaining) = deadline.checked_duration_since(Instant::now()) else {
                return Ok(None);
            };
            if remaining.is_zero() {
                return Ok(None);
            }
            // Timing out here is fine: the loop re-checks and exits on
            // the next pass once the deadline lapses.
            let _ = tokio::time::timeout(remaining, notified).await;
        }
    }

    async fn list_prepend(&self, list: &str, value: &str) -> Result<(), StoreError> {
        self.inner
            .lock()
            .expect("memory store poisoned")
            .lists
            .entry(list.to_string())
            .or_default()
            .push_front(value.to_string());
        self.pushed.notify_waiters();
        Ok(())
    }

    async fn list_remove(
        &self,
        list: &str,
        value: &str,
        count: usize,
    ) -> Result<usize, StoreError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        let Some(entries) = inner.lists.get_mut(list) else {
            return Ok(0);
        };
        let mut removed = 0;
        while removed < count {
            let Some(pos) = entries.iter().position(|v| v == value) else {
                break;
            };
            entries.remove(pos);
            removed += 1;
        }
        Ok(removed)
    }

    async fn list_values(&self, list: &str) -> Result<Vec<String>, StoreError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner
            .lists
            .get(list)
            .map(|l| l.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn hash_set(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        self.inner
            .lock()
            .expect("memory store poisoned")
            .hashes
            .insert(key.to_string(), fields.to_vec());
        Ok(())
    }

    async fn hash_get_all(&self, key: &str) -> Result<Vec<(String, String)>, StoreError> {
        let inner = self.inner.lock().expect("memory store poisoned");
        Ok(inner.hashes.get(key).cloned().unwrap_or_default())
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.hashes.remove(key);
        inner.strings.remove(key);
        Ok(())
    }

    async fn set_if_absent(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<bool, StoreError> {
        let mut inner = self.inner.lock().expect("memory store poisoned");
        inner.purge_expired(key);
        if inner.strings.contains_key(key) {
            return Ok(false);
        }
        inner.strings.insert(
            key.to_string(),
            (value.to_string(), Some(Instant::now() + ttl)),
        );
        Ok(true)
    }
}

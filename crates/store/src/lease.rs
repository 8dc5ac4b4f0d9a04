//! Lease queue: at-least-once dequeue over a pair of lists.
//!
//! A queue item is a key whose payload lives in a hash. Producers write
//! the hash and prepend the key to the *pending* list; consumers move
//! the key to the *in-progress* list, process it, then complete it. An
//! item therefore resides in exactly one of the two lists at every
//! instant; only the reaper moves keys back after a crashed consumer.

use std::sync::Arc;
use std::time::{Duration, Instant};

use crate::error::StoreError;
use crate::QueueStore;

/// A dequeued item holding its lease.
#[derive(Debug, Clone, PartialEq)]
pub struct LeasedItem {
    /// The backing hash key, also the list entry value.
    pub key: String,
    /// Raw hash fields; decoding is the consumer's business.
    pub fields: Vec<(String, String)>,
}

/// Handle on one pending/in-progress list pair.
pub struct LeaseQueue<S> {
    store: Arc<S>,
    pending: &'static str,
    in_progress: &'static str,
}

impl<S: QueueStore> LeaseQueue<S> {
    pub fn new(store: Arc<S>, pending: &'static str, in_progress: &'static str) -> Self {
        Self {
            store,
            pending,
            in_progress,
        }
    }

    /// Write the backing hash and make the key visible on the pending
    /// list.
    pub async fn enqueue(&self, key: &str, fields: &[(String, String)]) -> Result<(), StoreError> {
        self.store.hash_set(key, fields).await?;
        self.store.list_prepend(self.pending, key).await
    }

    /// Move one key from pending to in-progress and load its record,
    /// blocking up to `timeout`.
    ///
    /// A key whose backing hash is gone or empty is an orphan: it is
    /// deleted outright (never requeued) and the wait continues with the
    /// next element rather than surfacing a corrupt item. Orphan skips
    /// spend the same wait budget; the call returns within `timeout`
    /// however many orphans it chews through.
    pub async fn dequeue(&self, timeout: Duration) -> Result<Option<LeasedItem>, StoreError> {
        let deadline = Instant::now() + timeout;
        let mut remaining = timeout;
        loop {
            let Some(key) = self
                .store
                .pop_move(self.pending, self.in_progress, remaining)
                .await?
            else {
                return Ok(None);
            };
            let fields = self.store.hash_get_all(&key).await?;
            if fields.is_empty() {
                tracing::warn!(key, "Dropping orphaned queue item with no backing record");
                self.complete(&key).await?;
                remaining = deadline.saturating_duration_since(Instant::now());
                if remaining.is_zero() {
                    return Ok(None);
                }
                continue;
            }
            return Ok(Some(LeasedItem { key, fields }));
        }
    }

    /// Finish an item: drop its lease and delete the backing record.
    pub async fn complete(&self, key: &str) -> Result<(), StoreError> {
        self.store.list_remove(self.in_progress, key, 1).await?;
        self.store.delete(key).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemoryStore;

    fn queue(store: &Arc<MemoryStore>) -> LeaseQueue<MemoryStore> {
        LeaseQueue::new(store.clone(), "pending", "busy")
    }

    fn fields() -> Vec<(String, String)> {
        vec![("f".to_string(), "v".to_string())]
    }

    #[tokio::test]
    async fn dequeue_moves_key_to_in_progress() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        q.enqueue("k1", &fields()).await.unwrap();

        let item = q.dequeue(Duration::from_millis(10)).await.unwrap().unwrap();
        assert_eq!(item.key, "k1");
        assert_eq!(item.fields, fields());
        assert!(store.list_values("pending").await.unwrap().is_empty());
        assert_eq!(store.list_values("busy").await.unwrap(), vec!["k1"]);
    }

    #[tokio::test]
    async fn complete_deletes_record_and_lease() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        q.enqueue("k1", &fields()).await.unwrap();
        let item = q.dequeue(Duration::from_millis(10)).await.unwrap().unwrap();

        q.complete(&item.key).await.unwrap();
        assert!(store.list_values("busy").await.unwrap().is_empty());
        assert!(store.hash_get_all("k1").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn dequeue_times_out_on_empty_queue() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        assert_eq!(q.dequeue(Duration::from_millis(10)).await.unwrap(), None);
    }

    #[tokio::test]
    async fn orphaned_key_is_deleted_not_surfaced() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        // A key on the pending list with no backing hash, then a valid one.
        store.list_prepend("pending", "ghost").await.unwrap();
        q.enqueue("real", &fields()).await.unwrap();

        let item = q.dequeue(Duration::from_millis(10)).await.unwrap().unwrap();
        assert_eq!(item.key, "real");
        // The orphan is gone from both lists.
        assert!(store.list_values("busy").await.unwrap() == vec!["real"]);
    }

    #[tokio::test]
    async fn orphan_stream_does_not_extend_the_wait() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        for i in 0..3 {
            store
                .list_prepend("pending", &format!("ghost-{i}"))
                .await
                .unwrap();
        }
        // Keep feeding orphans for well past the dequeue timeout.
        let feeder = {
            let store = store.clone();
            tokio::spawn(async move {
                for i in 0..100 {
                    tokio::time::sleep(Duration::from_millis(5)).await;
                    store
                        .list_prepend("pending", &format!("late-ghost-{i}"))
                        .await
                        .unwrap();
                }
            })
        };

        let start = Instant::now();
        let got = q.dequeue(Duration::from_millis(30)).await.unwrap();
        feeder.abort();

        assert_eq!(got, None);
        assert!(
            start.elapsed() < Duration::from_millis(250),
            "dequeue overstayed its timeout: {:?}",
            start.elapsed()
        );
    }

    #[tokio::test]
    async fn items_dequeue_in_fifo_order() {
        let store = Arc::new(MemoryStore::new());
        let q = queue(&store);
        q.enqueue("first", &fields()).await.unwrap();
        q.enqueue("second", &fields()).await.unwrap();

        let a = q.dequeue(Duration::from_millis(10)).await.unwrap().unwrap();
        let b = q.dequeue(Duration::from_millis(10)).await.unwrap().unwrap();
        assert_eq!(a.key, "first");
        assert_eq!(b.key, "second");
    }
}

//! Lease reaper.
//!
//! Consumers that crash mid-task leave their keys stranded on an
//! in-progress list. The reaper scans the watched lists on a fixed
//! interval and moves any key that has been in progress longer than the
//! lease age back to its pending list.
//!
//! Tracking lives entirely in the reaper's worker state: a key becomes
//! a suspect when first seen on an in-progress list, and is evicted
//! only if it is still there a full lease age later. A key that
//! completes in between simply vanishes from the next scan.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pulsewatch_store::{QueueStore, StoreError};

use crate::keys;
use crate::scheduler::Worker;

/// One in-progress list paired with the pending list its keys return to.
#[derive(Debug, Clone, Copy)]
pub struct WatchList {
    pub in_progress: &'static str,
    pub return_list: &'static str,
}

/// A key observed on an in-progress list, with the scan time it was
/// first seen there.
#[derive(Debug, Clone)]
pub struct Suspect {
    list: &'static str,
    return_list: &'static str,
    value: String,
    first_seen: Instant,
}

impl Suspect {
    fn id(&self) -> String {
        format!("{}:{}", self.list, self.value)
    }
}

pub struct Reaper<S> {
    store: Arc<S>,
    watch: Vec<WatchList>,
    lease_max_age: Duration,
    pause: Duration,
}

impl<S: QueueStore> Reaper<S> {
    pub fn new(store: Arc<S>, lease_max_age: Duration, pause: Duration) -> Self {
        Self {
            store,
            watch: vec![
                WatchList {
                    in_progress: keys::OBS_IN_PROGRESS,
                    return_list: keys::OBS_PENDING,
                },
                WatchList {
                    in_progress: keys::NOTE_IN_PROGRESS,
                    return_list: keys::NOTE_PENDING,
                },
            ],
            lease_max_age,
            pause,
        }
    }

    #[cfg(test)]
    fn with_watch(store: Arc<S>, watch: Vec<WatchList>, lease_max_age: Duration) -> Self {
        Self {
            store,
            watch,
            lease_max_age,
            pause: Duration::from_secs(1),
        }
    }

    /// One scan pass.
    ///
    /// Evicts suspects older than the lease age that are still present
    /// (the remove count confirms presence so a racing `complete` wins),
    /// then rebuilds the suspect set from the current list contents.
    /// Keys already tracked keep their original `first_seen`.
    pub async fn tick(
        &self,
        now: Instant,
        suspects: Vec<Suspect>,
    ) -> Result<Vec<Suspect>, StoreError> {
        let mut tracked: HashMap<String, Suspect> =
            suspects.into_iter().map(|s| (s.id(), s)).collect();

        let mut evicted = Vec::new();
        for suspect in tracked.values() {
            if now.duration_since(suspect.first_seen) < self.lease_max_age {
                continue;
            }
            let removed = self
                .store
                .list_remove(suspect.list, &suspect.value, 1)
                .await?;
            if removed == 1 {
                self.store
                    .list_prepend(suspect.return_list, &suspect.value)
                    .await?;
                tracing::info!(
                    key = %suspect.value,
                    from = suspect.list,
                    to = suspect.return_list,
                    "Requeued expired lease"
                );
            }
            evicted.push(suspect.id());
        }
        // An aged-out suspect leaves the set whether or not the removal
        // succeeded. If a consumer re-leases the key before the rescan
        // below, the key is a fresh suspect with a fresh window, never
        // one inheriting the stale first_seen.
        for id in &evicted {
            tracked.remove(id);
        }

        let mut next = Vec::new();
        for watch in &self.watch {
            for value in self.store.list_values(watch.in_progress).await? {
                let candidate = Suspect {
                    list: watch.in_progress,
                    return_list: watch.return_list,
                    value,
                    first_seen: now,
                };
                match tracked.remove(&candidate.id()) {
                    Some(existing) => next.push(existing),
                    None => next.push(candidate),
                }
            }
        }
        Ok(next)
    }
}

#[async_trait]
impl<S: QueueStore> Worker for Reaper<S> {
    type State = Vec<Suspect>;

    fn name(&self) -> &'static str {
        "lease-reaper"
    }

    fn pause(&self) -> Duration {
        self.pause
    }

    async fn run(&self, suspects: Vec<Suspect>) -> Option<Vec<Suspect>> {
        // On a transient failure the previous suspect set is kept so
        // eviction ages are not reset by a store blip.
        let prior = suspects.clone();
        match self.tick(Instant::now(), suspects).await {
            Ok(next) => Some(next),
            Err(error) if error.is_transient() => {
                tracing::warn!(%error, "Transient failure scanning leases");
                Some(prior)
            }
            Err(error) => {
                tracing::error!(%error, "Lease reaper failed");
                None
            }
        }
    }
}

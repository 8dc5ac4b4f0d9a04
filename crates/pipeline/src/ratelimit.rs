//! Notification rate limiting (the dedup guard).
//!
//! One notification per (user, device, alert kind) per cooldown window.
//! The guard sits behind the [`RateLimiter`] trait so the deployment
//! chooses the strategy at wiring time rather than via a hidden global.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use async_trait::async_trait;
use pulsewatch_core::types::UserId;
use pulsewatch_core::LimitKind;
use pulsewatch_store::{QueueStore, StoreError};

use crate::keys;

/// Gate on notification creation.
#[async_trait]
pub trait RateLimiter: Send + Sync {
    /// Try to claim the window for the triple. Returns `true` when the
    /// caller may notify, `false` when a previous notification still
    /// holds the window.
    async fn try_acquire(
        &self,
        user_id: UserId,
        device_id: &str,
        kind: LimitKind,
        cooldown: Duration,
    ) -> Result<bool, StoreError>;
}

// ---------------------------------------------------------------------------
// MarkerRateLimiter
// ---------------------------------------------------------------------------

/// TTL-marker strategy: `set-if-absent` on a store key that expires
/// after the cooldown. Safe under any number of pipeline processes;
/// this is the canonical implementation.
pub struct MarkerRateLimiter<S> {
    store: Arc<S>,
}

impl<S> MarkerRateLimiter<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }
}

#[async_trait]
impl<S: QueueStore> RateLimiter for MarkerRateLimiter<S> {
    async fn try_acquire(
        &self,
        user_id: UserId,
        device_id: &str,
        kind: LimitKind,
        cooldown: Duration,
    ) -> Result<bool, StoreError> {
        let key = keys::cooldown_key(user_id, device_id, kind);
        self.store.set_if_absent(&key, &key, cooldown).await
    }
}

// ---------------------------------------------------------------------------
// LocalRateLimiter
// ---------------------------------------------------------------------------

/// In-memory last-sent map strategy.
///
/// Process-local: the window neither survives a restart nor coordinates
/// across multiple pipeline processes, which can double-notify. Only
/// wire this in single-process deployments.
#[derive(Default)]
pub struct LocalRateLimiter {
    last_sent: Mutex<HashMap<(UserId, String, u8), Instant>>,
}

impl LocalRateLimiter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RateLimiter for LocalRateLimiter {
    async fn try_acquire(
        &self,
        user_id: UserId,
        device_id: &str,
        kind: LimitKind,
        cooldown: Duration,
    ) -> Result<bool, StoreError> {
        let now = Instant::now();
        let mut map = self.last_sent.lock().expect("rate limiter poisoned");
        let slot = (user_id, device_id.to_string(), kind.code());
        if let Some(last) = map.get(&slot) {
            if now.duration_since(*last) < cooldown {
                return Ok(false);
            }
        }
        map.insert(slot, now);
        Ok(true)
    }
}

//! Observation processing stage.
//!
//! Drains the observation queue: each record is classified against the
//! device owner's limits, alerts are appended to the device chat log,
//! and a notification task is enqueued when the cooldown guard allows.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pulsewatch_core::types::UserId;
use pulsewatch_core::{classify, Classification, LimitKind, LimitSet, Observation};
use pulsewatch_store::{LeaseQueue, LeasedItem, QueueStore};

use crate::directory::Directory;
use crate::error::PipelineError;
use crate::ratelimit::RateLimiter;
use crate::scheduler::Worker;
use crate::task::NotificationTask;

pub struct ObservationProcessor<S> {
    observations: LeaseQueue<S>,
    notifications: LeaseQueue<S>,
    directory: Arc<dyn Directory>,
    limiter: Arc<dyn RateLimiter>,
    dequeue_timeout: Duration,
    pause: Duration,
}

impl<S: QueueStore> ObservationProcessor<S> {
    pub fn new(
        observations: LeaseQueue<S>,
        notifications: LeaseQueue<S>,
        directory: Arc<dyn Directory>,
        limiter: Arc<dyn RateLimiter>,
        dequeue_timeout: Duration,
        pause: Duration,
    ) -> Self {
        Self {
            observations,
            notifications,
            directory,
            limiter,
            dequeue_timeout,
            pause,
        }
    }

    /// Process queued observations until the blocking dequeue times out.
    ///
    /// Every dequeued item is completed, whatever happens to it while
    /// processing, except when a store or database error aborts the
    /// drain; those leases stay on the in-progress list for the reaper.
    pub async fn drain(&self) -> Result<(), PipelineError> {
        while let Some(item) = self.observations.dequeue(self.dequeue_timeout).await? {
            self.handle(&item).await?;
            self.observations.complete(&item.key).await?;
        }
        Ok(())
    }

    async fn handle(&self, item: &LeasedItem) -> Result<(), PipelineError> {
        let Some(obs) = Observation::from_fields(&item.fields) else {
            tracing::warn!(key = %item.key, "Discarding undecodable observation");
            return Ok(());
        };
        self.process(&obs).await
    }

    async fn process(&self, obs: &Observation) -> Result<(), PipelineError> {
        let Some(device) = self.directory.device(&obs.device_id).await? else {
            tracing::debug!(device_id = %obs.device_id, "Observation for unknown device");
            return Ok(());
        };
        let Some(owner_id) = device.owner_id else {
            tracing::debug!(device_id = %device.id, "Observation for unowned device");
            return Ok(());
        };

        let limits = self.directory.limits_for(&device.id, owner_id).await?;
        if limits.is_empty() {
            return Ok(());
        }

        let classification = classify(obs, &limits);
        if !classification.is_alert() {
            return Ok(());
        }
        self.alert(obs, &device.id, &device.name, owner_id, &limits, classification)
            .await
    }

    async fn alert(
        &self,
        obs: &Observation,
        device_id: &str,
        device_name: &str,
        owner_id: UserId,
        limits: &LimitSet,
        classification: Classification,
    ) -> Result<(), PipelineError> {
        // limit_kind and observed_value are Some for every alert variant.
        let (Some(kind), Some(observed)) =
            (classification.limit_kind(), classification.observed_value())
        else {
            return Ok(());
        };

        tracing::info!(
            device_id,
            kind = %kind,
            observed,
            "Observation triggered alert"
        );

        if let Some(message) = classification.chat_message(device_name, limits.temp_scale()) {
            // Chat log is best-effort: a failed append must not block
            // the notification. Alert lines are topic'd and posted
            // under the device id.
            if let Err(error) = self
                .directory
                .append_chat_log(device_id, device_id, &message)
                .await
            {
                tracing::error!(device_id, %error, "Failed to append chat log entry");
            }
        }

        let cooldown_secs = limits.value(LimitKind::Notifications).unwrap_or(0.0);
        if cooldown_secs.is_nan() || cooldown_secs <= 0.0 {
            tracing::debug!(device_id, "Notifications disabled for device");
            return Ok(());
        }
        // The stored value is an unchecked double; NaN, infinite, and
        // out-of-range values must disable notifications, not panic.
        let Ok(cooldown) = Duration::try_from_secs_f64(cooldown_secs) else {
            tracing::warn!(
                device_id,
                cooldown_secs,
                "Ignoring unusable notification cooldown value"
            );
            return Ok(());
        };

        if !self
            .limiter
            .try_acquire(owner_id, device_id, kind, cooldown)
            .await?
        {
            tracing::debug!(device_id, kind = %kind, "Notification suppressed by cooldown");
            return Ok(());
        }

        let task = NotificationTask::new(
            owner_id,
            device_id,
            kind,
            observed,
            obs.battery,
            obs.charging,
        );
        self.notifications.enqueue(&task.key, &task.to_fields()).await?;
        Ok(())
    }
}

#[async_trait]
impl<S: QueueStore> Worker for ObservationProcessor<S> {
    type State = ();

    fn name(&self) -> &'static str {
        "observation-processor"
    }

    fn pause(&self) -> Duration {
        self.pause
    }

    async fn run(&self, _state: ()) -> Option<()> {
        match self.drain().await {
            Ok(()) => Some(()),
            Err(error) if error.is_transient() => {
                tracing::warn!(%error, "Transient failure draining observations");
                Some(())
            }
            Err(error) => {
                tracing::error!(%error, "Observation processor failed");
                None
            }
        }
    }
}

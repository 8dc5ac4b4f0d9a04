//! Notification dispatch stage.
//!
//! Drains the notification queue and delivers one push per task to
//! every endpoint registered for the recipient account. Delivery is
//! fire-and-forget: a failed push is logged per endpoint and the task
//! completes regardless, so a flaky relay never replays alerts.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use pulsewatch_core::{format_observed, LimitKind};
use pulsewatch_store::{LeaseQueue, LeasedItem, QueueStore};

use crate::directory::Directory;
use crate::error::PipelineError;
use crate::push::{PushGateway, PushOutcome, PushPayload};
use crate::scheduler::Worker;
use crate::task::NotificationTask;

/// Device colour used when the owner never picked one.
const DEFAULT_COLOUR: &str = "4c96fc";

pub struct NotificationDispatcher<S> {
    notifications: LeaseQueue<S>,
    directory: Arc<dyn Directory>,
    gateway: Arc<dyn PushGateway>,
    dequeue_timeout: Duration,
    pause: Duration,
}

impl<S: QueueStore> NotificationDispatcher<S> {
    pub fn new(
        notifications: LeaseQueue<S>,
        directory: Arc<dyn Directory>,
        gateway: Arc<dyn PushGateway>,
        dequeue_timeout: Duration,
        pause: Duration,
    ) -> Self {
        Self {
            notifications,
            directory,
            gateway,
            dequeue_timeout,
            pause,
        }
    }

    /// Dispatch queued tasks until the blocking dequeue times out.
    ///
    /// Database errors abort the drain and leave the lease for the
    /// reaper; push failures do not.
    pub async fn drain(&self) -> Result<(), PipelineError> {
        while let Some(item) = self.notifications.dequeue(self.dequeue_timeout).await? {
            self.handle(&item).await?;
            self.notifications.complete(&item.key).await?;
        }
        Ok(())
    }

    async fn handle(&self, item: &LeasedItem) -> Result<(), PipelineError> {
        let Some(task) = NotificationTask::from_fields(&item.key, &item.fields) else {
            tracing::warn!(key = %item.key, "Discarding undecodable notification task");
            return Ok(());
        };
        self.dispatch(&task).await
    }

    async fn dispatch(&self, task: &NotificationTask) -> Result<(), PipelineError> {
        let endpoints = self.directory.push_endpoints(task.user_id).await?;
        if endpoints.is_empty() {
            tracing::debug!(
                user_id = %task.user_id,
                device_id = %task.device_id,
                "No push endpoints registered"
            );
            return Ok(());
        }

        // The device may have been deleted since the task was queued;
        // fall back to its id as the display name.
        let (device_name, shared) = match self.directory.device(&task.device_id).await? {
            Some(device) => {
                let shared = device.owner_id != Some(task.user_id);
                (device.name, shared)
            }
            None => (task.device_id.clone(), false),
        };

        let limits = self
            .directory
            .limits_for(&task.device_id, task.user_id)
            .await?;
        let colour = limits
            .value_str(LimitKind::Colour)
            .unwrap_or(DEFAULT_COLOUR)
            .to_string();
        let formatted_value = format_observed(task.kind, task.observed_value, limits.temp_scale());

        let payload = PushPayload {
            device_name: device_name.clone(),
            device_id: task.device_id.clone(),
            colour,
            battery_level: task.battery_level,
            charging: task.charging,
            shared,
            title: format!("{} Alert", task.kind.label()),
            body: format!(
                "Alert triggered for {device_name} with {} at {formatted_value}",
                task.kind.label()
            ),
            formatted_value,
        };

        match self.gateway.send(&endpoints, &payload).await {
            Ok(outcomes) => {
                if outcomes.len() != endpoints.len() {
                    tracing::error!(
                        expected = endpoints.len(),
                        got = outcomes.len(),
                        "Push gateway returned wrong outcome count"
                    );
                }
                for (endpoint, outcome) in endpoints.iter().zip(&outcomes) {
                    match outcome {
                        PushOutcome::Delivered => {
                            tracing::debug!(endpoint, device_id = %task.device_id, "Push delivered");
                        }
                        PushOutcome::Failed(reason) => {
                            tracing::warn!(
                                endpoint,
                                device_id = %task.device_id,
                                reason,
                                "Push delivery failed"
                            );
                        }
                    }
                }
            }
            Err(error) => {
                tracing::error!(device_id = %task.device_id, %error, "Push gateway call failed");
            }
        }
        Ok(())
    }
}

#[async_trait]
impl<S: QueueStore> Worker for NotificationDispatcher<S> {
    type State = ();

    fn name(&self) -> &'static str {
        "notification-dispatcher"
    }

    fn pause(&self) -> Duration {
        self.pause
    }

    async fn run(&self, _state: ()) -> Option<()> {
        match self.drain().await {
            Ok(()) => Some(()),
            Err(error) if error.is_transient() => {
                tracing::warn!(%error, "Transient failure draining notifications");
                Some(())
            }
            Err(error) => {
                tracing::error!(%error, "Notification dispatcher failed");
                None
            }
        }
    }
}

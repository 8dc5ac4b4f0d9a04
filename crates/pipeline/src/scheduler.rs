//! Cooperative worker scheduling.
//!
//! Each pipeline worker is an independent, self-rescheduling loop:
//! sleep its pause interval, run one step, carry the returned state
//! into the next iteration. Returning `None` from a step retires the
//! worker permanently; cancellation stops it at the next pause.

use std::time::Duration;

use async_trait::async_trait;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// One pipeline worker.
///
/// A worker owns a single logical execution context: its step is never
/// run concurrently with itself. `run` may drain its queue fully before
/// returning so backlog is not throttled by the pause interval.
#[async_trait]
pub trait Worker: Send + Sync + 'static {
    /// State carried between iterations.
    type State: Send + 'static;

    /// Name used in log output.
    fn name(&self) -> &'static str;

    /// Fixed sleep between iterations.
    fn pause(&self) -> Duration;

    /// One step. Return the next state to stay scheduled, or `None` to
    /// retire the worker.
    async fn run(&self, state: Self::State) -> Option<Self::State>;
}

/// Drive a worker on its own task until it retires or `cancel` fires.
pub fn spawn<W: Worker>(
    worker: W,
    initial: W::State,
    cancel: CancellationToken,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        tracing::info!(worker = worker.name(), "Scheduling worker");
        let mut state = initial;
        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!(worker = worker.name(), "Worker cancelled");
                    break;
                }
                _ = tokio::time::sleep(worker.pause()) => {}
            }
            match worker.run(state).await {
                Some(next) => state = next,
                None => {
                    tracing::info!(worker = worker.name(), "Worker retired");
                    break;
                }
            }
        }
    })
}

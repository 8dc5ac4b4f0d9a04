//! Pulsewatch observation pipeline.
//!
//! The three cooperative workers that turn raw device telemetry into
//! rate-limited push notifications:
//!
//! - [`ObservationProcessor`] -- drains the observation queue, classifies
//!   readings against the owner's limits, records chat-log alerts, and
//!   enqueues notification tasks behind the dedup guard.
//! - [`NotificationDispatcher`] -- drains the notification queue,
//!   resolves push endpoints, and calls the gateway.
//! - [`Reaper`] -- watchdog that returns abandoned leases to their
//!   pending lists.
//!
//! Workers implement [`scheduler::Worker`] and are driven by
//! [`scheduler::spawn`] on independent timers.

pub mod directory;
pub mod dispatcher;
pub mod error;
pub mod keys;
pub mod processor;
pub mod push;
pub mod ratelimit;
pub mod reaper;
pub mod scheduler;
pub mod task;

pub use directory::{Directory, PgDirectory};
pub use dispatcher::NotificationDispatcher;
pub use error::PipelineError;
pub use processor::ObservationProcessor;
pub use push::{HttpPushGateway, PushGateway, PushOutcome, PushPayload};
pub use ratelimit::{LocalRateLimiter, MarkerRateLimiter, RateLimiter};
pub use reaper::Reaper;
pub use task::NotificationTask;

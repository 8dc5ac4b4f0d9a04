//! Environment-derived worker configuration.

use std::time::Duration;

/// Settings for one worker process.
///
/// Timing defaults match the historical deployment: short poll pauses
/// for the queue stages, a slower reaper, and a lease age comfortably
/// above the longest expected processing time.
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    pub database_url: String,
    pub redis_url: String,
    pub push_gateway_url: String,
    /// Pause between observation drain passes.
    pub obs_poll_pause: Duration,
    /// Pause between notification drain passes.
    pub note_poll_pause: Duration,
    /// Pause between reaper scans.
    pub reaper_pause: Duration,
    /// How long a key may sit in progress before it is requeued.
    pub lease_max_age: Duration,
    /// Blocking-dequeue timeout; bounds how long a drain pass idles.
    pub dequeue_block: Duration,
}

const DEFAULT_REDIS_URL: &str = "redis://127.0.0.1:6379";
const DEFAULT_OBS_POLL_PAUSE_SECS: u64 = 5;
const DEFAULT_NOTE_POLL_PAUSE_SECS: u64 = 5;
const DEFAULT_REAPER_PAUSE_SECS: u64 = 20;
const DEFAULT_LEASE_MAX_AGE_SECS: u64 = 60;
const DEFAULT_DEQUEUE_BLOCK_SECS: u64 = 45;

impl WorkerConfig {
    /// Read configuration from the environment, exiting with a logged
    /// error when a required variable is missing.
    pub fn from_env() -> Self {
        Self {
            database_url: required("DATABASE_URL"),
            redis_url: std::env::var("REDIS_URL")
                .unwrap_or_else(|_| DEFAULT_REDIS_URL.to_string()),
            push_gateway_url: required("PUSH_GATEWAY_URL"),
            obs_poll_pause: secs("OBS_POLL_PAUSE_SECS", DEFAULT_OBS_POLL_PAUSE_SECS),
            note_poll_pause: secs("NOTE_POLL_PAUSE_SECS", DEFAULT_NOTE_POLL_PAUSE_SECS),
            reaper_pause: secs("REAPER_PAUSE_SECS", DEFAULT_REAPER_PAUSE_SECS),
            lease_max_age: secs("LEASE_MAX_AGE_SECS", DEFAULT_LEASE_MAX_AGE_SECS),
            dequeue_block: secs("DEQUEUE_BLOCK_SECS", DEFAULT_DEQUEUE_BLOCK_SECS),
        }
    }
}

fn required(name: &str) -> String {
    std::env::var(name).unwrap_or_else(|_| {
        tracing::error!("{name} environment variable is required");
        std::process::exit(1);
    })
}

fn secs(name: &str, default: u64) -> Duration {
    let value = std::env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default);
    Duration::from_secs(value)
}

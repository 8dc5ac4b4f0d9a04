//! `pulsewatch-worker` -- observation pipeline daemon.
//!
//! Runs the three pipeline workers against Redis and Postgres: the
//! observation processor, the notification dispatcher, and the lease
//! reaper. Shuts down cleanly on ctrl-c.
//!
//! # Environment variables
//!
//! | Variable                | Required | Default                    | Description                          |
//! |-------------------------|----------|----------------------------|--------------------------------------|
//! | `DATABASE_URL`          | yes      | --                         | Postgres connection string           |
//! | `PUSH_GATEWAY_URL`      | yes      | --                         | Push relay endpoint                  |
//! | `REDIS_URL`             | no       | `redis://127.0.0.1:6379`   | Queue store                          |
//! | `OBS_POLL_PAUSE_SECS`   | no       | `5`                        | Pause between observation drains     |
//! | `NOTE_POLL_PAUSE_SECS`  | no       | `5`                        | Pause between notification drains    |
//! | `REAPER_PAUSE_SECS`     | no       | `20`                       | Pause between reaper scans           |
//! | `LEASE_MAX_AGE_SECS`    | no       | `60`                       | In-progress age before requeue       |
//! | `DEQUEUE_BLOCK_SECS`    | no       | `45`                       | Blocking-dequeue timeout             |

mod config;

use std::sync::Arc;

use tokio_util::sync::CancellationToken;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pulsewatch_pipeline::{
    keys, scheduler, HttpPushGateway, MarkerRateLimiter, NotificationDispatcher,
    ObservationProcessor, PgDirectory, Reaper,
};
use pulsewatch_store::{LeaseQueue, RedisStore};

use crate::config::WorkerConfig;

#[tokio::main]
async fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "pulsewatch_worker=debug,pulsewatch_pipeline=info".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = WorkerConfig::from_env();

    let pool = pulsewatch_db::connect(&config.database_url)
        .await
        .unwrap_or_else(|error| {
            tracing::error!(%error, "Failed to connect to Postgres");
            std::process::exit(1);
        });
    if let Err(error) = pulsewatch_db::health_check(&pool).await {
        tracing::error!(%error, "Postgres health check failed");
        std::process::exit(1);
    }

    let store = RedisStore::connect(&config.redis_url)
        .await
        .unwrap_or_else(|error| {
            tracing::error!(%error, "Failed to connect to Redis");
            std::process::exit(1);
        });
    let store = Arc::new(store);

    let gateway = HttpPushGateway::new(config.push_gateway_url.clone()).unwrap_or_else(|error| {
        tracing::error!(%error, "Failed to build push gateway client");
        std::process::exit(1);
    });

    let directory = Arc::new(PgDirectory::new(pool));
    let limiter = Arc::new(MarkerRateLimiter::new(store.clone()));

    let processor = ObservationProcessor::new(
        LeaseQueue::new(store.clone(), keys::OBS_PENDING, keys::OBS_IN_PROGRESS),
        LeaseQueue::new(store.clone(), keys::NOTE_PENDING, keys::NOTE_IN_PROGRESS),
        directory.clone(),
        limiter,
        config.dequeue_block,
        config.obs_poll_pause,
    );

    let dispatcher = NotificationDispatcher::new(
        LeaseQueue::new(store.clone(), keys::NOTE_PENDING, keys::NOTE_IN_PROGRESS),
        directory,
        Arc::new(gateway),
        config.dequeue_block,
        config.note_poll_pause,
    );

    let reaper = Reaper::new(store, config.lease_max_age, config.reaper_pause);

    tracing::info!(
        redis_url = %config.redis_url,
        obs_poll_pause_secs = config.obs_poll_pause.as_secs(),
        note_poll_pause_secs = config.note_poll_pause.as_secs(),
        reaper_pause_secs = config.reaper_pause.as_secs(),
        lease_max_age_secs = config.lease_max_age.as_secs(),
        "Starting pulsewatch-worker",
    );

    let cancel = CancellationToken::new();
    let handles = vec![
        scheduler::spawn(processor, (), cancel.clone()),
        scheduler::spawn(dispatcher, (), cancel.clone()),
        scheduler::spawn(reaper, Vec::new(), cancel.clone()),
    ];

    if let Err(error) = tokio::signal::ctrl_c().await {
        tracing::error!(%error, "Failed to listen for shutdown signal");
    }
    tracing::info!("Shutting down");
    cancel.cancel();
    for handle in handles {
        if let Err(error) = handle.await {
            tracing::error!(%error, "Worker task panicked");
        }
    }
}

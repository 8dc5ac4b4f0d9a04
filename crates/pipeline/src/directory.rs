//! Device and account lookups used by the pipeline stages.
//!
//! The [`Directory`] trait is the single seam between the queue workers
//! and relational state, which keeps the stages testable with an
//! in-memory fake.

use async_trait::async_trait;
use pulsewatch_core::types::UserId;
use pulsewatch_core::LimitSet;
use pulsewatch_db::models::Device;
use pulsewatch_db::repositories::{ChatLogRepo, DeviceRepo, EndpointRepo, LimitRepo};
use pulsewatch_db::DbPool;

use crate::error::PipelineError;

#[async_trait]
pub trait Directory: Send + Sync {
    /// Device record, or `None` when unregistered.
    async fn device(&self, device_id: &str) -> Result<Option<Device>, PipelineError>;

    /// Limits the given user configured for the device.
    async fn limits_for(&self, device_id: &str, user_id: UserId) -> Result<LimitSet, PipelineError>;

    /// Push endpoint tokens registered for the account.
    async fn push_endpoints(&self, user_id: UserId) -> Result<Vec<String>, PipelineError>;

    /// Append a line to the device chat log.
    async fn append_chat_log(
        &self,
        topic: &str,
        poster: &str,
        content: &str,
    ) -> Result<(), PipelineError>;
}

/// Postgres-backed directory.
pub struct PgDirectory {
    pool: DbPool,
}

impl PgDirectory {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Directory for PgDirectory {
    async fn device(&self, device_id: &str) -> Result<Option<Device>, PipelineError> {
        Ok(DeviceRepo::find_by_id(&self.pool, device_id).await?)
    }

    async fn limits_for(
        &self,
        device_id: &str,
        user_id: UserId,
    ) -> Result<LimitSet, PipelineError> {
        let limits = LimitRepo::list_for(&self.pool, device_id, user_id).await?;
        Ok(LimitSet::new(limits))
    }

    async fn push_endpoints(&self, user_id: UserId) -> Result<Vec<String>, PipelineError> {
        Ok(EndpointRepo::tokens_for_account(&self.pool, user_id).await?)
    }

    async fn append_chat_log(
        &self,
        topic: &str,
        poster: &str,
        content: &str,
    ) -> Result<(), PipelineError> {
        ChatLogRepo::insert(&self.pool, topic, poster, content).await?;
        Ok(())
    }
}

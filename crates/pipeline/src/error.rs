//! Pipeline error type.

use pulsewatch_store::StoreError;

/// Error raised while draining a queue or dispatching a notification.
#[derive(Debug, thiserror::Error)]
pub enum PipelineError {
    /// A queue store operation failed.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// A relational lookup or insert failed.
    #[error("database query failed: {0}")]
    Db(#[from] sqlx::Error),

    /// The push gateway call itself failed (transport or protocol).
    #[error("push gateway error: {0}")]
    Push(String),
}

impl PipelineError {
    /// Whether the worker should stay scheduled and retry next tick.
    pub fn is_transient(&self) -> bool {
        match self {
            PipelineError::Store(e) => e.is_transient(),
            PipelineError::Db(e) => matches!(
                e,
                sqlx::Error::Io(_) | sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed
            ),
            // Push failures never terminate a worker.
            PipelineError::Push(_) => true,
        }
    }
}

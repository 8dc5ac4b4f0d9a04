//! Store error type.

/// Error raised by queue store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The underlying Redis command failed.
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),
}

impl StoreError {
    /// Whether the failure is worth retrying on the next scheduler tick.
    ///
    /// Timeout and I/O class errors are transient: the worker logs and
    /// waits for its next tick. Anything else (protocol errors, type
    /// mismatches) terminates the worker.
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::Redis(e) => {
                e.is_timeout() || e.is_io_error() || e.is_connection_dropped()
            }
        }
    }
}

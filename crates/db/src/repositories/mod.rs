//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async query methods
//! that accept `&PgPool` as the first argument.

pub mod chat_log_repo;
pub mod device_repo;
pub mod endpoint_repo;
pub mod limit_repo;

pub use chat_log_repo::ChatLogRepo;
pub use device_repo::DeviceRepo;
pub use endpoint_repo::EndpointRepo;
pub use limit_repo::LimitRepo;

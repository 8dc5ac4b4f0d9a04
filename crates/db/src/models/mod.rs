//! Entity models mapped from table rows.

pub mod chat;
pub mod device;
pub mod limit;

pub use chat::ChatLogEntry;
pub use device::Device;
pub use limit::DeviceLimitRow;

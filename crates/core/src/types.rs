//! Shared type aliases.

/// Account identifier of a registered user.
pub type UserId = uuid::Uuid;

/// Device identifier (URN-style string assigned at manufacture).
pub type DeviceId = String;

/// UTC timestamp used across entity models.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

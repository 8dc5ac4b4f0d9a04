//! Device entity model.

use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `devices` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Device {
    pub id: String,
    pub name: String,
    /// Absent for registered-but-unclaimed devices.
    pub owner_id: Option<Uuid>,
    pub flags: i32,
}

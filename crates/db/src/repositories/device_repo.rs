//! Repository for the `devices` table.

use sqlx::PgPool;

use crate::models::device::Device;

/// Column list for `devices` queries.
const COLUMNS: &str = "id, name, owner_id, flags";

/// Provides lookup operations for devices.
pub struct DeviceRepo;

impl DeviceRepo {
    /// Find a device by id.
    pub async fn find_by_id(pool: &PgPool, id: &str) -> Result<Option<Device>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM devices WHERE id = $1");
        sqlx::query_as::<_, Device>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }
}

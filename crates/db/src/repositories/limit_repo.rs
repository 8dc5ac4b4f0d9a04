//! Repository for the `device_limits` table.

use pulsewatch_core::DeviceLimit;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::limit::DeviceLimitRow;

/// Column list for `device_limits` queries.
const COLUMNS: &str = "user_id, device_id, limit_type, limit_value, limit_value_str, limit_flag";

/// Provides lookup operations for device limits.
pub struct LimitRepo;

impl LimitRepo {
    /// All limits one user holds for one device.
    ///
    /// Rows with a limit type this build does not recognise are dropped
    /// silently; stale codes must never break alerting.
    pub async fn list_for(
        pool: &PgPool,
        device_id: &str,
        user_id: Uuid,
    ) -> Result<Vec<DeviceLimit>, sqlx::Error> {
        let query =
            format!("SELECT {COLUMNS} FROM device_limits WHERE device_id = $1 AND user_id = $2");
        let rows = sqlx::query_as::<_, DeviceLimitRow>(&query)
            .bind(device_id)
            .bind(user_id)
            .fetch_all(pool)
            .await?;
        Ok(rows.into_iter().filter_map(DeviceLimitRow::into_limit).collect())
    }
}

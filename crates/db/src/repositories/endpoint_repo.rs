//! Repository resolving push endpoints for a user account.

use sqlx::PgPool;
use uuid::Uuid;

/// Provides mobile endpoint resolution.
pub struct EndpointRepo;

impl EndpointRepo {
    /// Device tokens registered under any alias of the given account.
    pub async fn tokens_for_account(
        pool: &PgPool,
        account_id: Uuid,
    ) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT m.device_token FROM mobile_endpoints m \
             JOIN account_aliases a ON a.address = m.alias_id \
             WHERE a.account_id = $1",
        )
        .bind(account_id)
        .fetch_all(pool)
        .await
    }
}

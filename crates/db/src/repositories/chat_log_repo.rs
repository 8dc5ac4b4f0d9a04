//! Repository for the `chatlog` table.

use sqlx::PgPool;

/// Provides the append-only operations the pipeline needs on the chat
/// log; interactive chat CRUD lives with the API service.
pub struct ChatLogRepo;

impl ChatLogRepo {
    /// Append an entry, returning the generated id.
    pub async fn insert(
        pool: &PgPool,
        topic: &str,
        poster: &str,
        content: &str,
    ) -> Result<i64, sqlx::Error> {
        sqlx::query_scalar(
            "INSERT INTO chatlog (topic, poster, content) \
             VALUES ($1, $2, $3) \
             RETURNING id",
        )
        .bind(topic)
        .bind(poster)
        .bind(content)
        .fetch_one(pool)
        .await
    }
}

//! Relational storage for Pulsewatch.
//!
//! Entity models under [`models`], zero-sized repository structs with
//! async methods over `&PgPool` under [`repositories`]. Schema lives in
//! the crate's `migrations/` directory.

pub mod models;
pub mod repositories;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Shared connection pool type used across the workspace.
pub type DbPool = PgPool;

/// Default maximum pool size.
const DEFAULT_MAX_CONNECTIONS: u32 = 5;

/// Connect to Postgres and run pending migrations.
pub async fn connect(database_url: &str) -> Result<DbPool, sqlx::Error> {
    let pool = PgPoolOptions::new()
        .max_connections(DEFAULT_MAX_CONNECTIONS)
        .connect(database_url)
        .await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    Ok(pool)
}

/// Cheap connectivity probe.
pub async fn health_check(pool: &DbPool) -> Result<(), sqlx::Error> {
    sqlx::query("SELECT 1").execute(pool).await?;
    Ok(())
}

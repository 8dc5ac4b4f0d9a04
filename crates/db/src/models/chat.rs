//! Chat log entity model.

use pulsewatch_core::types::Timestamp;
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `chatlog` table.
///
/// Pipeline alert entries use the device id as both topic and poster.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ChatLogEntry {
    pub id: i64,
    pub utc: Timestamp,
    pub topic: String,
    pub poster: String,
    pub content: String,
}

//! Device limit entity model.

use pulsewatch_core::{DeviceLimit, LimitKind};
use sqlx::FromRow;
use uuid::Uuid;

/// A row from the `device_limits` table.
///
/// `limit_type` is the raw wire code; [`DeviceLimitRow::into_limit`]
/// lifts it into the closed [`LimitKind`] enum, skipping codes this
/// build does not know about.
#[derive(Debug, Clone, FromRow)]
pub struct DeviceLimitRow {
    pub user_id: Uuid,
    pub device_id: String,
    pub limit_type: i16,
    pub limit_value: f64,
    pub limit_value_str: Option<String>,
    pub limit_flag: i16,
}

impl DeviceLimitRow {
    /// Convert into the domain limit. Unknown `limit_type` codes yield
    /// `None` and are dropped by the caller.
    pub fn into_limit(self) -> Option<DeviceLimit> {
        let kind = u8::try_from(self.limit_type)
            .ok()
            .and_then(LimitKind::from_code)?;
        Some(DeviceLimit {
            user_id: self.user_id,
            device_id: self.device_id,
            kind,
            value: self.limit_value,
            value_str: self.limit_value_str,
            flag: self.limit_flag,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(limit_type: i16) -> DeviceLimitRow {
        DeviceLimitRow {
            user_id: Uuid::nil(),
            device_id: "D1".into(),
            limit_type,
            limit_value: 30.0,
            limit_value_str: None,
            limit_flag: 0,
        }
    }

    #[test]
    fn known_code_converts() {
        let limit = row(1).into_limit().unwrap();
        assert_eq!(limit.kind, LimitKind::TempHigh);
        assert_eq!(limit.value, 30.0);
    }

    #[test]
    fn unknown_code_is_dropped() {
        assert!(row(99).into_limit().is_none());
        assert!(row(-1).into_limit().is_none());
    }
}

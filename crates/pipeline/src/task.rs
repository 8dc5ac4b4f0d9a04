//! Notification task model and its queue-hash codec.

use pulsewatch_core::types::{DeviceId, UserId};
use pulsewatch_core::LimitKind;

use crate::keys;

/// A pending push notification, produced by the observation processor
/// and consumed by the dispatcher.
///
/// Lifecycle: created behind the dedup guard, enqueued, leased, then
/// deleted on completion. Never redelivered after a push failure.
#[derive(Debug, Clone, PartialEq)]
pub struct NotificationTask {
    /// Backing hash key, unique per task.
    pub key: String,
    pub user_id: UserId,
    pub device_id: DeviceId,
    /// The alert kind that triggered the task.
    pub kind: LimitKind,
    pub observed_value: f64,
    pub battery_level: f64,
    pub charging: bool,
}

impl NotificationTask {
    /// Build a fresh task with a generated key.
    pub fn new(
        user_id: UserId,
        device_id: &str,
        kind: LimitKind,
        observed_value: f64,
        battery_level: f64,
        charging: bool,
    ) -> Self {
        Self {
            key: keys::note_key(),
            user_id,
            device_id: device_id.to_string(),
            kind,
            observed_value,
            battery_level,
            charging,
        }
    }

    /// Decode a task from its queue-hash fields.
    ///
    /// Unlike observations, every field here was written by this
    /// pipeline, so any missing or unparsable field marks the record
    /// corrupt (`None`) and the caller deletes the orphan.
    pub fn from_fields(key: &str, fields: &[(String, String)]) -> Option<Self> {
        fn get<'a>(fields: &'a [(String, String)], name: &str) -> Option<&'a str> {
            fields
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.as_str())
        }
        Some(Self {
            key: key.to_string(),
            user_id: get(fields, "userId")?.parse().ok()?,
            device_id: get(fields, "deviceId")?.to_string(),
            kind: LimitKind::from_code(get(fields, "limitType")?.parse().ok()?)?,
            observed_value: get(fields, "obsValue")?.parse().ok()?,
            battery_level: get(fields, "batteryLevel")?.parse().ok()?,
            charging: get(fields, "charging")?.parse().ok()?,
        })
    }

    /// Encode the task as queue-hash fields.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            ("userId".into(), self.user_id.to_string()),
            ("deviceId".into(), self.device_id.clone()),
            ("limitType".into(), self.kind.code().to_string()),
            ("obsValue".into(), self.observed_value.to_string()),
            ("batteryLevel".into(), self.battery_level.to_string()),
            ("charging".into(), self.charging.to_string()),
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use uuid::Uuid;

    #[test]
    fn codec_round_trips() {
        let task = NotificationTask::new(Uuid::new_v4(), "D1", LimitKind::TempHigh, 35.0, 3.2, true);
        let decoded = NotificationTask::from_fields(&task.key, &task.to_fields()).unwrap();
        assert_eq!(decoded, task);
    }

    #[test]
    fn missing_field_is_corrupt() {
        let task = NotificationTask::new(Uuid::new_v4(), "D1", LimitKind::TempHigh, 35.0, 3.2, true);
        let mut fields = task.to_fields();
        fields.retain(|(k, _)| k != "obsValue");
        assert_matches!(NotificationTask::from_fields(&task.key, &fields), None);
    }

    #[test]
    fn unknown_limit_code_is_corrupt() {
        let task = NotificationTask::new(Uuid::new_v4(), "D1", LimitKind::TempHigh, 35.0, 3.2, true);
        let mut fields = task.to_fields();
        for (k, v) in &mut fields {
            if k == "limitType" {
                *v = "99".into();
            }
        }
        assert_matches!(NotificationTask::from_fields(&task.key, &fields), None);
    }
}

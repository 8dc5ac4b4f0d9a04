//! Sensor observation model and its queue-hash codec.

use serde::{Deserialize, Serialize};

use crate::types::DeviceId;

/// A single telemetry report from a sensor device.
///
/// Produced by device ingestion (outside this subsystem) and consumed
/// by the observation processor. `obs_time` is milliseconds since the
/// Unix epoch, as reported by the device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Observation {
    pub device_id: DeviceId,
    pub obs_time: f64,
    pub charging: bool,
    pub firmware: String,
    pub battery: f64,
    pub temp: f64,
    pub light: i32,
    pub humidity: i32,
    pub accel_x: i32,
    pub accel_y: i32,
    pub accel_z: i32,
}

/// Parse a field, falling back to the default when absent or unparsable.
fn field_or_default<T: std::str::FromStr + Default>(fields: &[(String, String)], name: &str) -> T {
    fields
        .iter()
        .find(|(k, _)| k == name)
        .and_then(|(_, v)| v.parse().ok())
        .unwrap_or_default()
}

impl Observation {
    /// Decode an observation from queue-hash fields.
    ///
    /// The device id is mandatory; every other field defaults when
    /// missing or malformed, matching the lenient wire format devices
    /// actually produce. Returns `None` when the device id is absent,
    /// which the caller treats as a corrupt record.
    pub fn from_fields(fields: &[(String, String)]) -> Option<Self> {
        let device_id = fields
            .iter()
            .find(|(k, _)| k == "deviceid")
            .map(|(_, v)| v.clone())?;
        Some(Self {
            device_id,
            obs_time: field_or_default(fields, "obstime"),
            charging: field_or_default::<i32>(fields, "charging") != 0,
            firmware: field_or_default(fields, "firmware"),
            battery: field_or_default(fields, "battery"),
            temp: field_or_default(fields, "temp"),
            light: field_or_default(fields, "light"),
            humidity: field_or_default(fields, "humidity"),
            accel_x: field_or_default(fields, "accelx"),
            accel_y: field_or_default(fields, "accely"),
            accel_z: field_or_default(fields, "accelz"),
        })
    }

    /// Encode the observation as queue-hash fields.
    pub fn to_fields(&self) -> Vec<(String, String)> {
        vec![
            ("deviceid".into(), self.device_id.clone()),
            ("obstime".into(), self.obs_time.to_string()),
            ("charging".into(), if self.charging { "1" } else { "0" }.into()),
            ("firmware".into(), self.firmware.clone()),
            ("battery".into(), self.battery.to_string()),
            ("temp".into(), self.temp.to_string()),
            ("light".into(), self.light.to_string()),
            ("humidity".into(), self.humidity.to_string()),
            ("accelx".into(), self.accel_x.to_string()),
            ("accely".into(), self.accel_y.to_string()),
            ("accelz".into(), self.accel_z.to_string()),
        ]
    }
}

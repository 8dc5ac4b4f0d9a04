//! Priority-ordered observation classifier.
//!
//! An observation is checked against the owner's limits in a fixed
//! order -- motion, brightness, humidity, temperature -- and the first
//! match wins. The ordering is load-bearing: a reading that is both
//! moving and out of temperature range is a motion alert, never a
//! temperature alert.

use crate::limit::{LimitKind, LimitSet, RangeBand, TemperatureScale};
use crate::observation::Observation;

/// Outcome of classifying one observation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Classification {
    /// The device moved: non-zero movement counter plus a non-zero
    /// lateral or vertical delta.
    Motion { movement: i32 },
    /// Observed brightness outside the configured band.
    LightOutOfRange { value: i32, band: RangeBand },
    /// Observed humidity outside the configured band.
    HumidityOutOfRange { value: i32, band: RangeBand },
    /// Observed temperature outside `[low, high]`.
    TempOutOfRange { value: f64, low: f64, high: f64 },
    /// Nothing violated; informational only.
    CheckIn,
}

impl Classification {
    /// Whether this classification produces an alert (chat entry and,
    /// subject to the cooldown guard, a notification).
    pub fn is_alert(&self) -> bool {
        !matches!(self, Classification::CheckIn)
    }

    /// The limit kind recorded on the resulting notification task.
    pub fn limit_kind(&self) -> Option<LimitKind> {
        match self {
            Classification::Motion { .. } => Some(LimitKind::MovementLevel),
            Classification::LightOutOfRange { .. } => Some(LimitKind::LightLevel),
            Classification::HumidityOutOfRange { .. } => Some(LimitKind::HumidityLevel),
            Classification::TempOutOfRange { value, high, .. } => {
                if *value > *high {
                    Some(LimitKind::TempHigh)
                } else {
                    Some(LimitKind::TempLow)
                }
            }
            Classification::CheckIn => None,
        }
    }

    /// The raw observed value carried on the notification task.
    pub fn observed_value(&self) -> Option<f64> {
        match self {
            Classification::Motion { movement } => Some(f64::from(*movement)),
            Classification::LightOutOfRange { value, .. } => Some(f64::from(*value)),
            Classification::HumidityOutOfRange { value, .. } => Some(f64::from(*value)),
            Classification::TempOutOfRange { value, .. } => Some(*value),
            Classification::CheckIn => None,
        }
    }

    /// Human-readable chat-log line for alerting classifications.
    pub fn chat_message(&self, device_name: &str, scale: TemperatureScale) -> Option<String> {
        match self {
            Classification::Motion { movement } => {
                Some(format!("{device_name} has been moved (movement {movement})"))
            }
            Classification::LightOutOfRange { value, band } => Some(format!(
                "{device_name} brightness is reaching {value} (allowed {} to {})",
                band.low, band.high
            )),
            Classification::HumidityOutOfRange { value, band } => Some(format!(
                "{device_name} humidity is reaching {value}% (allowed {}% to {}%)",
                band.low, band.high
            )),
            Classification::TempOutOfRange { value, .. } => Some(format!(
                "{device_name} temperature is reaching {}",
                scale.format_celsius(*value)
            )),
            Classification::CheckIn => None,
        }
    }
}

/// Format an observed value for display, per the alert kind.
pub fn format_observed(kind: LimitKind, value: f64, scale: TemperatureScale) -> String {
    match kind {
        LimitKind::TempHigh | LimitKind::TempLow => scale.format_celsius(value),
        LimitKind::BatteryLevel | LimitKind::HumidityLevel => format!("{value}%"),
        _ => value.to_string(),
    }
}

/// Classify one observation against the owner's limit set.
pub fn classify(obs: &Observation, limits: &LimitSet) -> Classification {
    // Motion wins over everything.
    if obs.accel_x != 0 && (obs.accel_y != 0 || obs.accel_z != 0) {
        return Classification::Motion {
            movement: obs.accel_x + obs.accel_y + obs.accel_z,
        };
    }

    if let Some(packed) = limits.value(LimitKind::LightLevel) {
        let band = RangeBand::unpack(packed);
        if !band.contains(obs.light) {
            return Classification::LightOutOfRange {
                value: obs.light,
                band,
            };
        }
    }

    if let Some(packed) = limits.value(LimitKind::HumidityLevel) {
        let band = RangeBand::unpack(packed);
        if !band.contains(obs.humidity) {
            return Classification::HumidityOutOfRange {
                value: obs.humidity,
                band,
            };
        }
    }

    // Temperature needs both bounds configured.
    if let (Some(low), Some(high)) = (
        limits.value(LimitKind::TempLow),
        limits.value(LimitKind::TempHigh),
    ) {
        if obs.temp < low || obs.temp > high {
            return Classification::TempOutOfRange {
                value: obs.temp,
                low,
                high,
            };
        }
    }

    Classification::CheckIn
}

//! User-configured device thresholds.
//!
//! Every alerting decision is driven by [`DeviceLimit`] rows owned by a
//! user for a device. The limit kind is a closed enum with stable wire
//! codes; unknown codes found in storage are skipped rather than
//! errored on, so old rows never poison the pipeline.

use serde::{Deserialize, Serialize};

use crate::types::{DeviceId, UserId};

// ---------------------------------------------------------------------------
// LimitKind
// ---------------------------------------------------------------------------

/// The dimension a threshold applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LimitKind {
    /// Upper temperature bound; alerts pair it with [`LimitKind::TempLow`].
    TempHigh,
    /// Lower temperature bound.
    TempLow,
    /// Movement sensitivity; any non-zero value enables motion alerts.
    MovementLevel,
    /// Battery level bound (reserved; not classified on today).
    BatteryLevel,
    /// Non-zero value = notification cooldown in seconds for this device.
    Notifications,
    /// Display scale preference, see [`TemperatureScale`].
    TempScale,
    /// Accent colour hex string carried on push payloads.
    Colour,
    /// Device report interval in seconds.
    Interval,
    /// Packed acceptable brightness band, see [`RangeBand`].
    LightLevel,
    /// Packed acceptable humidity band.
    HumidityLevel,
}

impl LimitKind {
    /// Stable storage/wire code for this kind.
    pub fn code(self) -> u8 {
        match self {
            LimitKind::TempHigh => 1,
            LimitKind::TempLow => 2,
            LimitKind::MovementLevel => 3,
            LimitKind::BatteryLevel => 4,
            LimitKind::Notifications => 5,
            LimitKind::TempScale => 6,
            LimitKind::Colour => 7,
            LimitKind::Interval => 8,
            LimitKind::LightLevel => 9,
            LimitKind::HumidityLevel => 10,
        }
    }

    /// Decode a storage/wire code. Unknown codes yield `None`.
    pub fn from_code(code: u8) -> Option<Self> {
        Some(match code {
            1 => LimitKind::TempHigh,
            2 => LimitKind::TempLow,
            3 => LimitKind::MovementLevel,
            4 => LimitKind::BatteryLevel,
            5 => LimitKind::Notifications,
            6 => LimitKind::TempScale,
            7 => LimitKind::Colour,
            8 => LimitKind::Interval,
            9 => LimitKind::LightLevel,
            10 => LimitKind::HumidityLevel,
            _ => return None,
        })
    }

    /// Human-readable label used in alert titles and bodies.
    pub fn label(self) -> &'static str {
        match self {
            LimitKind::TempHigh => "High Temperature",
            LimitKind::TempLow => "Low Temperature",
            LimitKind::MovementLevel => "Movement",
            LimitKind::BatteryLevel => "Battery Level",
            LimitKind::Notifications => "Notifications",
            LimitKind::TempScale => "Temperature Scale",
            LimitKind::Colour => "Colour",
            LimitKind::Interval => "Report Interval",
            LimitKind::LightLevel => "Brightness",
            LimitKind::HumidityLevel => "Humidity",
        }
    }
}

impl std::fmt::Display for LimitKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

// ---------------------------------------------------------------------------
// DeviceLimit / LimitSet
// ---------------------------------------------------------------------------

/// A single threshold a user configured for a device.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceLimit {
    pub user_id: UserId,
    pub device_id: DeviceId,
    pub kind: LimitKind,
    pub value: f64,
    pub value_str: Option<String>,
    pub flag: i16,
}

/// The full set of limits one user holds for one device.
#[derive(Debug, Clone, Default)]
pub struct LimitSet {
    limits: Vec<DeviceLimit>,
}

impl LimitSet {
    pub fn new(limits: Vec<DeviceLimit>) -> Self {
        Self { limits }
    }

    pub fn is_empty(&self) -> bool {
        self.limits.is_empty()
    }

    /// First limit of the given kind, if configured.
    pub fn get(&self, kind: LimitKind) -> Option<&DeviceLimit> {
        self.limits.iter().find(|l| l.kind == kind)
    }

    /// Numeric value of the given kind, if configured.
    pub fn value(&self, kind: LimitKind) -> Option<f64> {
        self.get(kind).map(|l| l.value)
    }

    /// String value of the given kind, if configured.
    pub fn value_str(&self, kind: LimitKind) -> Option<&str> {
        self.get(kind).and_then(|l| l.value_str.as_deref())
    }

    /// Display scale, defaulting to Celsius when unset or unrecognised.
    pub fn temp_scale(&self) -> TemperatureScale {
        self.value(LimitKind::TempScale)
            .map(TemperatureScale::from_value)
            .unwrap_or(TemperatureScale::Celsius)
    }
}

// ---------------------------------------------------------------------------
// TemperatureScale
// ---------------------------------------------------------------------------

/// Display-only temperature scale preference.
///
/// Comparisons against temperature limits are always performed in the
/// stored unit (Celsius); the scale affects formatting alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TemperatureScale {
    Celsius,
    Fahrenheit,
}

impl TemperatureScale {
    /// Decode from a stored limit value (non-zero = Fahrenheit).
    pub fn from_value(value: f64) -> Self {
        if value as i64 == 0 {
            TemperatureScale::Celsius
        } else {
            TemperatureScale::Fahrenheit
        }
    }

    /// Format a Celsius reading for display in this scale.
    pub fn format_celsius(self, celsius: f64) -> String {
        match self {
            TemperatureScale::Celsius => format!("{celsius:.1}°C"),
            TemperatureScale::Fahrenheit => format!("{:.1}°F", celsius * 9.0 / 5.0 + 32.0),
        }
    }
}

// ---------------------------------------------------------------------------
// RangeBand
// ---------------------------------------------------------------------------

/// An acceptable `[low, high]` band packed into a single limit value.
///
/// The low byte of the integer part is the lower bound, the next byte
/// the upper bound. Devices have been observed storing the bytes in
/// either order, so unordered bounds are swapped on decode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RangeBand {
    pub low: u8,
    pub high: u8,
}

impl RangeBand {
    /// Decode a packed limit value into an ordered band.
    pub fn unpack(packed: f64) -> Self {
        let raw = packed as i64 as u64;
        let a = (raw & 0xff) as u8;
        let b = ((raw >> 8) & 0xff) as u8;
        if a <= b {
            Self { low: a, high: b }
        } else {
            Self { low: b, high: a }
        }
    }

    /// Whether the observed value sits inside the band (inclusive).
    pub fn contains(self, value: i32) -> bool {
        value >= i32::from(self.low) && value <= i32::from(self.high)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn limit_kind_codes_round_trip() {
        for code in 1..=10u8 {
            let kind = LimitKind::from_code(code).unwrap();
            assert_eq!(kind.code(), code);
        }
        assert_eq!(LimitKind::from_code(0), None);
        assert_eq!(LimitKind::from_code(99), None);
    }

    #[test]
    fn unpack_low_high_band() {
        // 0x1E0A: low byte 10, high byte 30.
        let band = RangeBand::unpack(0x1E0A as f64);
        assert_eq!(band, RangeBand { low: 10, high: 30 });
        assert!(band.contains(10));
        assert!(band.contains(30));
        assert!(band.contains(20));
        assert!(!band.contains(5));
        assert!(!band.contains(35));
    }

    #[test]
    fn unpack_swaps_unordered_bounds() {
        // low byte 30, high byte 10 -- must normalise to [10, 30].
        let band = RangeBand::unpack(0x0A1E as f64);
        assert_eq!(band, RangeBand { low: 10, high: 30 });
    }

    #[test]
    fn fahrenheit_formatting() {
        assert_eq!(TemperatureScale::Celsius.format_celsius(35.0), "35.0°C");
        assert_eq!(TemperatureScale::Fahrenheit.format_celsius(35.0), "95.0°F");
    }

    #[test]
    fn temp_scale_from_value() {
        assert_eq!(TemperatureScale::from_value(0.0), TemperatureScale::Celsius);
        assert_eq!(
            TemperatureScale::from_value(1.0),
            TemperatureScale::Fahrenheit
        );
    }
}

//! Pulsewatch domain types.
//!
//! Pure data structures and functions shared across the pipeline:
//!
//! - [`Observation`] -- a single sensor reading as reported by a device.
//! - [`DeviceLimit`] / [`LimitKind`] -- user-configured alert thresholds.
//! - [`classify`] -- the priority-ordered alert classifier.
//!
//! This crate has no internal dependencies and performs no I/O.

pub mod classify;
pub mod limit;
pub mod observation;
pub mod types;

pub use classify::{classify, format_observed, Classification};
pub use limit::{DeviceLimit, LimitKind, LimitSet, RangeBand, TemperatureScale};
pub use observation::Observation;

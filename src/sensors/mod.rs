//! Sensor subsystem.  The mask has a single sensor: the battery divider.

pub mod battery;

pub use battery::{BatteryEstimator, BatteryMonitor};

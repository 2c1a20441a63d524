//! Li-ion cell monitoring through a resistor divider on ADC1.
//!
//! [`BatteryEstimator`] is the pure voltage→percentage map used by the
//! status report.  [`BatteryMonitor`] samples the divider and converts
//! the raw code to cell volts.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1_CH6 (GPIO 34) via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

use core::sync::atomic::{AtomicU16, Ordering};

use crate::config::BatteryConfig;
use crate::error::SensorError;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;

/// Full-charge code for the default divider (≈4.2 V cell).
static SIM_BATTERY_ADC: AtomicU16 = AtomicU16::new(2606);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_battery_adc(raw: u16) {
    SIM_BATTERY_ADC.store(raw, Ordering::Relaxed);
}

// ── Estimator ─────────────────────────────────────────────────

/// Linear discharge-curve estimate between `min_voltage` and `max_voltage`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BatteryEstimator {
    min_voltage: f32,
    max_voltage: f32,
}

impl BatteryEstimator {
    pub fn new(config: &BatteryConfig) -> Self {
        Self {
            min_voltage: config.min_voltage,
            max_voltage: config.max_voltage,
        }
    }

    /// Charge percentage, truncated and clamped to 0..=100.
    pub fn percentage(&self, voltage: f32) -> u8 {
        if voltage.is_nan() || voltage <= self.min_voltage {
            return 0;
        }
        if voltage >= self.max_voltage {
            return 100;
        }
        let span = self.max_voltage - self.min_voltage;
        let pct = (voltage - self.min_voltage) / span * 100.0;
        (pct as u8).min(100)
    }
}

impl Default for BatteryEstimator {
    fn default() -> Self {
        Self::new(&BatteryConfig::default())
    }
}

// ── ADC monitor ───────────────────────────────────────────────

pub struct BatteryMonitor {
    cal: BatteryConfig,
}

impl BatteryMonitor {
    pub fn new(cal: BatteryConfig) -> Self {
        Self { cal }
    }

    /// Sample the divider and return the cell voltage.
    pub fn read_voltage(&mut self) -> Result<f32, SensorError> {
        let raw = self.read_adc()?;
        Ok(self.raw_to_volts(raw))
    }

    /// `raw / adc_max × reference × divider`.
    pub fn raw_to_volts(&self, raw: u16) -> f32 {
        let c = &self.cal;
        f32::from(raw) / c.adc_max * c.adc_reference_voltage * c.divider_ratio
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(hw_init::ADC1_CH_BATTERY)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        let raw = SIM_BATTERY_ADC.load(Ordering::Relaxed);
        if f32::from(raw) > self.cal.adc_max {
            return Err(SensorError::OutOfRange);
        }
        Ok(raw)
    }
}

//! Device configuration parameters
//!
//! All tunable parameters for the massage mask: actuator PWM limits,
//! pattern timings, and battery calibration.  Defaults match the shipped
//! hardware; a build-time JSON override can replace any of them.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Upper bound on motor channels (ESP32 LEDC low-speed mode has 8; the
/// duty vector reserves room for larger boards).
pub const MAX_ACTUATORS: usize = 16;

/// Core device configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    // --- Actuators ---
    /// Number of vibration motors on the mask
    pub actuator_count: u8,
    /// Highest duty value ever written to a motor (safety ceiling)
    pub max_duty: u16,
    /// PWM carrier frequency (Hz)
    pub pwm_frequency_hz: u32,
    /// PWM duty resolution (bits)
    pub pwm_resolution_bits: u8,

    // --- Timing ---
    /// Minimum interval between pattern updates (milliseconds)
    pub pattern_interval_ms: u32,
    /// Per-pattern periods
    pub patterns: PatternTiming,

    // --- Battery ---
    pub battery: BatteryConfig,
}

/// Periods for every time-varying pattern, in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PatternTiming {
    pub pulse_on_ms: u32,
    pub pulse_cycle_ms: u32,
    pub wave_step_ms: u32,
    pub heartbeat_short_on_ms: u32,
    pub heartbeat_short_off_ms: u32,
    pub heartbeat_long_pause_ms: u32,
    pub raindrop_step_ms: u32,
    pub raindrop_tap_ms: u32,
    /// Probability (0-100) that a raindrop step starts a tap
    pub raindrop_chance_percent: u8,
}

impl PatternTiming {
    /// Full heartbeat period: beat, gap, beat, rest.
    pub fn heartbeat_cycle_ms(&self) -> u64 {
        2 * u64::from(self.heartbeat_short_on_ms)
            + u64::from(self.heartbeat_short_off_ms)
            + u64::from(self.heartbeat_long_pause_ms)
    }
}

/// Battery divider and discharge-curve calibration.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BatteryConfig {
    /// Cell voltage reported as 0 %
    pub min_voltage: f32,
    /// Cell voltage reported as 100 %
    pub max_voltage: f32,
    /// Resistor divider ratio between cell and ADC pin
    pub divider_ratio: f32,
    /// Full-scale ADC code
    pub adc_max: f32,
    /// ADC reference voltage
    pub adc_reference_voltage: f32,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            // Actuators
            actuator_count: 8,
            max_duty: 178, // 70% of 8-bit full scale
            pwm_frequency_hz: 5000,
            pwm_resolution_bits: 8,

            // Timing
            pattern_interval_ms: 50, // 20 Hz
            patterns: PatternTiming::default(),

            battery: BatteryConfig::default(),
        }
    }
}

impl Default for PatternTiming {
    fn default() -> Self {
        Self {
            pulse_on_ms: 500,
            pulse_cycle_ms: 1500,
            wave_step_ms: 200,
            heartbeat_short_on_ms: 150,
            heartbeat_short_off_ms: 100,
            heartbeat_long_pause_ms: 700,
            raindrop_step_ms: 150,
            raindrop_tap_ms: 80,
            raindrop_chance_percent: 30,
        }
    }
}

impl Default for BatteryConfig {
    fn default() -> Self {
        Self {
            min_voltage: 3.0,
            max_voltage: 4.2, // Li-ion full charge
            divider_ratio: 2.0,
            adc_max: 4095.0, // 12-bit
            adc_reference_voltage: 3.3,
        }
    }
}

impl DeviceConfig {
    /// Largest duty the PWM peripheral can represent at the configured resolution.
    pub fn pwm_full_scale(&self) -> u32 {
        (1u32 << u32::from(self.pwm_resolution_bits.min(16))) - 1
    }

    /// Reject values that would make the patterns or the PWM output meaningless.
    pub fn validate(&self) -> Result<()> {
        if self.actuator_count == 0 || usize::from(self.actuator_count) > MAX_ACTUATORS {
            return Err(Error::Config("actuator_count must be 1..=16"));
        }
        if self.pwm_resolution_bits == 0 || self.pwm_resolution_bits > 16 {
            return Err(Error::Config("pwm_resolution_bits must be 1..=16"));
        }
        if self.max_duty == 0 || u32::from(self.max_duty) > self.pwm_full_scale() {
            return Err(Error::Config("max_duty must be within the PWM resolution"));
        }
        if self.pwm_frequency_hz == 0 {
            return Err(Error::Config("pwm_frequency_hz must be non-zero"));
        }
        if self.pattern_interval_ms == 0 {
            return Err(Error::Config("pattern_interval_ms must be non-zero"));
        }

        let p = &self.patterns;
        if p.pulse_cycle_ms == 0 || p.pulse_on_ms > p.pulse_cycle_ms {
            return Err(Error::Config("pulse_on_ms must fit inside a non-zero pulse_cycle_ms"));
        }
        if p.wave_step_ms == 0 || p.raindrop_step_ms == 0 {
            return Err(Error::Config("wave and raindrop steps must be non-zero"));
        }
        if p.heartbeat_cycle_ms() == 0 {
            return Err(Error::Config("heartbeat cycle must be non-zero"));
        }
        if p.raindrop_chance_percent > 100 {
            return Err(Error::Config("raindrop_chance_percent must be 0..=100"));
        }

        let b = &self.battery;
        if b.min_voltage.is_nan() || b.max_voltage.is_nan() || b.min_voltage >= b.max_voltage {
            return Err(Error::Config("battery min_voltage must be below max_voltage"));
        }
        if b.adc_max <= 0.0 || b.divider_ratio <= 0.0 || b.adc_reference_voltage <= 0.0 {
            return Err(Error::Config("battery ADC calibration must be positive"));
        }
        Ok(())
    }

    /// Parse a JSON override document and validate it.
    ///
    /// Missing fields keep their defaults, so an override only needs to
    /// name what it changes.
    pub fn from_json(bytes: &[u8]) -> Result<Self> {
        let config: Self =
            serde_json::from_slice(bytes).map_err(|_| Error::Config("malformed JSON override"))?;
        config.validate()?;
        Ok(config)
    }
}

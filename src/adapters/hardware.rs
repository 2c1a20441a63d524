//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`MotorArray`] and the [`BatteryMonitor`], exposing them
//! through [`ActuatorPort`] and [`BatteryPort`].  This is the only
//! module in the system that touches actual hardware.  On non-espidf
//! targets, the underlying drivers use cfg-gated simulation stubs.

use embedded_hal::pwm::SetDutyCycle;

use crate::app::ports::{ActuatorPort, BatteryPort};
use crate::drivers::motors::MotorArray;
use crate::error::{ActuatorError, SensorError};
use crate::sensors::battery::BatteryMonitor;

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<P: SetDutyCycle> {
    motors: MotorArray<P>,
    battery: BatteryMonitor,
}

impl<P: SetDutyCycle> HardwareAdapter<P> {
    pub fn new(motors: MotorArray<P>, battery: BatteryMonitor) -> Self {
        Self { motors, battery }
    }

    pub fn motors(&self) -> &MotorArray<P> {
        &self.motors
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<P: SetDutyCycle> ActuatorPort for HardwareAdapter<P> {
    fn actuator_count(&self) -> usize {
        self.motors.len()
    }

    fn set_duty(&mut self, index: usize, duty: u16) -> Result<(), ActuatorError> {
        self.motors.set(index, duty)
    }

    fn apply(&mut self, duties: &[u16]) -> Result<(), ActuatorError> {
        self.motors.apply(duties)
    }

    fn stop_all(&mut self) -> Result<(), ActuatorError> {
        self.motors.stop_all()
    }
}

// ── BatteryPort implementation ────────────────────────────────

impl<P: SetDutyCycle> BatteryPort for HardwareAdapter<P> {
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        self.battery.read_voltage()
    }
}

//! Port traits — the hexagonal boundary between domain logic and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ AppService (domain)
//! ```
//!
//! Driven adapters (motors, battery ADC, BLE link, event sinks) implement
//! these traits.  The [`AppService`](super::service::AppService) consumes
//! them via generics, so the domain core never touches hardware directly.
//!
//! Every hardware-facing call is allowed to fail; the core logs the
//! failure and keeps ticking.

use crate::error::{ActuatorError, LinkError, SensorError};

use super::events::{AppEvent, LinkEvent};

// ───────────────────────────────────────────────────────────────
// Actuator port (driven adapter: domain → hardware)
// ───────────────────────────────────────────────────────────────

/// Write-side port: the domain calls this to drive the vibration motors.
pub trait ActuatorPort {
    /// Number of motors behind this port.
    fn actuator_count(&self) -> usize;

    /// Set one motor.  Out-of-range indices are ignored.
    fn set_duty(&mut self, index: usize, duty: u16) -> Result<(), ActuatorError>;

    /// Apply a full duty vector.  Every motor is attempted; the first
    /// failure is reported.
    fn apply(&mut self, duties: &[u16]) -> Result<(), ActuatorError> {
        let mut first_err = None;
        for (index, &duty) in duties.iter().enumerate() {
            if let Err(e) = self.set_duty(index, duty) {
                first_err.get_or_insert(e);
            }
        }
        first_err.map_or(Ok(()), Err)
    }

    /// Drive every motor to zero.
    fn stop_all(&mut self) -> Result<(), ActuatorError>;
}

// ───────────────────────────────────────────────────────────────
// Battery port (driven adapter: hardware → domain)
// ───────────────────────────────────────────────────────────────

/// Read-side port for the cell voltage.
pub trait BatteryPort {
    /// Calibrated cell voltage in volts.
    fn read_voltage(&mut self) -> Result<f32, SensorError>;
}

// ───────────────────────────────────────────────────────────────
// Link port (driven adapter: domain ↔ wireless serial link)
// ───────────────────────────────────────────────────────────────

/// Bidirectional text link to the phone app.
///
/// Inbound traffic arrives as [`LinkEvent`]s so the domain never sees
/// transport-library callback types.
pub trait LinkPort {
    /// Next pending event, if any.  Never blocks.
    fn poll_event(&mut self) -> Option<LinkEvent>;

    /// Send one response line.  The adapter adds the line terminator.
    fn send(&mut self, line: &str) -> Result<(), LinkError>;

    fn is_connected(&self) -> bool;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: domain → logging / telemetry)
// ───────────────────────────────────────────────────────────────

/// The domain emits structured [`AppEvent`]s through this port.
pub trait EventSink {
    fn emit(&mut self, event: &AppEvent);
}

//! Vibration motor array.
//!
//! One PWM output per coin motor, driven through the embedded-hal
//! [`SetDutyCycle`] trait so the same driver runs on LEDC channels on the
//! ESP32 and on recording mocks in tests.
//!
//! Every duty is clamped to the configured `max_duty` ceiling before it
//! reaches a channel.  A failed channel write marks the array degraded
//! but never stops the remaining channels from being written.

use embedded_hal::pwm::SetDutyCycle;
use log::warn;

use crate::config::MAX_ACTUATORS;
use crate::error::ActuatorError;

pub struct MotorArray<P: SetDutyCycle> {
    channels: heapless::Vec<P, MAX_ACTUATORS>,
    /// Last value successfully written, per channel.
    duties: heapless::Vec<u16, MAX_ACTUATORS>,
    max_duty: u16,
    degraded: bool,
}

impl<P: SetDutyCycle> MotorArray<P> {
    /// Take ownership of up to [`MAX_ACTUATORS`] channels; extras are dropped.
    pub fn new(channels: impl IntoIterator<Item = P>, max_duty: u16) -> Self {
        let channels: heapless::Vec<P, MAX_ACTUATORS> =
            channels.into_iter().take(MAX_ACTUATORS).collect();
        let mut duties = heapless::Vec::new();
        let _ = duties.resize(channels.len(), 0);
        Self {
            channels,
            duties,
            max_duty,
            degraded: false,
        }
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    pub fn max_duty(&self) -> u16 {
        self.max_duty
    }

    /// `true` once any channel write has failed.
    pub fn is_degraded(&self) -> bool {
        self.degraded
    }

    pub fn duties(&self) -> &[u16] {
        &self.duties
    }

    /// Set one motor.  Indices past the last channel are ignored.
    pub fn set(&mut self, index: usize, duty: u16) -> Result<(), ActuatorError> {
        let duty = duty.min(self.max_duty);
        let Some(channel) = self.channels.get_mut(index) else {
            return Ok(());
        };
        if channel.set_duty_cycle(duty).is_err() {
            self.degraded = true;
            warn!("MOTOR | write failed ch={} duty={}", index, duty);
            return Err(ActuatorError::PwmWriteFailed(index as u8));
        }
        self.duties[index] = duty;
        Ok(())
    }

    /// Same duty on every motor.
    pub fn set_all(&mut self, duty: u16) -> Result<(), ActuatorError> {
        let mut result = Ok(());
        for index in 0..self.channels.len() {
            if let Err(e) = self.set(index, duty) {
                result = result.and(Err(e));
            }
        }
        result
    }

    pub fn stop_all(&mut self) -> Result<(), ActuatorError> {
        self.set_all(0)
    }

    /// Write `duties[i]` to motor `i`.  Extra entries are ignored; motors
    /// without an entry keep their current duty.
    pub fn apply(&mut self, duties: &[u16]) -> Result<(), ActuatorError> {
        if self.channels.is_empty() {
            return Err(ActuatorError::NoChannels);
        }
        let mut result = Ok(());
        for (index, &duty) in duties.iter().enumerate().take(self.channels.len()) {
            if let Err(e) = self.set(index, duty) {
                result = result.and(Err(e));
            }
        }
        result
    }
}

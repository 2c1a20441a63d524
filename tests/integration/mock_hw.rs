//! Mock adapters for integration tests.
//!
//! Records every port call so tests can assert on the full history
//! without touching real PWM, ADC or BLE registers.

use std::collections::VecDeque;

use massagemask::app::events::{AppEvent, LinkEvent};
use massagemask::app::ports::{ActuatorPort, BatteryPort, EventSink, LinkPort};
use massagemask::error::{ActuatorError, LinkError, SensorError};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetDuty { index: usize, duty: u16 },
    Apply(Vec<u16>),
    StopAll,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub motors: usize,
    /// Voltage returned by the battery port; `None` simulates an ADC failure.
    pub voltage: Option<f32>,
    /// Make every actuator write fail.
    pub broken: bool,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            motors: 8,
            voltage: Some(4.2),
            broken: false,
        }
    }

    /// Most recent full duty vector written.
    pub fn last_applied(&self) -> Option<&[u16]> {
        self.calls.iter().rev().find_map(|c| match c {
            ActuatorCall::Apply(v) => Some(v.as_slice()),
            _ => None,
        })
    }

    pub fn apply_count(&self) -> usize {
        self.calls
            .iter()
            .filter(|c| matches!(c, ActuatorCall::Apply(_)))
            .count()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockHardware {
    fn actuator_count(&self) -> usize {
        self.motors
    }

    fn set_duty(&mut self, index: usize, duty: u16) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::SetDuty { index, duty });
        if self.broken {
            return Err(ActuatorError::PwmWriteFailed(index as u8));
        }
        Ok(())
    }

    fn apply(&mut self, duties: &[u16]) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::Apply(duties.to_vec()));
        if self.broken {
            return Err(ActuatorError::PwmWriteFailed(0));
        }
        Ok(())
    }

    fn stop_all(&mut self) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::StopAll);
        if self.broken {
            return Err(ActuatorError::PwmWriteFailed(0));
        }
        Ok(())
    }
}

impl BatteryPort for MockHardware {
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        self.voltage.ok_or(SensorError::AdcReadFailed)
    }
}

// ── MockLink ──────────────────────────────────────────────────

pub struct MockLink {
    pub inbound: VecDeque<LinkEvent>,
    pub sent: Vec<String>,
    pub connected: bool,
}

#[allow(dead_code)]
impl MockLink {
    pub fn new() -> Self {
        Self {
            inbound: VecDeque::new(),
            sent: Vec::new(),
            connected: false,
        }
    }

    /// A link with a central already attached.
    pub fn connected() -> Self {
        Self {
            connected: true,
            ..Self::new()
        }
    }

    pub fn queue_connect(&mut self) {
        self.inbound.push_back(LinkEvent::Connected);
    }

    pub fn queue_disconnect(&mut self) {
        self.inbound.push_back(LinkEvent::Disconnected);
    }

    pub fn queue_bytes(&mut self, data: &[u8]) {
        let mut buf = heapless::Vec::new();
        buf.extend_from_slice(data).expect("test chunk too large");
        self.inbound.push_back(LinkEvent::Received(buf));
    }

    /// Take everything sent so far.
    pub fn drain_sent(&mut self) -> Vec<String> {
        std::mem::take(&mut self.sent)
    }
}

impl Default for MockLink {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkPort for MockLink {
    fn poll_event(&mut self) -> Option<LinkEvent> {
        let event = self.inbound.pop_front()?;
        match event {
            LinkEvent::Connected => self.connected = true,
            LinkEvent::Disconnected => self.connected = false,
            LinkEvent::Received(_) => {}
        }
        Some(event)
    }

    fn send(&mut self, line: &str) -> Result<(), LinkError> {
        if !self.connected {
            return Err(LinkError::NotConnected);
        }
        self.sent.push(line.to_owned());
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.connected
    }
}

// ── LogSink ───────────────────────────────────────────────────

/// Event sink that records every emitted event.
pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn contains(&self, event: &AppEvent) -> bool {
        self.events.contains(event)
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

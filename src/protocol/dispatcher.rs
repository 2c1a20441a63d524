//! Command dispatcher: bytes in, session mutations and response lines out.
//!
//! The dispatcher owns the line buffer, so fragments from successive
//! link writes are stitched together across calls.  It mutates the
//! [`SessionState`] it is handed but never touches hardware, apart from
//! sampling the battery when a status report needs it.

use core::fmt::Write;

use log::{info, warn};

use crate::app::ports::BatteryPort;
use crate::sensors::battery::BatteryEstimator;
use crate::session::SessionState;

use super::Response;
use super::codec::{DecodedLine, LineDecoder, trim_ascii};
use super::command::{Command, CommandError, parse_line};
use super::status::StatusReporter;

/// One handled line: what it parsed to and what to send back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatched {
    pub command: Command,
    pub response: Response,
}

pub struct CommandDispatcher {
    decoder: LineDecoder,
    estimator: BatteryEstimator,
}

impl CommandDispatcher {
    pub fn new(estimator: BatteryEstimator) -> Self {
        Self {
            decoder: LineDecoder::new(),
            estimator,
        }
    }

    /// Buffer `bytes` and handle every line they complete, in order.
    ///
    /// Blank lines are skipped without a response.  Bytes after the last
    /// terminator stay buffered for the next call.
    pub fn ingest(
        &mut self,
        bytes: &[u8],
        session: &mut SessionState,
        now_ms: u64,
        battery: &mut impl BatteryPort,
    ) -> Vec<Dispatched> {
        let mut out = Vec::new();
        for &byte in bytes {
            let Some(decoded) = self.decoder.push(byte) else {
                continue;
            };
            let command = match decoded {
                DecodedLine::Line(raw) => {
                    let line = trim_ascii(&raw);
                    if line.is_empty() {
                        continue;
                    }
                    parse_line(line)
                }
                DecodedLine::TooLong => Command::Invalid(CommandError::LineTooLong),
            };
            let response = self.execute(command, session, now_ms, battery);
            out.push(Dispatched { command, response });
        }
        out
    }

    /// Drop any partial line, e.g. when the central disconnects.
    pub fn reset(&mut self) {
        self.decoder.reset();
    }

    pub fn pending(&self) -> usize {
        self.decoder.pending()
    }

    fn execute(
        &self,
        command: Command,
        session: &mut SessionState,
        now_ms: u64,
        battery: &mut impl BatteryPort,
    ) -> Response {
        let mut response = Response::new();
        // Every response fits in RESPONSE_CAPACITY; a failed write only truncates.
        match command {
            Command::SetMode { mode, intensity } => {
                session.set_mode(mode);
                session.set_intensity(i32::from(intensity));
                info!("CMD | mode={:?} intensity={}", mode, session.intensity());
                let _ = write!(
                    response,
                    "OK: Mode={} Intensity={}",
                    mode.as_u8(),
                    session.intensity()
                );
            }
            Command::SetTimer { duration_secs } => {
                session.start_timer(i64::from(duration_secs), now_ms);
                info!("CMD | timer={}s", duration_secs);
                let _ = write!(response, "OK: Timer set for {} seconds", duration_secs);
            }
            Command::StatusRequest => {
                let pct = self.battery_percent(battery);
                response = StatusReporter::report(session, now_ms, pct);
            }
            Command::Invalid(err) => {
                warn!("CMD | rejected: {}", err);
                let _ = response.push_str(err.response());
            }
        }
        response
    }

    fn battery_percent(&self, battery: &mut impl BatteryPort) -> u8 {
        match battery.read_voltage() {
            Ok(v) => self.estimator.percentage(v),
            Err(e) => {
                warn!("Battery read failed: {} (reporting 0%)", e);
                0
            }
        }
    }
}

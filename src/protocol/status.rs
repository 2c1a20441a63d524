//! Status report formatting.
//!
//! Wire contract: `S:<mode>,<intensity>,<time_remaining_s>,<battery_pct>`,
//! all fields decimal, mode as its protocol digit.

use core::fmt::Write;

use crate::session::{Mode, SessionState};

use super::Response;

pub struct StatusReporter;

impl StatusReporter {
    pub fn format(mode: Mode, intensity: u8, time_remaining_secs: u64, battery_pct: u8) -> Response {
        let mut out = Response::new();
        // Longest possible report is well under RESPONSE_CAPACITY.
        let _ = write!(
            out,
            "S:{},{},{},{}",
            mode.as_u8(),
            intensity,
            time_remaining_secs,
            battery_pct
        );
        out
    }

    /// Snapshot of `session` at `now_ms`.
    pub fn report(session: &SessionState, now_ms: u64, battery_pct: u8) -> Response {
        Self::format(
            session.mode(),
            session.intensity(),
            session.time_remaining_secs(now_ms),
            battery_pct,
        )
    }
}

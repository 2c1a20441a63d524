//! Massage session state: operating mode, intensity and countdown timer.
//!
//! ```text
//!            set_mode(≠Off)
//!   ┌──────┐ ─────────────▶ ┌────────┐
//!   │ Idle │                │ Active │──┐ set_mode / start_timer
//!   └──────┘ ◀───────────── └────────┘◀─┘ (overwrite, stay Active)
//!        set_mode(Off) · stop_session · timer expiry
//! ```
//!
//! The session never reads a clock itself.  Every time-dependent call
//! takes the current monotonic time in milliseconds, so the driving loop
//! owns the time source and tests can step time explicitly.

use log::info;

// ---------------------------------------------------------------------------
// Mode
// ---------------------------------------------------------------------------

/// Massage pattern selector.  The discriminant is the protocol digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(u8)]
pub enum Mode {
    #[default]
    Off = 0,
    Pulse = 1,
    Wave = 2,
    Constant = 3,
    Heartbeat = 4,
    Raindrops = 5,
}

impl Mode {
    /// Total number of modes.
    pub const COUNT: usize = 6;

    /// Convert a protocol digit back to a `Mode`.
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(Self::Off),
            1 => Some(Self::Pulse),
            2 => Some(Self::Wave),
            3 => Some(Self::Constant),
            4 => Some(Self::Heartbeat),
            5 => Some(Self::Raindrops),
            _ => None,
        }
    }

    /// Protocol digit for this mode.
    pub const fn as_u8(self) -> u8 {
        self as u8
    }
}

// ---------------------------------------------------------------------------
// Session phase
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Mode is `Off`; motors idle.
    Idle,
    /// A pattern is running, with or without a timer.
    Active,
}

// ---------------------------------------------------------------------------
// SessionState
// ---------------------------------------------------------------------------

/// The one piece of shared mutable state in the firmware.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SessionState {
    mode: Mode,
    /// Always within 0..=100.
    intensity: u8,
    timer_active: bool,
    /// Only meaningful while `timer_active`.
    timer_end_ms: u64,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn intensity(&self) -> u8 {
        self.intensity
    }

    pub fn is_timer_active(&self) -> bool {
        self.timer_active
    }

    pub fn phase(&self) -> SessionPhase {
        if self.mode == Mode::Off {
            SessionPhase::Idle
        } else {
            SessionPhase::Active
        }
    }

    pub fn set_mode(&mut self, mode: Mode) {
        self.mode = mode;
    }

    /// Store `value` clamped to 0..=100.
    pub fn set_intensity(&mut self, value: i32) {
        self.intensity = value.clamp(0, 100) as u8;
    }

    /// Arm the countdown.  Non-positive durations are ignored and leave
    /// any running timer untouched.
    pub fn start_timer(&mut self, duration_secs: i64, now_ms: u64) {
        if duration_secs <= 0 {
            return;
        }
        let duration_ms = (duration_secs as u64).saturating_mul(1000);
        self.timer_end_ms = now_ms.saturating_add(duration_ms);
        self.timer_active = true;
    }

    /// Returns `true` exactly once when the timer has run out, after
    /// resetting the session to its defaults.
    pub fn check_timer(&mut self, now_ms: u64) -> bool {
        if self.timer_active && now_ms >= self.timer_end_ms {
            info!("Session timer expired");
            self.stop_session();
            return true;
        }
        false
    }

    /// Back to defaults: mode Off, intensity 0, timer disarmed.
    pub fn stop_session(&mut self) {
        self.mode = Mode::Off;
        self.intensity = 0;
        self.timer_active = false;
    }

    /// Whole seconds left on the timer, rounded down; 0 when disarmed or expired.
    pub fn time_remaining_secs(&self, now_ms: u64) -> u64 {
        if !self.timer_active || now_ms >= self.timer_end_ms {
            return 0;
        }
        (self.timer_end_ms - now_ms) / 1000
    }
}

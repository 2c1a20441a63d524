//! Command parsing.
//!
//! The first byte of a trimmed line selects the command; tags are
//! case-sensitive.  Parsing never fails: anything unrecognised becomes
//! [`Command::Invalid`] carrying the reason, which the dispatcher turns
//! into an `ERROR:` response.

use core::fmt;

use crate::session::Mode;

/// One parsed protocol command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// `M<mode><intensity>`; intensity already clamped to 0..=100.
    SetMode { mode: Mode, intensity: u8 },
    /// `T<seconds>`; always positive.
    SetTimer { duration_secs: u32 },
    /// `S`, trailing content ignored.
    StatusRequest,
    Invalid(CommandError),
}

/// Why a line was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommandError {
    /// Unknown tag, or a line too short for its tag.
    UnknownCommand,
    /// Mode selector is not a digit in `0..Mode::COUNT`.
    InvalidMode,
    /// Timer duration is zero or negative.
    InvalidTimerDuration,
    /// Line exceeded the decoder buffer.
    LineTooLong,
}

impl CommandError {
    /// `true` for framing/tag errors, `false` for out-of-range values.
    pub fn is_malformed(self) -> bool {
        matches!(self, Self::UnknownCommand | Self::LineTooLong)
    }

    /// Response line sent back to the client.
    pub fn response(self) -> &'static str {
        match self {
            Self::UnknownCommand => "ERROR: Unknown command",
            Self::InvalidMode => "ERROR: Invalid mode value",
            Self::InvalidTimerDuration => "ERROR: Invalid timer duration",
            Self::LineTooLong => "ERROR: Command too long",
        }
    }
}

impl fmt::Display for CommandError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnknownCommand => write!(f, "unknown command"),
            Self::InvalidMode => write!(f, "invalid mode value"),
            Self::InvalidTimerDuration => write!(f, "invalid timer duration"),
            Self::LineTooLong => write!(f, "command too long"),
        }
    }
}

/// Parse one trimmed, non-empty line.
pub fn parse_line(line: &[u8]) -> Command {
    match line.first() {
        Some(b'M') => parse_set_mode(line),
        Some(b'T') => parse_set_timer(line),
        Some(b'S') => Command::StatusRequest,
        _ => Command::Invalid(CommandError::UnknownCommand),
    }
}

fn parse_set_mode(line: &[u8]) -> Command {
    if line.len() < 3 {
        return Command::Invalid(CommandError::UnknownCommand);
    }
    let mode = line[1]
        .is_ascii_digit()
        .then(|| line[1] - b'0')
        .and_then(Mode::from_u8);
    let Some(mode) = mode else {
        return Command::Invalid(CommandError::InvalidMode);
    };
    let intensity = parse_int_lenient(&line[2..]).clamp(0, 100) as u8;
    Command::SetMode { mode, intensity }
}

fn parse_set_timer(line: &[u8]) -> Command {
    if line.len() < 2 {
        return Command::Invalid(CommandError::UnknownCommand);
    }
    let duration = parse_int_lenient(&line[1..]);
    if duration <= 0 {
        return Command::Invalid(CommandError::InvalidTimerDuration);
    }
    Command::SetTimer {
        duration_secs: u32::try_from(duration).unwrap_or(u32::MAX),
    }
}

/// Decimal prefix parser: skips leading whitespace, accepts one sign,
/// stops at the first non-digit and saturates.  No digits yields 0.
pub fn parse_int_lenient(bytes: &[u8]) -> i64 {
    let mut rest = bytes;
    while let [b, tail @ ..] = rest {
        if !b.is_ascii_whitespace() {
            break;
        }
        rest = tail;
    }

    let negative = match rest.first() {
        Some(b'-') => {
            rest = &rest[1..];
            true
        }
        Some(b'+') => {
            rest = &rest[1..];
            false
        }
        _ => false,
    };

    let mut value: i64 = 0;
    for &b in rest.iter().take_while(|b| b.is_ascii_digit()) {
        let digit = i64::from(b - b'0');
        value = if negative {
            value.saturating_mul(10).saturating_sub(digit)
        } else {
            value.saturating_mul(10).saturating_add(digit)
        };
    }
    value
}

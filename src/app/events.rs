//! Application events, both directions.
//!
//! [`AppEvent`]s flow out of the [`AppService`](super::service::AppService)
//! through the [`EventSink`](super::ports::EventSink) port.  [`LinkEvent`]s
//! flow in from the link adapter through
//! [`LinkPort::poll_event`](super::ports::LinkPort::poll_event).

use crate::protocol::command::CommandError;
use crate::session::Mode;

/// Largest single write the link adapter hands to the core.
pub const LINK_CHUNK_CAPACITY: usize = 256;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AppEvent {
    /// The application service has started.
    Started,

    /// A `SetMode` command was applied.
    SessionChanged { mode: Mode, intensity: u8 },

    /// A `SetTimer` command armed the countdown.
    TimerArmed { seconds: u32 },

    /// The countdown ran out and the session was reset.
    TimerComplete,

    /// A line was rejected.
    CommandRejected(CommandError),

    LinkConnected,
    LinkDisconnected,
}

/// Inbound transport events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkEvent {
    /// A central connected.
    Connected,
    /// The central went away.
    Disconnected,
    /// Raw bytes written by the central; no alignment to lines.
    Received(heapless::Vec<u8, LINK_CHUNK_CAPACITY>),
}

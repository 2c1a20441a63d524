//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART in production).

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Started => info!("START | session idle"),
            AppEvent::SessionChanged { mode, intensity } => {
                info!("MODE | mode={:?} intensity={}", mode, intensity);
            }
            AppEvent::TimerArmed { seconds } => info!("TIMER | armed={}s", seconds),
            AppEvent::TimerComplete => info!("TIMER | complete"),
            AppEvent::CommandRejected(err) => {
                warn!("CMD | rejected reason=\"{}\" malformed={}", err, err.is_malformed());
            }
            AppEvent::LinkConnected => info!("LINK | connected"),
            AppEvent::LinkDisconnected => info!("LINK | disconnected"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::protocol::command::CommandError;
    use crate::session::Mode;

    #[test]
    fn every_event_renders() {
        let mut sink = LogEventSink::new();
        for event in [
            AppEvent::Started,
            AppEvent::SessionChanged { mode: Mode::Wave, intensity: 3 },
            AppEvent::TimerArmed { seconds: 30 },
            AppEvent::TimerComplete,
            AppEvent::CommandRejected(CommandError::LineTooLong),
            AppEvent::LinkConnected,
            AppEvent::LinkDisconnected,
        ] {
            sink.emit(&event);
        }
    }
}

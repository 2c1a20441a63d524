//! Application service — the hexagonal core.
//!
//! [`AppService`] owns the session, the command dispatcher and the
//! pattern engine.  It exposes a clean, hardware-agnostic API.  All I/O
//! flows through port traits injected at call sites, making the entire
//! service testable with mock adapters.
//!
//! ```text
//!    LinkPort ──▶ ┌─────────────────────────────┐ ──▶ EventSink
//!                 │         AppService          │
//! BatteryPort ──▶ │ Dispatcher · Session · Engine│
//! ActuatorPort ◀──└─────────────────────────────┘
//! ```
//!
//! The driving loop calls [`service_link`](AppService::service_link) and
//! [`tick`](AppService::tick) every iteration.  Nothing here blocks.

use log::{info, warn};

use crate::config::DeviceConfig;
use crate::patterns::{DutyVector, PatternEngine};
use crate::protocol::command::Command;
use crate::protocol::dispatcher::CommandDispatcher;
use crate::sensors::battery::BatteryEstimator;
use crate::session::SessionState;

use super::events::{AppEvent, LinkEvent};
use super::ports::{ActuatorPort, BatteryPort, EventSink, LinkPort};

/// Greeting sent to every central on connect.
pub const READY_MESSAGE: &str = "READY";
/// Unsolicited notification when the session timer runs out.
pub const TIMER_COMPLETE_MESSAGE: &str = "TIMER_COMPLETE";

// ───────────────────────────────────────────────────────────────
// AppService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct AppService {
    config: DeviceConfig,
    session: SessionState,
    dispatcher: CommandDispatcher,
    engine: PatternEngine,
    /// Time of the last pattern refresh; `None` until the first tick.
    last_pattern_ms: Option<u64>,
    last_duties: DutyVector,
    tick_count: u64,
}

impl AppService {
    /// Construct the service from configuration.
    ///
    /// `rng_seed` seeds the Raindrops generator; on target it comes from
    /// the hardware RNG, in tests it is fixed.
    pub fn new(config: DeviceConfig, rng_seed: u64) -> Self {
        let dispatcher = CommandDispatcher::new(BatteryEstimator::new(&config.battery));
        let engine = PatternEngine::new(config.patterns, rng_seed);
        Self {
            config,
            session: SessionState::new(),
            dispatcher,
            engine,
            last_pattern_ms: None,
            last_duties: DutyVector::new(),
            tick_count: 0,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started);
        info!(
            "AppService started ({} motors, max_duty={}, interval={}ms)",
            self.config.actuator_count, self.config.max_duty, self.config.pattern_interval_ms
        );
    }

    /// End the session and force every motor off.
    pub fn stop(&mut self, hw: &mut impl ActuatorPort, sink: &mut impl EventSink) {
        self.session.stop_session();
        self.engine.reset();
        if let Err(e) = hw.stop_all() {
            warn!("Motor stop failed: {}", e);
        }
        self.last_duties.iter_mut().for_each(|d| *d = 0);
        sink.emit(&AppEvent::SessionChanged {
            mode: self.session.mode(),
            intensity: self.session.intensity(),
        });
        info!("Session stopped");
    }

    // ── Link servicing ────────────────────────────────────────

    /// Drain every pending link event: greet new centrals, run received
    /// bytes through the dispatcher and send each response back.
    pub fn service_link(
        &mut self,
        now_ms: u64,
        link: &mut impl LinkPort,
        battery: &mut impl BatteryPort,
        sink: &mut impl EventSink,
    ) {
        while let Some(event) = link.poll_event() {
            match event {
                LinkEvent::Connected => {
                    sink.emit(&AppEvent::LinkConnected);
                    send_or_log(link, READY_MESSAGE);
                }
                LinkEvent::Disconnected => {
                    // A half-received line from the old central is meaningless.
                    self.dispatcher.reset();
                    sink.emit(&AppEvent::LinkDisconnected);
                }
                LinkEvent::Received(bytes) => {
                    let mode_before = self.session.mode();
                    let handled = self
                        .dispatcher
                        .ingest(&bytes, &mut self.session, now_ms, battery);
                    if self.session.mode() != mode_before {
                        self.engine.reset();
                    }
                    for d in handled {
                        if let Some(event) = self.event_for(d.command) {
                            sink.emit(&event);
                        }
                        send_or_log(link, &d.response);
                    }
                }
            }
        }
    }

    // ── Per-tick orchestration ────────────────────────────────

    /// One driving-loop iteration: timer expiry, then the pattern update
    /// if `pattern_interval_ms` has elapsed.  Returns `true` when the
    /// duty vector was refreshed.
    pub fn tick(
        &mut self,
        now_ms: u64,
        hw: &mut impl ActuatorPort,
        link: &mut impl LinkPort,
        sink: &mut impl EventSink,
    ) -> bool {
        self.tick_count += 1;

        if self.session.check_timer(now_ms) {
            self.engine.reset();
            send_or_log(link, TIMER_COMPLETE_MESSAGE);
            sink.emit(&AppEvent::TimerComplete);
        }

        let due = self.last_pattern_ms.is_none_or(|last| {
            now_ms.saturating_sub(last) >= u64::from(self.config.pattern_interval_ms)
        });
        if !due {
            return false;
        }
        self.last_pattern_ms = Some(now_ms);

        self.last_duties = self.engine.compute(
            self.session.mode(),
            self.session.intensity(),
            now_ms,
            usize::from(self.config.actuator_count),
            self.config.max_duty,
        );
        if hw.actuator_count() > 0 {
            if let Err(e) = hw.apply(&self.last_duties) {
                warn!("Pattern update degraded: {}", e);
            }
        }
        true
    }

    // ── Queries ───────────────────────────────────────────────

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    /// Duty vector computed on the last pattern refresh.
    pub fn last_duties(&self) -> &[u16] {
        &self.last_duties
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Total ticks executed since startup.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    // ── Internal ──────────────────────────────────────────────

    fn event_for(&self, command: Command) -> Option<AppEvent> {
        match command {
            Command::SetMode { mode, .. } => Some(AppEvent::SessionChanged {
                mode,
                intensity: self.session.intensity(),
            }),
            Command::SetTimer { duration_secs } => Some(AppEvent::TimerArmed {
                seconds: duration_secs,
            }),
            Command::StatusRequest => None,
            Command::Invalid(err) => Some(AppEvent::CommandRejected(err)),
        }
    }
}

/// Responses to a vanished central are dropped, not queued.
fn send_or_log(link: &mut impl LinkPort, line: &str) {
    if let Err(e) = link.send(line) {
        warn!("Link send failed ({}), dropped: {}", e, line);
    }
}

//! AppService end-to-end: link bytes in, responses and duty vectors out.

use massagemask::app::events::AppEvent;
use massagemask::app::service::AppService;
use massagemask::config::DeviceConfig;
use massagemask::protocol::command::CommandError;
use massagemask::session::Mode;

use crate::mock_hw::{ActuatorCall, LogSink, MockHardware, MockLink};

fn make_app() -> (AppService, MockHardware, MockLink, LogSink) {
    let mut app = AppService::new(DeviceConfig::default(), 42);
    let mut sink = LogSink::new();
    app.start(&mut sink);
    (app, MockHardware::new(), MockLink::new(), sink)
}

#[test]
fn start_emits_started() {
    let (_app, _hw, _link, sink) = make_app();
    assert_eq!(sink.events, vec![AppEvent::Started]);
}

#[test]
fn connect_is_greeted_with_ready() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    link.queue_connect();
    app.service_link(0, &mut link, &mut hw, &mut sink);
    assert_eq!(link.drain_sent(), ["READY"]);
    assert!(sink.contains(&AppEvent::LinkConnected));
}

#[test]
fn mode_then_status_across_two_deliveries() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    link.queue_connect();
    link.queue_bytes(b"M203\n");
    app.service_link(0, &mut link, &mut hw, &mut sink);
    assert_eq!(link.drain_sent(), ["READY", "OK: Mode=2 Intensity=3"]);
    assert_eq!(app.session().mode(), Mode::Wave);
    assert_eq!(app.session().intensity(), 3);
    assert!(sink.contains(&AppEvent::SessionChanged { mode: Mode::Wave, intensity: 3 }));

    link.queue_bytes(b"S\n");
    app.service_link(100, &mut link, &mut hw, &mut sink);
    assert_eq!(link.drain_sent(), ["S:2,3,0,100"]);
}

#[test]
fn command_split_across_fragments() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    link.queue_connect();
    link.queue_bytes(b"M4");
    link.queue_bytes(b"8");
    link.queue_bytes(b"0\nT");
    link.queue_bytes(b"60\n");
    app.service_link(0, &mut link, &mut hw, &mut sink);
    assert_eq!(
        link.drain_sent(),
        ["READY", "OK: Mode=4 Intensity=80", "OK: Timer set for 60 seconds"]
    );
    assert!(sink.contains(&AppEvent::TimerArmed { seconds: 60 }));
}

#[test]
fn timer_expiry_notifies_and_resets() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    link.queue_connect();
    link.queue_bytes(b"M3100\nT5\n");
    app.service_link(1_000, &mut link, &mut hw, &mut sink);
    link.drain_sent();

    app.tick(1_000, &mut hw, &mut link, &mut sink);
    assert!(hw.last_applied().unwrap().iter().all(|&d| d == 178));

    app.tick(5_900, &mut hw, &mut link, &mut sink);
    assert_eq!(app.session().mode(), Mode::Constant);
    assert!(link.sent.is_empty());

    app.tick(6_000, &mut hw, &mut link, &mut sink);
    assert_eq!(app.session().mode(), Mode::Off);
    assert_eq!(app.session().intensity(), 0);
    assert_eq!(link.drain_sent(), ["TIMER_COMPLETE"]);
    assert!(sink.contains(&AppEvent::TimerComplete));
    assert!(hw.last_applied().unwrap().iter().all(|&d| d == 0));

    // Expiry is reported once.
    app.tick(60_000, &mut hw, &mut link, &mut sink);
    assert!(link.sent.is_empty());
}

#[test]
fn timer_keeps_running_without_central() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    link.queue_connect();
    link.queue_bytes(b"M1050\nT2\n");
    link.queue_disconnect();
    app.service_link(0, &mut link, &mut hw, &mut sink);
    assert!(sink.contains(&AppEvent::LinkDisconnected));
    assert_eq!(app.session().mode(), Mode::Pulse);

    // TIMER_COMPLETE cannot be delivered, but the session still ends.
    app.tick(2_000, &mut hw, &mut link, &mut sink);
    assert_eq!(app.session().mode(), Mode::Off);
    assert!(sink.contains(&AppEvent::TimerComplete));
}

#[test]
fn rejected_commands_are_reported_and_emitted() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    link.queue_connect();
    link.queue_bytes(b"M9\nM950\nT0\nhello\n");
    app.service_link(0, &mut link, &mut hw, &mut sink);
    assert_eq!(
        link.drain_sent(),
        [
            "READY",
            "ERROR: Unknown command",
            "ERROR: Invalid mode value",
            "ERROR: Invalid timer duration",
            "ERROR: Unknown command",
        ]
    );
    assert!(sink.contains(&AppEvent::CommandRejected(CommandError::InvalidMode)));
    assert!(sink.contains(&AppEvent::CommandRejected(CommandError::InvalidTimerDuration)));
    assert_eq!(app.session().mode(), Mode::Off);
}

#[test]
fn wave_duties_reach_the_actuators() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    link.queue_connect();
    link.queue_bytes(b"M2100\n");
    app.service_link(0, &mut link, &mut hw, &mut sink);

    // 400 ms -> wave step 2.
    assert!(app.tick(400, &mut hw, &mut link, &mut sink));
    assert_eq!(
        hw.last_applied().unwrap(),
        &[0, 0, 178, 89, 0, 0, 0, 0]
    );
    assert_eq!(app.last_duties(), hw.last_applied().unwrap());
}

#[test]
fn pattern_cadence_follows_config() {
    let config = DeviceConfig {
        pattern_interval_ms: 100,
        ..DeviceConfig::default()
    };
    let mut app = AppService::new(config, 1);
    let (mut hw, mut link, mut sink) = (MockHardware::new(), MockLink::new(), LogSink::new());
    for t in (0..1_000).step_by(10) {
        app.tick(t, &mut hw, &mut link, &mut sink);
    }
    assert_eq!(hw.apply_count(), 10);
}

#[test]
fn broken_motors_do_not_stop_the_service() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    hw.broken = true;
    link.queue_connect();
    link.queue_bytes(b"M3050\n");
    app.service_link(0, &mut link, &mut hw, &mut sink);
    assert!(app.tick(0, &mut hw, &mut link, &mut sink));
    assert!(app.tick(50, &mut hw, &mut link, &mut sink));
    assert_eq!(app.session().mode(), Mode::Constant);
}

#[test]
fn battery_failure_reports_zero_percent() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    hw.voltage = None;
    link.queue_connect();
    link.queue_bytes(b"S\n");
    app.service_link(0, &mut link, &mut hw, &mut sink);
    assert_eq!(link.drain_sent(), ["READY", "S:0,0,0,0"]);
}

#[test]
fn stop_forces_motors_off() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    link.queue_connect();
    link.queue_bytes(b"M5080\nT600\n");
    app.service_link(0, &mut link, &mut hw, &mut sink);

    app.stop(&mut hw, &mut sink);
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::StopAll));
    assert_eq!(app.session().mode(), Mode::Off);
    assert!(!app.session().is_timer_active());
    assert!(sink.contains(&AppEvent::SessionChanged { mode: Mode::Off, intensity: 0 }));
}

#[test]
fn disconnect_drops_partial_line() {
    let (mut app, mut hw, mut link, mut sink) = make_app();
    link.queue_connect();
    link.queue_bytes(b"M31");
    link.queue_disconnect();
    link.queue_connect();
    link.queue_bytes(b"S\n");
    app.service_link(0, &mut link, &mut hw, &mut sink);
    // "M31" + "S" would have been one bogus line; the reset leaves only "S".
    assert_eq!(link.drain_sent(), ["READY", "READY", "S:0,0,0,100"]);
}

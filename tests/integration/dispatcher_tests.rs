//! CommandDispatcher against the mock battery: protocol scenarios that
//! span several deliveries.

use massagemask::protocol::command::{Command, CommandError};
use massagemask::protocol::dispatcher::{CommandDispatcher, Dispatched};
use massagemask::sensors::battery::BatteryEstimator;
use massagemask::session::{Mode, SessionState};

use crate::mock_hw::MockHardware;

fn dispatcher() -> CommandDispatcher {
    CommandDispatcher::new(BatteryEstimator::default())
}

fn texts(out: &[Dispatched]) -> Vec<String> {
    out.iter().map(|d| d.response.to_string()).collect()
}

#[test]
fn timer_scenario_expires_after_five_seconds() {
    let mut d = dispatcher();
    let mut s = SessionState::new();
    let mut hw = MockHardware::new();

    let out = d.ingest(b"M1040\nT5\n", &mut s, 10_000, &mut hw);
    assert_eq!(texts(&out), ["OK: Mode=1 Intensity=40", "OK: Timer set for 5 seconds"]);
    assert_eq!(out[1].command, Command::SetTimer { duration_secs: 5 });

    assert!(!s.check_timer(14_999));
    assert!(s.check_timer(15_000));
    assert_eq!(s.mode(), Mode::Off);
    assert!(!s.check_timer(15_000));
}

#[test]
fn status_reflects_remaining_time_and_battery() {
    let mut d = dispatcher();
    let mut s = SessionState::new();
    let mut hw = MockHardware::new();
    hw.voltage = Some(3.9);

    d.ingest(b"M5070\nT120\n", &mut s, 0, &mut hw);
    let out = d.ingest(b"S\n", &mut s, 30_500, &mut hw);
    assert_eq!(texts(&out), ["S:5,70,89,75"]);
}

#[test]
fn later_commands_overwrite_earlier_ones() {
    let mut d = dispatcher();
    let mut s = SessionState::new();
    let mut hw = MockHardware::new();
    d.ingest(b"M2010\nT10\nM4090\nT20\n", &mut s, 0, &mut hw);
    assert_eq!(s.mode(), Mode::Heartbeat);
    assert_eq!(s.intensity(), 90);
    assert_eq!(s.time_remaining_secs(0), 20);
}

#[test]
fn mode_off_returns_to_idle() {
    let mut d = dispatcher();
    let mut s = SessionState::new();
    let mut hw = MockHardware::new();
    d.ingest(b"M3050\n", &mut s, 0, &mut hw);
    let out = d.ingest(b"M0000\n", &mut s, 0, &mut hw);
    assert_eq!(texts(&out), ["OK: Mode=0 Intensity=0"]);
    assert_eq!(s.mode(), Mode::Off);
}

#[test]
fn crlf_terminated_lines_are_accepted() {
    let mut d = dispatcher();
    let mut s = SessionState::new();
    let mut hw = MockHardware::new();
    let out = d.ingest(b"M1025\r\nS\r\n", &mut s, 0, &mut hw);
    assert_eq!(texts(&out), ["OK: Mode=1 Intensity=25", "S:1,25,0,100"]);
}

#[test]
fn runaway_sender_is_bounded() {
    let mut d = dispatcher();
    let mut s = SessionState::new();
    let mut hw = MockHardware::new();
    for _ in 0..100 {
        assert!(d.ingest(&[b'7'; 64], &mut s, 0, &mut hw).is_empty());
        assert!(d.pending() <= 128);
    }
    let out = d.ingest(b"\nS\n", &mut s, 0, &mut hw);
    assert_eq!(out[0].command, Command::Invalid(CommandError::LineTooLong));
    assert_eq!(texts(&out), ["ERROR: Command too long", "S:0,0,0,100"]);
}

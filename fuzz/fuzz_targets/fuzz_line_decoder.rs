//! Fuzz target: `LineDecoder::feed` and `CommandDispatcher::ingest`
//!
//! Pushes arbitrary bytes through the newline framer and the full
//! command path.  Neither may panic, yield a line longer than the
//! buffer, or leave the session with an intensity above 100.
//!
//! cargo fuzz run fuzz_line_decoder

#![no_main]

use libfuzzer_sys::fuzz_target;
use massagemask::app::ports::BatteryPort;
use massagemask::error::SensorError;
use massagemask::protocol::codec::{DecodedLine, LINE_CAPACITY, LineDecoder};
use massagemask::protocol::dispatcher::CommandDispatcher;
use massagemask::sensors::BatteryEstimator;
use massagemask::session::SessionState;

struct FixedBattery;

impl BatteryPort for FixedBattery {
    fn read_voltage(&mut self) -> Result<f32, SensorError> {
        Ok(3.7)
    }
}

fuzz_target!(|data: &[u8]| {
    let mut decoder = LineDecoder::new();
    decoder.feed(data, |line| {
        if let DecodedLine::Line(buf) = line {
            assert!(buf.len() <= LINE_CAPACITY);
        }
    });
    assert!(decoder.pending() <= LINE_CAPACITY);

    let mut dispatcher = CommandDispatcher::new(BatteryEstimator::default());
    let mut session = SessionState::new();
    for (i, chunk) in data.chunks(7).enumerate() {
        let handled = dispatcher.ingest(chunk, &mut session, i as u64 * 10, &mut FixedBattery);
        for d in handled {
            assert!(!d.response.is_empty());
        }
        assert!(session.intensity() <= 100);
    }
});

//! Vibration pattern engine.
//!
//! Turns `(mode, intensity, time)` into one duty value per motor.  The
//! driving loop calls [`PatternEngine::compute`] every pattern interval
//! (50 ms by default) and hands the resulting [`DutyVector`] to the
//! motor driver.
//!
//! ## Patterns
//!
//! | Mode       | Description                                         | Period  |
//! |------------|-----------------------------------------------------|---------|
//! | Off        | All motors stopped                                  | —       |
//! | Constant   | All motors at the intensity duty                    | —       |
//! | Pulse      | All motors on, then all off                         | 1.5 s   |
//! | Wave       | One motor at full duty, the next at half, sweeping  | 200 ms/step |
//! | Heartbeat  | Centre pair beat, gap, beat, long rest              | 1.1 s   |
//! | Raindrops  | Random short taps on random motors                  | 150 ms/step |
//!
//! Every pattern except Raindrops is a pure function of its inputs.
//! Raindrops keeps a small [`RaindropState`] inside the engine instance,
//! so independent engines never share taps.

use rand::rngs::SmallRng;
use rand::{Rng, RngCore, SeedableRng};

use crate::config::{MAX_ACTUATORS, PatternTiming};
use crate::session::Mode;

/// One duty value per motor, each within `0..=max_duty`.
pub type DutyVector = heapless::Vec<u16, MAX_ACTUATORS>;

/// Map an intensity percentage onto `0..=max_duty`, rounding to nearest.
pub fn intensity_to_duty(intensity: u8, max_duty: u16) -> u16 {
    let intensity = u32::from(intensity.min(100));
    ((intensity * u32::from(max_duty) + 50) / 100) as u16
}

/// Raindrop bookkeeping carried between ticks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RaindropState {
    /// Step index already decided; `None` before the first Raindrops tick.
    last_step: Option<u64>,
    /// Motor tapped during the current step, if any.
    active: Option<usize>,
    /// Timestamp at which the current tap began.
    drop_start_ms: u64,
}

impl RaindropState {
    pub fn active(&self) -> Option<usize> {
        self.active
    }
}

/// Pattern engine.  Generic over the random source so tests can seed it.
pub struct PatternEngine<R: RngCore = SmallRng> {
    timing: PatternTiming,
    raindrops: RaindropState,
    rng: R,
}

impl PatternEngine<SmallRng> {
    /// Engine with a seeded non-cryptographic generator.
    pub fn new(timing: PatternTiming, seed: u64) -> Self {
        Self::with_rng(timing, SmallRng::seed_from_u64(seed))
    }
}

impl<R: RngCore> PatternEngine<R> {
    pub fn with_rng(timing: PatternTiming, rng: R) -> Self {
        Self {
            timing,
            raindrops: RaindropState::default(),
            rng,
        }
    }

    pub fn raindrops(&self) -> &RaindropState {
        &self.raindrops
    }

    /// Forget any in-flight raindrop.
    pub fn reset(&mut self) {
        self.raindrops = RaindropState::default();
    }

    /// Compute the duty vector for `actuators` motors at time `now_ms`.
    ///
    /// `actuators` is capped at [`MAX_ACTUATORS`]; every value is within
    /// `0..=max_duty`.
    pub fn compute(
        &mut self,
        mode: Mode,
        intensity: u8,
        now_ms: u64,
        actuators: usize,
        max_duty: u16,
    ) -> DutyVector {
        let n = actuators.min(MAX_ACTUATORS);
        let mut out = DutyVector::new();
        // Cannot fail: n <= capacity.
        let _ = out.resize(n, 0);
        if n == 0 {
            return out;
        }

        let duty = intensity_to_duty(intensity, max_duty);
        match mode {
            Mode::Off => {}
            Mode::Constant => out.fill(duty),
            Mode::Pulse => self.pulse(&mut out, duty, now_ms),
            Mode::Wave => self.wave(&mut out, duty, now_ms),
            Mode::Heartbeat => self.heartbeat(&mut out, duty, now_ms),
            Mode::Raindrops => self.apply_raindrops(&mut out, duty, now_ms),
        }
        out
    }

    fn pulse(&self, out: &mut [u16], duty: u16, now_ms: u64) {
        let pos = now_ms % u64::from(self.timing.pulse_cycle_ms.max(1));
        if pos < u64::from(self.timing.pulse_on_ms) {
            out.fill(duty);
        }
    }

    fn wave(&self, out: &mut [u16], duty: u16, now_ms: u64) {
        let n = out.len();
        let step = now_ms / u64::from(self.timing.wave_step_ms.max(1));
        let primary = (step % n as u64) as usize;
        let secondary = (primary + 1) % n;
        out[primary] = duty;
        // With a single motor secondary == primary and the half duty wins.
        out[secondary] = duty / 2;
    }

    fn heartbeat(&self, out: &mut [u16], duty: u16, now_ms: u64) {
        let t = &self.timing;
        let pos = now_ms % t.heartbeat_cycle_ms().max(1);
        let first_end = u64::from(t.heartbeat_short_on_ms);
        let gap_end = first_end + u64::from(t.heartbeat_short_off_ms);
        let second_end = gap_end + u64::from(t.heartbeat_short_on_ms);

        let n = out.len() as isize;
        let centre_a = n / 2 - 1;
        let centre_b = n / 2;
        let mut set = |idx: isize, value: u16| {
            if (0..n).contains(&idx) {
                out[idx as usize] = value;
            }
        };

        if pos < first_end {
            set(centre_a, duty);
            set(centre_b, duty);
            set(centre_a - 1, duty / 3);
            set(centre_b + 1, duty / 3);
        } else if (gap_end..second_end).contains(&pos) {
            set(centre_a, duty);
            set(centre_b, duty);
        }
    }

    fn apply_raindrops(&mut self, out: &mut [u16], duty: u16, now_ms: u64) {
        let t = &self.timing;
        let step = now_ms / u64::from(t.raindrop_step_ms.max(1));
        let state = &mut self.raindrops;

        if state.last_step != Some(step) {
            state.last_step = Some(step);
            if self.rng.gen_range(0..100u8) < t.raindrop_chance_percent {
                state.active = Some(self.rng.gen_range(0..out.len()));
                state.drop_start_ms = now_ms;
            } else {
                state.active = None;
            }
        }

        if let Some(idx) = state.active {
            let in_tap = now_ms.saturating_sub(state.drop_start_ms) < u64::from(t.raindrop_tap_ms);
            if in_tap && idx < out.len() {
                out[idx] = duty;
            }
        }
    }
}

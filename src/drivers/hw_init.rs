//! One-shot hardware peripheral initialization.
//!
//! Configures the LEDC timer and motor channels and the battery ADC
//! channel using raw ESP-IDF sys calls. Called once from `main()` before
//! the event loop starts.
//!
//! Host builds keep the same API; duty writes land in an in-memory
//! table that tests can inspect.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

use embedded_hal::pwm::{ErrorType, SetDutyCycle};

use crate::config::DeviceConfig;
use crate::error::SensorError;
use crate::pins;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcInitFailed(i32),
    LedcTimerFailed(i32),
    LedcChannelFailed { channel: u32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcInitFailed(rc) => write!(f, "ADC1 init failed (rc={})", rc),
            Self::LedcTimerFailed(rc) => write!(f, "LEDC timer config failed (rc={})", rc),
            Self::LedcChannelFailed { channel, rc } => {
                write!(f, "LEDC channel {} config failed (rc={})", channel, rc)
            }
        }
    }
}


#[cfg(target_os = "espidf")]
use log::info;

pub const ADC1_CH_BATTERY: u32 = 6;

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: Must be called only from the single-threaded init path or the
/// main-loop ADC read path.  No concurrent access is possible because
/// `init_battery_adc()` completes before the event loop starts.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

/// Bring up ADC1 and the battery divider channel (GPIO 34, 12 dB).
#[cfg(target_os = "espidf")]
pub fn init_battery_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: ADC1_HANDLE is only written here, once at boot.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };
    // SAFETY: handle was created just above.
    let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), ADC1_CH_BATTERY, &chan_cfg) };
    if ret != ESP_OK as i32 { return Err(HwInitError::AdcInitFailed(ret)); }

    info!("hw_init: ADC1 configured (CH{}=battery, GPIO {})", ADC1_CH_BATTERY, pins::BATTERY_ADC_GPIO);
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_battery_adc() -> Result<(), HwInitError> {
    log::info!("hw_init(sim): ADC init skipped (battery GPIO {})", pins::BATTERY_ADC_GPIO);
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, SensorError> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract, single-threaded main-loop access only.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(SensorError::AdcReadFailed);
    }
    Ok(raw.max(0) as u16)
}

#[cfg(not(target_os = "espidf"))]
pub fn adc1_read(_channel: u32) -> Result<u16, SensorError> {
    Err(SensorError::AdcReadFailed)
}

// ── LEDC PWM ─────────────────────────────────────────────────

/// Configure LEDC timer 0 and one channel per motor pin.
///
/// Returns the number of channels brought up.  A channel failure aborts
/// the remaining channels; the caller decides whether to run degraded.
#[cfg(target_os = "espidf")]
pub fn init_motor_pwm(config: &DeviceConfig) -> Result<usize, HwInitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: u32::from(config.pwm_resolution_bits),
        freq_hz: config.pwm_frequency_hz,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: called once from the single main-task init path.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK as i32 { return Err(HwInitError::LedcTimerFailed(ret)); }

    let count = usize::from(config.actuator_count).min(pins::MOTOR_COUNT);
    for (i, &gpio) in pins::MOTOR_GPIOS.iter().take(count).enumerate() {
        let channel = ledc_channel_t_LEDC_CHANNEL_0 + i as u32;
        // SAFETY: timer 0 configured above; each channel configured once.
        let ret = unsafe { ledc_channel_config(&ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        }) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::LedcChannelFailed { channel, rc: ret });
        }
    }

    info!(
        "hw_init: LEDC configured ({} motors, {} Hz, {}-bit)",
        count, config.pwm_frequency_hz, config.pwm_resolution_bits
    );
    Ok(count)
}

#[cfg(not(target_os = "espidf"))]
pub fn init_motor_pwm(config: &DeviceConfig) -> Result<usize, HwInitError> {
    let count = usize::from(config.actuator_count).min(pins::MOTOR_COUNT);
    log::info!("hw_init(sim): {} LEDC channels simulated", count);
    Ok(count)
}

#[cfg(not(target_os = "espidf"))]
static SIM_LEDC_DUTY: [core::sync::atomic::AtomicU16; pins::MOTOR_COUNT] =
    [const { core::sync::atomic::AtomicU16::new(0) }; pins::MOTOR_COUNT];

/// Last duty written to a simulated LEDC channel.
#[cfg(not(target_os = "espidf"))]
pub fn sim_ledc_duty(channel: u32) -> u16 {
    SIM_LEDC_DUTY
        .get(channel as usize)
        .map_or(0, |d| d.load(core::sync::atomic::Ordering::Relaxed))
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u16) -> Result<(), i32> {
    // SAFETY: LEDC channels were configured in init_motor_pwm(); duty register
    // writes are race-free since only the main loop calls this function.
    unsafe {
        let ret = ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty));
        if ret != ESP_OK as i32 { return Err(ret); }
        let ret = ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel);
        if ret != ESP_OK as i32 { return Err(ret); }
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(channel: u32, duty: u16) -> Result<(), i32> {
    match SIM_LEDC_DUTY.get(channel as usize) {
        Some(slot) => {
            slot.store(duty, core::sync::atomic::Ordering::Relaxed);
            Ok(())
        }
        None => Err(-1),
    }
}

// ── embedded-hal channel ──────────────────────────────────────

/// Error from a raw LEDC duty write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedcError(pub i32);

impl embedded_hal::pwm::Error for LedcError {
    fn kind(&self) -> embedded_hal::pwm::ErrorKind {
        embedded_hal::pwm::ErrorKind::Other
    }
}

/// One configured LEDC channel exposed as an embedded-hal PWM output.
#[derive(Debug)]
pub struct LedcChannel {
    channel: u32,
    max_duty: u16,
}

impl LedcChannel {
    /// `max_duty` is the full-scale value at the configured resolution.
    pub fn new(channel: u32, max_duty: u16) -> Self {
        Self { channel, max_duty }
    }

    pub fn channel(&self) -> u32 {
        self.channel
    }
}

impl ErrorType for LedcChannel {
    type Error = LedcError;
}

impl SetDutyCycle for LedcChannel {
    fn max_duty_cycle(&self) -> u16 {
        self.max_duty
    }

    fn set_duty_cycle(&mut self, duty: u16) -> Result<(), Self::Error> {
        ledc_set(self.channel, duty.min(self.max_duty)).map_err(LedcError)
    }
}

/// Channels for the first `count` motors, in pin order.
pub fn motor_channels(count: usize, config: &DeviceConfig) -> heapless::Vec<LedcChannel, { pins::MOTOR_COUNT }> {
    let full_scale = config.pwm_full_scale().min(u32::from(u16::MAX)) as u16;
    (0..count.min(pins::MOTOR_COUNT))
        .map(|i| LedcChannel::new(i as u32, full_scale))
        .collect()
}

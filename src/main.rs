//! Smart massage mask firmware — main entry point.
//!
//! Hexagonal architecture with a single cooperative polling loop.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  HardwareAdapter        BleLink      LogEventSink   Esp32Time  │
//! │  (Actuator+Battery)     (LinkPort)   (EventSink)    (clock)    │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │              AppService (pure logic)                   │    │
//! │  │  CommandDispatcher · SessionState · PatternEngine      │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use esp_idf_hal::delay::FreeRtos;
use log::{error, info, warn};

use massagemask::adapters::ble::BleLink;
use massagemask::adapters::hardware::HardwareAdapter;
use massagemask::adapters::log_sink::LogEventSink;
use massagemask::adapters::time::Esp32TimeAdapter;
use massagemask::app::service::AppService;
use massagemask::config::DeviceConfig;
use massagemask::drivers::hw_init;
use massagemask::drivers::motors::MotorArray;
use massagemask::sensors::battery::BatteryMonitor;

/// Loop period; pattern updates are rate-limited separately by the config.
const LOOP_PERIOD_MS: u32 = 10;

fn load_config() -> DeviceConfig {
    match option_env!("MASSAGEMASK_CONFIG_JSON") {
        Some(json) => match DeviceConfig::from_json(json.as_bytes()) {
            Ok(cfg) => {
                info!("Config: build-time override applied");
                cfg
            }
            Err(e) => {
                warn!("Config override rejected ({}), using defaults", e);
                DeviceConfig::default()
            }
        },
        None => DeviceConfig::default(),
    }
}

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  SMART MassageMask v{}            ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    let config = load_config();

    // ── 2. Peripherals (degraded operation on failure) ────────
    let motor_count = match hw_init::init_motor_pwm(&config) {
        Ok(n) => n,
        Err(e) => {
            error!("Motor PWM init failed: {}, continuing without motor output", e);
            0
        }
    };
    if let Err(e) = hw_init::init_battery_adc() {
        error!("Battery ADC init failed: {}, battery will read 0%", e);
    }

    let motors = MotorArray::new(hw_init::motor_channels(motor_count, &config), config.max_duty);
    let mut hw = HardwareAdapter::new(motors, BatteryMonitor::new(config.battery));

    // ── 3. BLE link ───────────────────────────────────────────
    let mut link = BleLink::with_default_name();
    if let Err(e) = link.start() {
        error!("BLE bring-up failed: {}, running without link", e);
    }

    // ── 4. App service ────────────────────────────────────────
    let mut sink = LogEventSink::new();
    // SAFETY: esp_random has no preconditions once the RF subsystem is up.
    let seed = u64::from(unsafe { esp_idf_svc::sys::esp_random() });
    let mut app = AppService::new(config, seed);
    app.start(&mut sink);

    let clock = Esp32TimeAdapter::new();
    info!("System ready. Entering main loop.");

    // ── 5. Main loop ──────────────────────────────────────────
    loop {
        let now_ms = clock.uptime_ms();
        app.service_link(now_ms, &mut link, &mut hw, &mut sink);
        app.tick(now_ms, &mut hw, &mut link, &mut sink);
        FreeRtos::delay_ms(LOOP_PERIOD_MS);
    }
}

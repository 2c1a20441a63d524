//! The simulated BLE link wired to a real AppService and HardwareAdapter.

use massagemask::adapters::ble::{BleLink, BleState};
use massagemask::adapters::hardware::HardwareAdapter;
use massagemask::app::service::AppService;
use massagemask::config::DeviceConfig;
use massagemask::drivers::hw_init;
use massagemask::drivers::motors::MotorArray;
use massagemask::sensors::battery::{BatteryMonitor, sim_set_battery_adc};
use massagemask::session::Mode;

use crate::mock_hw::LogSink;

#[test]
fn phone_session_over_simulated_ble() {
    let config = DeviceConfig::default();
    let count = hw_init::init_motor_pwm(&config).unwrap();
    let motors = MotorArray::new(hw_init::motor_channels(count, &config), config.max_duty);
    let mut hw = HardwareAdapter::new(motors, BatteryMonitor::new(config.battery));
    sim_set_battery_adc(2700);

    let mut link = BleLink::with_default_name();
    link.start().unwrap();
    let mut sink = LogSink::new();
    let mut app = AppService::new(config, 9);
    app.start(&mut sink);

    link.sim_connect();
    link.sim_write(b"M3050\n");
    app.service_link(0, &mut link, &mut hw, &mut sink);
    assert_eq!(link.state(), BleState::Connected);
    assert_eq!(app.session().mode(), Mode::Constant);

    app.tick(0, &mut hw, &mut link, &mut sink);
    assert!(hw.motors().duties().iter().all(|&d| d == 89));
    assert_eq!(hw_init::sim_ledc_duty(0), 89);

    link.sim_write(b"S\n");
    app.service_link(10, &mut link, &mut hw, &mut sink);
    assert_eq!(
        link.sent(),
        ["READY\n", "OK: Mode=3 Intensity=50\n", "S:3,50,0,100\n"]
    );

    link.sim_disconnect();
    app.service_link(20, &mut link, &mut hw, &mut sink);
    assert_eq!(link.state(), BleState::Advertising);
    assert_eq!(app.session().mode(), Mode::Constant);
}

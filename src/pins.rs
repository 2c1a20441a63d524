//! GPIO / peripheral pin assignments for the massage mask board (ESP32).
//!
//! Every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Vibration motors (LEDC low-speed channels 0-7, in order)
// ---------------------------------------------------------------------------

/// Motor GPIOs, index = motor number = LEDC channel.
pub const MOTOR_GPIOS: [i32; 8] = [18, 19, 21, 22, 23, 25, 26, 27];

/// Number of motors physically wired on the board.
pub const MOTOR_COUNT: usize = MOTOR_GPIOS.len();

// ---------------------------------------------------------------------------
// Battery divider (ADC1)
// ---------------------------------------------------------------------------

/// Battery voltage via 1:2 resistive divider.
/// ADC1 channel 6 (GPIO 34, input-only).
pub const BATTERY_ADC_GPIO: i32 = 34;

// ---------------------------------------------------------------------------
// BLE identity
// ---------------------------------------------------------------------------

/// Advertised GAP device name.
pub const DEVICE_NAME: &str = "SMART_MassageMask";
/// 16-bit UUID of the serial service.
pub const BLE_SERVICE_UUID16: u16 = 0xFFE0;
/// 16-bit UUID of the read/write/notify characteristic.
pub const BLE_CHAR_UUID16: u16 = 0xFFE1;

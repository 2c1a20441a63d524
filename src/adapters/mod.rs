//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter        | Implements         | Connects to              |
//! |----------------|--------------------|--------------------------|
//! | `ble`          | LinkPort           | Bluedroid GATT server    |
//! | `hardware`     | ActuatorPort       | ESP32 LEDC PWM           |
//! |                | BatteryPort        | ESP32 ADC1               |
//! | `log_sink`     | EventSink          | Serial log output        |
//! | `time`         | —                  | ESP32 system timer       |

pub mod ble;
pub mod hardware;
pub mod log_sink;
pub mod time;

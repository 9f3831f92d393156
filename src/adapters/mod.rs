//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter      | Implements     | Connects to                  |
//! |--------------|----------------|------------------------------|
//! | `fan`        | FanPort        | any `embedded-hal` PWM       |
//! | `gpio`       | GpioPort       | ESP-IDF GPIO driver          |
//! | `hardware`   | all hardware   | one adapter per port above   |
//! | `indicator`  | IndicatorPort  | WS2812 chain over RMT        |
//! | `lighting`   | LightingPort   | in-memory channel universe   |
//! | `log_sink`   | EventSink      | serial log output            |
//! | `mqtt`       | MessagingPort  | ESP-IDF MQTT client          |
//! | `wifi`       | (none)         | ESP-IDF WiFi station         |

pub mod fan;
#[cfg(target_os = "espidf")]
pub mod gpio;
pub mod hardware;
#[cfg(target_os = "espidf")]
pub mod indicator;
pub mod lighting;
pub mod log_sink;
#[cfg(target_os = "espidf")]
pub mod mqtt;
pub mod wifi;

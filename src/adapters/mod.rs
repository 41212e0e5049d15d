//! Adapters — concrete implementations of the hexagonal port traits.
//!
//! | Adapter     | Implements          | Connects to                |
//! |-------------|---------------------|----------------------------|
//! | `gpio_line` | OneWireLine         | DHT22 data GPIO            |
//! | `hardware`  | SensorPort          | DHT22, MQ-135 ADC          |
//! |             | ActuatorPort        | LEDC heater PWM            |
//! | `log_sink`  | EventSink           | Serial log output          |
//! | `nvs`       | ConfigPort          | NVS / in-memory store      |
//! | `time`      | Timebase + DelayNs  | ESP32 system timer         |

pub mod gpio_line;
pub mod hardware;
pub mod log_sink;
pub mod nvs;
pub mod time;

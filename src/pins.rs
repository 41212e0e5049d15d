//! GPIO / peripheral pin assignments for the controller board.
//!
//! Single source of truth — every driver references this module rather than
//! hard-coding pin numbers.

// ---------------------------------------------------------------------------
// DHT22 temperature / humidity sensor (one-wire, open-drain with pull-up)
// ---------------------------------------------------------------------------

/// Bidirectional data line.  Driven low by the host for the wake pulse,
/// then released to input for the sensor's reply.
pub const DHT_DATA_GPIO: i32 = 15;

// ---------------------------------------------------------------------------
// MQ-135 air-quality sensor (analog)
// ---------------------------------------------------------------------------

/// Analog output via resistive divider.
/// ADC1 channel 3 (GPIO 4 on ESP32-S3).
pub const MQ135_ADC_GPIO: i32 = 4;

// ---------------------------------------------------------------------------
// AC dimmer (phase-controlled heater)
// ---------------------------------------------------------------------------

/// LEDC PWM output feeding the dimmer module's control input.
pub const HEATER_PWM_GPIO: i32 = 18;
/// Dimmer PWM frequency.  The duty register is 8 bits wide (0–255).
pub const HEATER_PWM_FREQ_HZ: u32 = 1_000;

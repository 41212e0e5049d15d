//! System configuration parameters
//!
//! All tunable parameters for the controller.  Values can be overridden via
//! NVS (non-volatile storage) or at runtime through [`AppCommand`]s.
//!
//! [`AppCommand`]: crate::app::commands::AppCommand

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::control::pid::{PidConfig, PidGains, WindupPolicy};

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Heater loop ---
    /// Target temperature (°C)
    pub setpoint_c: f64,
    /// Proportional gain
    pub kp: f64,
    /// Integral gain (per cycle, not per second)
    pub ki: f64,
    /// Derivative gain (per cycle, on measurement)
    pub kd: f64,
    /// Roll back integral accumulation while the output is saturated
    pub anti_windup: bool,

    // --- Timing ---
    /// Sensor read + control cycle interval (milliseconds)
    pub cycle_interval_ms: u32,
    /// Emit a telemetry event every N cycles
    pub telemetry_every_cycles: u32,

    // --- Diagnostics ---
    /// Consecutive DHT22 failures before the log escalates to `error!`
    pub failure_alarm_threshold: u32,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            // Heater loop
            setpoint_c: 30.0,
            kp: 2.0,
            ki: 5.0,
            kd: 1.0,
            anti_windup: false,

            // Timing
            cycle_interval_ms: 2_000, // DHT22 minimum sampling period
            telemetry_every_cycles: 1,

            // Diagnostics
            failure_alarm_threshold: 5,
        }
    }
}

impl SystemConfig {
    /// Controller parameters derived from this configuration.
    pub fn pid_config(&self) -> PidConfig {
        PidConfig {
            gains: PidGains {
                kp: self.kp,
                ki: self.ki,
                kd: self.kd,
            },
            setpoint: self.setpoint_c,
            windup: if self.anti_windup {
                WindupPolicy::FreezeWhenSaturated
            } else {
                WindupPolicy::Unbounded
            },
        }
    }

    /// Range-check every field.  Invalid values are rejected, never clamped.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(-40.0..=80.0).contains(&self.setpoint_c) {
            return Err(ConfigError::ValidationFailed(
                "setpoint_c must be -40.0–80.0 (DHT22 range)",
            ));
        }
        for (gain, msg) in [
            (self.kp, "kp must be finite and 0.0–1000.0"),
            (self.ki, "ki must be finite and 0.0–1000.0"),
            (self.kd, "kd must be finite and 0.0–1000.0"),
        ] {
            if !(0.0..=1000.0).contains(&gain) {
                return Err(ConfigError::ValidationFailed(msg));
            }
        }
        if !(2_000..=600_000).contains(&self.cycle_interval_ms) {
            return Err(ConfigError::ValidationFailed(
                "cycle_interval_ms must be 2000–600000",
            ));
        }
        if !(1..=3600).contains(&self.telemetry_every_cycles) {
            return Err(ConfigError::ValidationFailed(
                "telemetry_every_cycles must be 1–3600",
            ));
        }
        if self.failure_alarm_threshold == 0 {
            return Err(ConfigError::ValidationFailed(
                "failure_alarm_threshold must be at least 1",
            ));
        }
        Ok(())
    }
}

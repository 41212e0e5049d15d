//! PID controller for heater temperature.
//!
//! Derivative-on-measurement variant, evaluated once per control cycle
//! (the cycle period is folded into the gains):
//!
//! ```text
//! error          = setpoint - measured
//! integral      += error
//! derivative     = measured - previous_input
//! output         = kp*error + ki*integral - kd*derivative
//! previous_input = measured
//! ```
//!
//! The first call sees `previous_input == 0.0` and therefore a large
//! derivative kick.  The raw output is truncated to the 8-bit dimmer range;
//! values outside `[0, 255]` saturate and are reported as such.

use serde::{Deserialize, Serialize};

/// Highest duty the dimmer accepts.
pub const DUTY_MAX: u8 = u8::MAX;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidGains {
    pub kp: f64,
    pub ki: f64,
    pub kd: f64,
}

impl Default for PidGains {
    fn default() -> Self {
        Self {
            kp: 2.0,
            ki: 5.0,
            kd: 1.0,
        }
    }
}

/// What to do with the integral while the output is saturated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum WindupPolicy {
    /// Keep accumulating regardless of saturation.
    #[default]
    Unbounded,
    /// Roll back this cycle's accumulation whenever the output saturates.
    FreezeWhenSaturated,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PidConfig {
    pub gains: PidGains,
    /// Target temperature in °C.
    pub setpoint: f64,
    pub windup: WindupPolicy,
}

impl Default for PidConfig {
    fn default() -> Self {
        Self {
            gains: PidGains::default(),
            setpoint: 30.0,
            windup: WindupPolicy::Unbounded,
        }
    }
}

/// Memory carried between cycles.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct PidState {
    pub integral: f64,
    pub previous_input: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Saturation {
    None,
    /// Raw output above 255; duty pinned at 255.
    High,
    /// Raw output below 0 (or NaN); duty pinned at 0.
    Low,
}

/// Result of one cycle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ControlOutput {
    pub raw: f64,
    pub duty: u8,
    pub saturation: Saturation,
}

impl ControlOutput {
    /// Truncate `raw` toward zero into the duty range.
    pub fn from_raw(raw: f64) -> Self {
        let saturation = if raw.is_nan() || raw < 0.0 {
            Saturation::Low
        } else if raw >= f64::from(DUTY_MAX) + 1.0 {
            Saturation::High
        } else {
            Saturation::None
        };
        Self {
            raw,
            // `as` truncates and saturates; NaN becomes 0.
            duty: raw as u8,
            saturation,
        }
    }

    pub fn is_saturated(&self) -> bool {
        self.saturation != Saturation::None
    }
}

/// One control step as a pure function of its inputs.
pub fn step(measured: f64, state: PidState, config: &PidConfig) -> (ControlOutput, PidState) {
    let PidGains { kp, ki, kd } = config.gains;

    let error = config.setpoint - measured;
    let mut integral = state.integral + error;
    let derivative = measured - state.previous_input;

    let output = ControlOutput::from_raw(kp * error + ki * integral - kd * derivative);

    if output.is_saturated() && config.windup == WindupPolicy::FreezeWhenSaturated {
        integral = state.integral;
    }

    let next = PidState {
        integral,
        previous_input: measured,
    };
    (output, next)
}

/// Stateful wrapper owning one [`PidState`].
#[derive(Debug, Clone)]
pub struct PidController {
    config: PidConfig,
    state: PidState,
}

impl PidController {
    pub fn new(config: PidConfig) -> Self {
        Self {
            config,
            state: PidState::default(),
        }
    }

    /// Compute this cycle's output from the latest measurement.
    pub fn update(&mut self, measured: f64) -> ControlOutput {
        let (output, next) = step(measured, self.state, &self.config);
        self.state = next;
        output
    }

    pub fn set_setpoint(&mut self, setpoint: f64) {
        self.config.setpoint = setpoint;
    }

    pub fn set_gains(&mut self, gains: PidGains) {
        self.config.gains = gains;
    }

    pub fn set_config(&mut self, config: PidConfig) {
        self.config = config;
    }

    pub fn config(&self) -> &PidConfig {
        &self.config
    }

    pub fn state(&self) -> PidState {
        self.state
    }

    /// Forget integral and previous input.
    pub fn reset(&mut self) {
        self.state = PidState::default();
    }
}

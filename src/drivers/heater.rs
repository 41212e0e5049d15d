//! Phase-controlled heater driver (AC dimmer module).
//!
//! The dimmer's control input takes an 8-bit PWM duty from LEDC channel 0.
//! The value is written verbatim; range handling belongs to the controller.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: writes the LEDC duty register via hw_init helpers.
//! On host/test: tracks state in-memory only.

use crate::drivers::hw_init;
use crate::error::ActuatorError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeaterState {
    Off,
    Driving { duty: u8 },
}

pub struct HeaterDriver {
    state: HeaterState,
}

impl Default for HeaterDriver {
    fn default() -> Self {
        Self::new()
    }
}

impl HeaterDriver {
    pub fn new() -> Self {
        Self {
            state: HeaterState::Off,
        }
    }

    /// Write `duty` (0–255) to the dimmer.  On failure the tracked state is
    /// left at the last value the hardware accepted.
    pub fn set_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        hw_init::ledc_set(hw_init::LEDC_CH_HEATER, duty)?;
        self.state = if duty == 0 {
            HeaterState::Off
        } else {
            HeaterState::Driving { duty }
        };
        Ok(())
    }

    pub fn off(&mut self) -> Result<(), ActuatorError> {
        self.set_duty(0)
    }

    pub fn state(&self) -> HeaterState {
        self.state
    }

    pub fn current_duty(&self) -> u8 {
        match self.state {
            HeaterState::Off => 0,
            HeaterState::Driving { duty } => duty,
        }
    }
}

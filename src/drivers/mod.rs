//! Actuator drivers and one-shot hardware initialisation.

pub mod heater;
pub mod hw_init;

//! Application core — pure domain logic, zero I/O.
//!
//! This module holds the control cycle of the heater controller: sample,
//! decide, actuate, report.  All interaction with hardware happens through
//! **port traits** defined in [`ports`], keeping this layer fully testable
//! without real peripherals.

pub mod commands;
pub mod events;
pub mod ports;
pub mod service;

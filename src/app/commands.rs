//! Inbound commands to the application service.
//!
//! These represent actions requested by the outside world that the
//! [`ClimateService`](super::service::ClimateService) interprets.
//!
//! The firmware binary has no inbound channel yet, so only the host tests
//! produce commands today.

use crate::config::SystemConfig;
use crate::control::pid::PidGains;

/// Commands that external adapters can send into the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppCommand {
    /// Change the target temperature (°C).  Controller state is kept.
    SetSetpoint(f64),

    /// Retune the controller.  Controller state is kept.
    SetGains(PidGains),

    /// Hot-reload the whole configuration.
    UpdateConfig(SystemConfig),

    /// Clear the integral and previous input.
    ResetController,

    /// Force the heater to zero duty until the next successful cycle.
    HeaterOff,

    /// Persist the current config at the next auto-save check.
    SaveConfig,
}

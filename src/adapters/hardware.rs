//! Hardware adapter — bridges real peripherals to domain port traits.
//!
//! Owns the [`SensorHub`] and the heater driver, exposing them through
//! [`SensorPort`] and [`ActuatorPort`].  This is the only module in the
//! system that touches actual hardware.  The one-wire line and timebase are
//! generic so the same adapter runs against GPIO on the device and against
//! the virtual-time simulator in tests.

use log::warn;

use crate::app::ports::{ActuatorPort, SensorPort};
use crate::drivers::heater::HeaterDriver;
use crate::error::ActuatorError;
use crate::sensors::dht22::DecoderStats;
use crate::sensors::one_wire::{OneWireLine, Timebase};
use crate::sensors::{CycleSnapshot, SensorHub};

/// Concrete adapter that combines all hardware behind port traits.
pub struct HardwareAdapter<L, T> {
    sensor_hub: SensorHub<L, T>,
    heater: HeaterDriver,
}

impl<L: OneWireLine, T: Timebase> HardwareAdapter<L, T> {
    pub fn new(sensor_hub: SensorHub<L, T>, heater: HeaterDriver) -> Self {
        Self { sensor_hub, heater }
    }

    pub fn sensors(&self) -> &SensorHub<L, T> {
        &self.sensor_hub
    }
}

// ── SensorPort implementation ─────────────────────────────────

impl<L: OneWireLine, T: Timebase> SensorPort for HardwareAdapter<L, T> {
    fn read_all(&mut self) -> CycleSnapshot {
        self.sensor_hub.read_all()
    }

    fn decoder_stats(&self) -> DecoderStats {
        self.sensor_hub.decoder_stats()
    }
}

// ── ActuatorPort implementation ───────────────────────────────

impl<L, T> ActuatorPort for HardwareAdapter<L, T> {
    fn set_heater_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.heater.set_duty(duty)
    }

    fn heater_duty(&self) -> u8 {
        self.heater.current_duty()
    }

    fn all_off(&mut self) {
        if let Err(e) = self.heater.off() {
            warn!("heater shutdown failed: {}", e);
        }
    }
}

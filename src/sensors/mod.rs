//! Sensor subsystem — individual drivers and the aggregating [`SensorHub`].
//!
//! The hub owns every sensor driver and produces a [`CycleSnapshot`] each
//! control cycle.

pub mod air_quality;
pub mod dht22;
pub mod one_wire;
#[cfg(not(target_os = "espidf"))]
pub mod sim;

use crate::error::{DecodeError, SensorError};
use air_quality::{AirQualityReading, AirQualitySensor};
use dht22::{DecoderStats, Dht22};
use one_wire::{OneWireLine, Timebase};

pub use dht22::SensorReading;

/// Everything sampled in one cycle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycleSnapshot {
    pub air_quality: Result<AirQualityReading, SensorError>,
    pub climate: Result<SensorReading, DecodeError>,
}

/// Aggregates all sensor drivers and produces a unified snapshot.
pub struct SensorHub<L, T> {
    pub climate: Dht22<L, T>,
    pub air_quality: AirQualitySensor,
}

impl<L: OneWireLine, T: Timebase> SensorHub<L, T> {
    /// Pass in pre-built drivers (built in main where peripheral ownership
    /// is established).
    pub fn new(climate: Dht22<L, T>, air_quality: AirQualitySensor) -> Self {
        Self {
            climate,
            air_quality,
        }
    }

    /// Sample the air-quality ADC, then run one DHT22 transaction.
    ///
    /// Individual failures are reported in the snapshot; neither read is
    /// retried here.
    pub fn read_all(&mut self) -> CycleSnapshot {
        CycleSnapshot {
            air_quality: self.air_quality.read(),
            climate: self.climate.read(),
        }
    }

    pub fn decoder_stats(&self) -> DecoderStats {
        self.climate.stats()
    }
}

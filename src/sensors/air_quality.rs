//! MQ-135 air-quality sensor.
//!
//! Reads the raw analog output through an ESP32-S3 ADC channel and keeps a
//! fixed-size history for a running average.  The value is reported only;
//! it never feeds the heater loop.
//!
//! ## Dual-target design
//!
//! On ESP-IDF: reads ADC1 via the oneshot API (initialised by hw_init).
//! On host/test: reads from a static `AtomicU16` for injection.

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicU16, Ordering};

use heapless::HistoryBuffer;

#[cfg(target_os = "espidf")]
use crate::drivers::hw_init;
use crate::error::SensorError;

#[cfg(not(target_os = "espidf"))]
static SIM_MQ135_ADC: AtomicU16 = AtomicU16::new(0);

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_mq135_adc(raw: u16) {
    SIM_MQ135_ADC.store(raw, Ordering::Relaxed);
}

const HISTORY_CAP: usize = 30;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AirQualityReading {
    pub raw: u16,
    /// Mean of the last (up to) 30 raw samples.
    pub avg_raw: f32,
}

pub struct AirQualitySensor {
    history: HistoryBuffer<u16, HISTORY_CAP>,
}

impl Default for AirQualitySensor {
    fn default() -> Self {
        Self::new()
    }
}

impl AirQualitySensor {
    pub fn new() -> Self {
        Self {
            history: HistoryBuffer::new(),
        }
    }

    pub fn read(&mut self) -> Result<AirQualityReading, SensorError> {
        let raw = self.read_adc()?;
        self.history.write(raw);
        Ok(AirQualityReading {
            raw,
            avg_raw: self.running_average(),
        })
    }

    #[cfg(target_os = "espidf")]
    fn read_adc(&self) -> Result<u16, SensorError> {
        hw_init::adc1_read(hw_init::ADC1_CH_MQ135)
    }

    #[cfg(not(target_os = "espidf"))]
    fn read_adc(&self) -> Result<u16, SensorError> {
        Ok(SIM_MQ135_ADC.load(Ordering::Relaxed))
    }

    fn running_average(&self) -> f32 {
        if self.history.len() == 0 {
            return 0.0;
        }
        let sum: u32 = self.history.as_slice().iter().map(|&v| u32::from(v)).sum();
        sum as f32 / self.history.len() as f32
    }
}

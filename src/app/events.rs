//! Outbound application events.
//!
//! The [`ClimateService`](super::service::ClimateService) emits these
//! through the [`EventSink`](super::ports::EventSink) port.  Adapters on the
//! other side decide what to do with them.

use serde::Serialize;

use crate::control::pid::{PidState, Saturation};
use crate::error::DecodeError;
use crate::sensors::dht22::DecoderStats;

/// Structured events emitted by the application core.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    /// The service has started (carries the active setpoint).
    Started { setpoint_c: f64 },

    /// Periodic telemetry snapshot.
    Telemetry(TelemetryData),

    /// Air-quality ADC sample for this cycle.
    AirQuality { raw: u16, avg_raw: f32 },

    /// The DHT22 read failed; the controller was not updated this cycle.
    DecodeFailed {
        reason: DecodeError,
        consecutive: u32,
    },

    /// The controller output fell outside the duty range.
    OutputSaturated {
        raw: f64,
        duty: u8,
        saturation: Saturation,
    },

    /// Runtime configuration or tuning changed.
    ConfigUpdated,

    /// The heater was forced off by command.
    HeaterOff,
}

/// A point-in-time telemetry snapshot suitable for logging.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TelemetryData {
    pub cycle: u64,
    pub temperature_c: Option<f32>,
    pub humidity_percent: Option<f32>,
    pub air_quality_raw: Option<u16>,
    pub setpoint_c: f64,
    pub heater_duty: u8,
    pub controller: PidState,
    pub decoder: DecoderStats,
}

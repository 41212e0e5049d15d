//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing structured application events to
//! the ESP-IDF logger (which goes to UART / USB-CDC in production).
//! Telemetry is additionally dumped as one JSON line at `debug` level for
//! host-side tooling.

use log::{debug, info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

fn or_dash<T: core::fmt::Display>(v: Option<T>) -> String {
    v.map_or_else(|| "-".to_string(), |v| format!("{:.1}", v))
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Telemetry(t) => {
                info!(
                    "TELEM | #{} | T={}\u{00b0}C RH={}% | AQ={} | set={:.1}\u{00b0}C duty={} | \
                     I={:.1} | dht ok={}/{}",
                    t.cycle,
                    or_dash(t.temperature_c),
                    or_dash(t.humidity_percent),
                    t.air_quality_raw
                        .map_or_else(|| "-".to_string(), |v| v.to_string()),
                    t.setpoint_c,
                    t.heater_duty,
                    t.controller.integral,
                    t.decoder.successes,
                    t.decoder.attempts,
                );
                match serde_json::to_string(t) {
                    Ok(json) => debug!("TELEM-JSON {}", json),
                    Err(e) => warn!("telemetry serialization failed: {}", e),
                }
            }
            AppEvent::AirQuality { raw, avg_raw } => {
                info!("AIR   | raw={} avg={:.1}", raw, avg_raw);
            }
            AppEvent::DecodeFailed {
                reason,
                consecutive,
            } => {
                info!("DHT   | read failed: {} (x{})", reason, consecutive);
            }
            AppEvent::OutputSaturated {
                raw,
                duty,
                saturation,
            } => {
                info!("PID   | saturated {:?}: raw={:.1} duty={}", saturation, raw, duty);
            }
            AppEvent::ConfigUpdated => {
                info!("CFG   | updated");
            }
            AppEvent::HeaterOff => {
                info!("HEAT  | forced off");
            }
            AppEvent::Started { setpoint_c } => {
                info!("START | setpoint={:.1}\u{00b0}C", setpoint_c);
            }
        }
    }
}

//! Environmental controller firmware — main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                   Adapters (outer ring)                    │
//! │                                                            │
//! │  HardwareAdapter    LogEventSink    NvsAdapter             │
//! │  (Sensor+Actuator)  (EventSink)     (ConfigPort)           │
//! │  GpioLine + SystemTimebase → Dht22                         │
//! │                                                            │
//! │  ──────────────── Port Trait Boundary ───────────────      │
//! │                                                            │
//! │  ┌──────────────────────────────────────────────────┐      │
//! │  │          ClimateService (pure logic)             │      │
//! │  │          decode · PID · heater duty              │      │
//! │  └──────────────────────────────────────────────────┘      │
//! └────────────────────────────────────────────────────────────┘
//! ```
#![deny(unused_must_use)]

use anyhow::Result;
use log::{error, info, warn};

use envctl::adapters::gpio_line::GpioLine;
use envctl::adapters::hardware::HardwareAdapter;
use envctl::adapters::log_sink::LogEventSink;
use envctl::adapters::nvs::NvsAdapter;
use envctl::adapters::time::SystemTimebase;
use envctl::app::ports::{ActuatorPort, ConfigPort};
use envctl::app::service::ClimateService;
use envctl::config::SystemConfig;
use envctl::drivers::{heater::HeaterDriver, hw_init};
use envctl::pins;
use envctl::sensors::air_quality::AirQualitySensor;
use envctl::sensors::dht22::Dht22;
use envctl::sensors::SensorHub;

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("envctl v{}", env!("CARGO_PKG_VERSION"));

    // ── 2. Initialise hardware peripherals ────────────────────
    // Without the heater PWM there is nothing safe to do; bail out and let
    // the bootloader restart us.
    hw_init::init_peripherals().map_err(envctl::error::Error::from)?;

    // ── 3. Load config from NVS (or defaults) ─────────────────
    let nvs = NvsAdapter::new();
    let config = match nvs.as_ref().map(ConfigPort::load) {
        Ok(Ok(cfg)) => cfg,
        Ok(Err(e)) => {
            warn!("NVS config load failed ({}), using defaults", e);
            SystemConfig::default()
        }
        Err(e) => {
            warn!("NVS init failed ({}), running with defaults and no persistence", e);
            SystemConfig::default()
        }
    };

    // ── 4. Construct adapters ─────────────────────────────────
    let dht = Dht22::new(GpioLine::new(pins::DHT_DATA_GPIO), SystemTimebase::new());
    let sensor_hub = SensorHub::new(dht, AirQualitySensor::new());
    let mut hw = HardwareAdapter::new(sensor_hub, HeaterDriver::new());
    let mut log_sink = LogEventSink::new();

    // ── 5. Construct app service ──────────────────────────────
    let mut app = ClimateService::new(config);
    app.start(&mut log_sink);
    if let Err(e) = hw.set_heater_duty(0) {
        error!("heater did not accept initial duty: {}", e);
    }

    info!("System ready. Entering control loop.");

    // ── 6. Control loop ───────────────────────────────────────
    loop {
        // Errors are already logged and reported as events by the service.
        let _ = app.tick(&mut hw, &mut log_sink);

        if let Ok(nvs) = &nvs {
            app.auto_save_if_needed(nvs);
        }

        esp_idf_hal::delay::FreeRtos::delay_ms(app.cycle_interval().as_millis() as u32);
    }
}

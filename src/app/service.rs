//! Application service — the hexagonal core.
//!
//! [`ClimateService`] owns the heater controller and the live configuration.
//! All I/O flows through port traits injected at call sites, making the
//! whole service testable with mock adapters.
//!
//! ```text
//!  SensorPort ──▶ ┌────────────────────────┐ ──▶ EventSink
//!                 │     ClimateService      │
//! ActuatorPort ◀──│   PID · config · stats  │
//!                 └────────────────────────┘
//! ```
//!
//! The controller sees only the temperature value handed to it; a failed
//! sensor read skips the update entirely, so controller state and heater
//! duty stay frozen until the next good reading.

use core::time::Duration;

use log::{error, info, warn};

use crate::config::SystemConfig;
use crate::control::pid::{ControlOutput, PidController, PidState};
use crate::error::Result;
use crate::sensors::SensorReading;

use super::commands::AppCommand;
use super::events::{AppEvent, TelemetryData};
use super::ports::{ActuatorPort, ConfigPort, EventSink, SensorPort};

/// Quiet period after the last config change before it is persisted.
const AUTO_SAVE_DEBOUNCE_MS: u64 = 5_000;

// ───────────────────────────────────────────────────────────────
// ClimateService
// ───────────────────────────────────────────────────────────────

/// The application service orchestrates all domain logic.
pub struct ClimateService {
    config: SystemConfig,
    pid: PidController,
    cycle_count: u64,
    consecutive_failures: u32,
    last_reading: Option<SensorReading>,
    last_air_quality: Option<u16>,
    last_duty: u8,
    config_dirty: bool,
    dirty_since_cycle: u64,
    save_requested: bool,
}

impl ClimateService {
    /// Construct the service from configuration.
    ///
    /// Does **not** touch hardware — call [`start`](Self::start) next.
    pub fn new(config: SystemConfig) -> Self {
        let pid = PidController::new(config.pid_config());
        Self {
            config,
            pid,
            cycle_count: 0,
            consecutive_failures: 0,
            last_reading: None,
            last_air_quality: None,
            last_duty: 0,
            config_dirty: false,
            dirty_since_cycle: 0,
            save_requested: false,
        }
    }

    // ── Lifecycle ─────────────────────────────────────────────

    pub fn start(&mut self, sink: &mut impl EventSink) {
        sink.emit(&AppEvent::Started {
            setpoint_c: self.config.setpoint_c,
        });
        info!(
            "ClimateService started: setpoint={:.1}\u{00b0}C interval={}ms",
            self.config.setpoint_c, self.config.cycle_interval_ms
        );
    }

    // ── Per-cycle orchestration ───────────────────────────────

    /// Run one full cycle: sample sensors → PID → heater.
    ///
    /// Returns the controller output applied this cycle, or the reason the
    /// cycle was skipped.  Errors are informational; the caller just waits
    /// for the next cycle.
    pub fn tick(
        &mut self,
        hw: &mut (impl SensorPort + ActuatorPort),
        sink: &mut impl EventSink,
    ) -> Result<ControlOutput> {
        self.cycle_count += 1;

        // 1. Sample
        let snapshot = hw.read_all();

        match snapshot.air_quality {
            Ok(aq) => {
                self.last_air_quality = Some(aq.raw);
                sink.emit(&AppEvent::AirQuality {
                    raw: aq.raw,
                    avg_raw: aq.avg_raw,
                });
            }
            Err(e) => warn!("air quality: {}", e),
        }

        // 2. No reading → no control update
        let reading = match snapshot.climate {
            Ok(reading) => reading,
            Err(reason) => {
                self.consecutive_failures = self.consecutive_failures.saturating_add(1);
                if self.consecutive_failures >= self.config.failure_alarm_threshold {
                    error!(
                        "DHT22 failed {} cycles in a row ({}), heater held at duty {}",
                        self.consecutive_failures, reason, self.last_duty
                    );
                } else {
                    warn!("DHT22 read failed: {}", reason);
                }
                sink.emit(&AppEvent::DecodeFailed {
                    reason,
                    consecutive: self.consecutive_failures,
                });
                self.maybe_emit_telemetry(&*hw, sink);
                return Err(reason.into());
            }
        };
        self.consecutive_failures = 0;
        self.last_reading = Some(reading);

        // 3. PID
        let output = self.pid.update(f64::from(reading.temperature_celsius));
        if output.is_saturated() {
            warn!(
                "PID output {:.1} outside duty range, saturated {:?}",
                output.raw, output.saturation
            );
            sink.emit(&AppEvent::OutputSaturated {
                raw: output.raw,
                duty: output.duty,
                saturation: output.saturation,
            });
        }

        // 4. Heater
        let applied = hw.set_heater_duty(output.duty);
        match applied {
            Ok(()) => self.last_duty = output.duty,
            Err(e) => warn!("heater write failed: {}", e),
        }

        self.maybe_emit_telemetry(&*hw, sink);
        applied?;
        Ok(output)
    }

    // ── Command handling ──────────────────────────────────────

    /// Process an external command.
    pub fn handle_command(
        &mut self,
        cmd: AppCommand,
        hw: &mut impl ActuatorPort,
        sink: &mut impl EventSink,
    ) {
        match cmd {
            AppCommand::SetSetpoint(setpoint_c) => {
                let candidate = SystemConfig {
                    setpoint_c,
                    ..self.config.clone()
                };
                self.apply_config(candidate, sink);
            }
            AppCommand::SetGains(gains) => {
                let candidate = SystemConfig {
                    kp: gains.kp,
                    ki: gains.ki,
                    kd: gains.kd,
                    ..self.config.clone()
                };
                self.apply_config(candidate, sink);
            }
            AppCommand::UpdateConfig(new_config) => {
                self.apply_config(new_config, sink);
            }
            AppCommand::ResetController => {
                self.pid.reset();
                info!("Controller state reset");
            }
            AppCommand::HeaterOff => {
                hw.all_off();
                self.last_duty = hw.heater_duty();
                sink.emit(&AppEvent::HeaterOff);
                info!("Heater forced off");
            }
            AppCommand::SaveConfig => {
                self.mark_config_dirty();
                self.save_requested = true;
                info!("Explicit config save requested (will flush on next auto-save check)");
            }
        }
    }

    // ── Queries ───────────────────────────────────────────────

    /// Build a telemetry snapshot from the current state.
    pub fn build_telemetry(&self, sensors: &impl SensorPort) -> TelemetryData {
        TelemetryData {
            cycle: self.cycle_count,
            temperature_c: self.last_reading.map(|r| r.temperature_celsius),
            humidity_percent: self.last_reading.map(|r| r.relative_humidity_percent),
            air_quality_raw: self.last_air_quality,
            setpoint_c: self.config.setpoint_c,
            heater_duty: self.last_duty,
            controller: self.pid.state(),
            decoder: sensors.decoder_stats(),
        }
    }

    pub fn cycle_count(&self) -> u64 {
        self.cycle_count
    }

    pub fn controller_state(&self) -> PidState {
        self.pid.state()
    }

    /// Duty most recently accepted by the heater.
    pub fn heater_duty(&self) -> u8 {
        self.last_duty
    }

    pub fn last_reading(&self) -> Option<SensorReading> {
        self.last_reading
    }

    pub fn consecutive_failures(&self) -> u32 {
        self.consecutive_failures
    }

    pub fn cycle_interval(&self) -> Duration {
        Duration::from_millis(u64::from(self.config.cycle_interval_ms))
    }

    /// Clone of the live configuration.
    pub fn current_config(&self) -> SystemConfig {
        self.config.clone()
    }

    // ── Internal ──────────────────────────────────────────────

    fn apply_config(&mut self, candidate: SystemConfig, sink: &mut impl EventSink) {
        if let Err(e) = candidate.validate() {
            warn!("Rejected configuration: {}", e);
            return;
        }
        self.pid.set_config(candidate.pid_config());
        self.config = candidate;
        self.mark_config_dirty();
        sink.emit(&AppEvent::ConfigUpdated);
        info!("Configuration updated at runtime");
    }

    fn maybe_emit_telemetry(&self, hw: &impl SensorPort, sink: &mut impl EventSink) {
        let every = u64::from(self.config.telemetry_every_cycles.max(1));
        if self.cycle_count % every == 0 {
            sink.emit(&AppEvent::Telemetry(self.build_telemetry(hw)));
        }
    }

    // ── Config dirty-flag management ──────────────────────────

    /// Mark the config as modified.
    pub fn mark_config_dirty(&mut self) {
        if !self.config_dirty {
            self.config_dirty = true;
            self.dirty_since_cycle = self.cycle_count;
        }
    }

    /// Persist the config once it has been quiet for the debounce period,
    /// or right away after [`AppCommand::SaveConfig`].
    /// Returns `true` if the config was saved.
    pub fn auto_save_if_needed(&mut self, storage: &impl ConfigPort) -> bool {
        if !self.config_dirty {
            return false;
        }
        let cycles_since_dirty = self.cycle_count.saturating_sub(self.dirty_since_cycle);
        let ms_since_dirty = cycles_since_dirty * u64::from(self.config.cycle_interval_ms);
        if !self.save_requested && ms_since_dirty < AUTO_SAVE_DEBOUNCE_MS {
            return false;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                self.save_requested = false;
                info!("Config auto-saved");
                true
            }
            Err(e) => {
                warn!("Config auto-save failed: {}", e);
                false
            }
        }
    }

    /// Force-save if dirty (call before shutdown).
    pub fn force_save_if_dirty(&mut self, storage: &impl ConfigPort) {
        if !self.config_dirty {
            return;
        }
        match storage.save(&self.config) {
            Ok(()) => {
                self.config_dirty = false;
                self.save_requested = false;
                info!("Config force-saved");
            }
            Err(e) => {
                warn!("Config force-save failed: {}", e);
            }
        }
    }

    /// Whether the config has unsaved changes.
    pub fn is_config_dirty(&self) -> bool {
        self.config_dirty
    }
}

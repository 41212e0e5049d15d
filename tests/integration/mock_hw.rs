//! Mock hardware adapter for integration tests.
//!
//! Replays scripted sensor snapshots and records every actuator call so
//! tests can assert on the full command history without touching real
//! GPIO/PWM registers.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;

use envctl::app::events::AppEvent;
use envctl::app::ports::{ActuatorPort, ConfigError, ConfigPort, EventSink, SensorPort};
use envctl::config::SystemConfig;
use envctl::error::{ActuatorError, DecodeError};
use envctl::sensors::air_quality::AirQualityReading;
use envctl::sensors::dht22::DecoderStats;
use envctl::sensors::{CycleSnapshot, SensorReading};

// ── Actuator call record ──────────────────────────────────────

#[derive(Debug, Clone, PartialEq)]
pub enum ActuatorCall {
    SetHeater { duty: u8 },
    AllOff,
}

// ── MockHardware ──────────────────────────────────────────────

pub struct MockHardware {
    pub calls: Vec<ActuatorCall>,
    pub fail_pwm: bool,
    snapshots: VecDeque<CycleSnapshot>,
    stats: DecoderStats,
    duty: u8,
}

#[allow(dead_code)]
impl MockHardware {
    pub fn new() -> Self {
        Self {
            calls: Vec::new(),
            fail_pwm: false,
            snapshots: VecDeque::new(),
            stats: DecoderStats::default(),
            duty: 0,
        }
    }

    /// Queue a good climate reading for the next cycle.
    pub fn push_reading(&mut self, temperature_celsius: f32) {
        self.snapshots.push_back(CycleSnapshot {
            air_quality: Ok(AirQualityReading {
                raw: 400,
                avg_raw: 400.0,
            }),
            climate: Ok(SensorReading {
                temperature_celsius,
                relative_humidity_percent: 45.0,
            }),
        });
    }

    /// Queue a failed climate read for the next cycle.
    pub fn push_failure(&mut self, reason: DecodeError) {
        self.snapshots.push_back(CycleSnapshot {
            air_quality: Ok(AirQualityReading {
                raw: 400,
                avg_raw: 400.0,
            }),
            climate: Err(reason),
        });
    }

    pub fn heater_writes(&self) -> Vec<u8> {
        self.calls
            .iter()
            .filter_map(|c| match c {
                ActuatorCall::SetHeater { duty } => Some(*duty),
                ActuatorCall::AllOff => None,
            })
            .collect()
    }
}

impl Default for MockHardware {
    fn default() -> Self {
        Self::new()
    }
}

impl ActuatorPort for MockHardware {
    fn set_heater_duty(&mut self, duty: u8) -> Result<(), ActuatorError> {
        self.calls.push(ActuatorCall::SetHeater { duty });
        if self.fail_pwm {
            return Err(ActuatorError::PwmWriteFailed);
        }
        self.duty = duty;
        Ok(())
    }

    fn heater_duty(&self) -> u8 {
        self.duty
    }

    fn all_off(&mut self) {
        self.calls.push(ActuatorCall::AllOff);
        self.duty = 0;
    }
}

// ── SensorPort for MockHardware ──────────────────────────────

impl SensorPort for MockHardware {
    /// Pops the next scripted snapshot; an empty script looks like an
    /// unplugged sensor.
    fn read_all(&mut self) -> CycleSnapshot {
        let snapshot = self.snapshots.pop_front().unwrap_or(CycleSnapshot {
            air_quality: Ok(AirQualityReading {
                raw: 0,
                avg_raw: 0.0,
            }),
            climate: Err(DecodeError::StartAckTimeout),
        });
        self.stats.attempts += 1;
        match snapshot.climate {
            Ok(_) => self.stats.successes += 1,
            Err(_) => self.stats.consecutive_failures += 1,
        }
        snapshot
    }

    fn decoder_stats(&self) -> DecoderStats {
        self.stats
    }
}

// ── MockNvs ───────────────────────────────────────────────────

pub struct MockNvs {
    pub stored: RefCell<Option<SystemConfig>>,
    pub saves: Cell<u32>,
}

#[allow(dead_code)]
impl MockNvs {
    pub fn new() -> Self {
        Self {
            stored: RefCell::new(None),
            saves: Cell::new(0),
        }
    }
}

impl Default for MockNvs {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigPort for MockNvs {
    fn load(&self) -> Result<SystemConfig, ConfigError> {
        Ok(self.stored.borrow().clone().unwrap_or_default())
    }

    fn save(&self, config: &SystemConfig) -> Result<(), ConfigError> {
        config.validate()?;
        *self.stored.borrow_mut() = Some(config.clone());
        self.saves.set(self.saves.get() + 1);
        Ok(())
    }
}

// ── Recording event sink ─────────────────────────────────────

pub struct LogSink {
    pub events: Vec<AppEvent>,
}

#[allow(dead_code)]
impl LogSink {
    pub fn new() -> Self {
        Self { events: Vec::new() }
    }

    pub fn count(&self, pred: impl Fn(&AppEvent) -> bool) -> usize {
        self.events.iter().filter(|e| pred(e)).count()
    }
}

impl Default for LogSink {
    fn default() -> Self {
        Self::new()
    }
}

impl EventSink for LogSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.push(event.clone());
    }
}

//! Integration tests for the ClimateService → PID → heater pipeline.
//!
//! These run on the host (x86_64) and drive whole control cycles through
//! mock adapters, then through the simulated DHT22 line.

use super::mock_hw::{ActuatorCall, LogSink, MockHardware, MockNvs};

use envctl::adapters::hardware::HardwareAdapter;
use envctl::app::commands::AppCommand;
use envctl::app::events::AppEvent;
use envctl::app::ports::ConfigPort;
use envctl::app::service::ClimateService;
use envctl::config::SystemConfig;
use envctl::control::pid::{PidGains, PidState, Saturation};
use envctl::drivers::heater::HeaterDriver;
use envctl::error::{ActuatorError, DecodeError, Error, SensorError};
use envctl::sensors::SensorHub;
use envctl::sensors::air_quality::AirQualitySensor;
use envctl::sensors::dht22::{Dht22, Frame};
use envctl::sensors::sim::{SimLine, SimTimebase, VirtualClock};

fn make_app() -> (ClimateService, MockHardware, LogSink) {
    let mut app = ClimateService::new(SystemConfig::default());
    let hw = MockHardware::new();
    let mut sink = LogSink::new();
    app.start(&mut sink);
    (app, hw, sink)
}

// ── Control cycle ────────────────────────────────────────────

#[test]
fn start_announces_setpoint() {
    let (_app, _hw, sink) = make_app();
    assert_eq!(sink.events, vec![AppEvent::Started { setpoint_c: 30.0 }]);
}

#[test]
fn good_readings_drive_heater_with_pid_duty() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_reading(25.0);
    hw.push_reading(28.0);

    let first = app.tick(&mut hw, &mut sink).unwrap();
    assert_eq!(first.duty, 10);
    let second = app.tick(&mut hw, &mut sink).unwrap();
    assert_eq!(second.duty, 36);

    assert_eq!(hw.heater_writes(), vec![10, 36]);
    assert_eq!(app.heater_duty(), 36);
    assert_eq!(
        app.controller_state(),
        PidState {
            integral: 7.0,
            previous_input: 28.0
        }
    );
}

#[test]
fn failed_read_leaves_controller_and_heater_untouched() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_reading(25.0);
    hw.push_failure(DecodeError::ChecksumMismatch);

    app.tick(&mut hw, &mut sink).unwrap();
    let state_before = app.controller_state();

    let err = app.tick(&mut hw, &mut sink).unwrap_err();
    assert_eq!(
        err,
        Error::Sensor(SensorError::Decode(DecodeError::ChecksumMismatch))
    );
    assert_eq!(app.controller_state(), state_before);
    assert_eq!(hw.heater_writes(), vec![10]);
    assert_eq!(app.heater_duty(), 10);
    assert!(sink.events.contains(&AppEvent::DecodeFailed {
        reason: DecodeError::ChecksumMismatch,
        consecutive: 1,
    }));
}

#[test]
fn consecutive_failures_count_up_and_reset_on_success() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_failure(DecodeError::StartAckTimeout);
    hw.push_failure(DecodeError::BitTimingTimeout);
    hw.push_reading(30.0);

    assert!(app.tick(&mut hw, &mut sink).is_err());
    assert!(app.tick(&mut hw, &mut sink).is_err());
    assert_eq!(app.consecutive_failures(), 2);
    assert!(sink.events.contains(&AppEvent::DecodeFailed {
        reason: DecodeError::BitTimingTimeout,
        consecutive: 2,
    }));

    app.tick(&mut hw, &mut sink).unwrap();
    assert_eq!(app.consecutive_failures(), 0);
}

#[test]
fn saturated_output_is_pinned_and_reported() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_reading(-20.0);

    let out = app.tick(&mut hw, &mut sink).unwrap();
    assert_eq!(out.duty, 255);
    assert_eq!(out.saturation, Saturation::High);
    assert_eq!(
        sink.count(|e| matches!(
            e,
            AppEvent::OutputSaturated {
                duty: 255,
                saturation: Saturation::High,
                ..
            }
        )),
        1
    );
}

#[test]
fn output_above_setpoint_floors_at_zero() {
    let (mut app, mut hw, mut sink) = make_app();
    // error = -10, integral = -10, derivative = 40 → -20 - 50 - 40
    hw.push_reading(40.0);
    let out = app.tick(&mut hw, &mut sink).unwrap();
    assert_eq!(out.raw, -110.0);
    assert_eq!(out.duty, 0);
    assert_eq!(out.saturation, Saturation::Low);
}

#[test]
fn pwm_failure_is_returned_and_duty_not_updated() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_reading(25.0);
    hw.fail_pwm = true;

    let err = app.tick(&mut hw, &mut sink).unwrap_err();
    assert_eq!(err, Error::Actuator(ActuatorError::PwmWriteFailed));
    assert_eq!(app.heater_duty(), 0);
    // The controller still advanced on the good reading.
    assert_eq!(app.controller_state().integral, 5.0);
}

#[test]
fn air_quality_is_reported_every_cycle() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_reading(25.0);
    hw.push_failure(DecodeError::ResponseLowTimeout);
    let _ = app.tick(&mut hw, &mut sink);
    let _ = app.tick(&mut hw, &mut sink);
    assert_eq!(
        sink.count(|e| matches!(e, AppEvent::AirQuality { raw: 400, .. })),
        2
    );
}

#[test]
fn telemetry_honours_cycle_divider() {
    let config = SystemConfig {
        telemetry_every_cycles: 2,
        ..SystemConfig::default()
    };
    let mut app = ClimateService::new(config);
    let mut hw = MockHardware::new();
    let mut sink = LogSink::new();
    for _ in 0..4 {
        hw.push_reading(29.0);
    }
    for _ in 0..4 {
        app.tick(&mut hw, &mut sink).unwrap();
    }

    let telemetry: Vec<_> = sink
        .events
        .iter()
        .filter_map(|e| match e {
            AppEvent::Telemetry(t) => Some(t.clone()),
            _ => None,
        })
        .collect();
    assert_eq!(telemetry.len(), 2);
    assert_eq!(telemetry[1].cycle, 4);
    assert_eq!(telemetry[1].temperature_c, Some(29.0));
    assert_eq!(telemetry[1].decoder.successes, 4);
}

#[test]
fn telemetry_after_failure_keeps_last_good_reading() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_reading(26.5);
    hw.push_failure(DecodeError::StartAckTimeout);
    app.tick(&mut hw, &mut sink).unwrap();
    let _ = app.tick(&mut hw, &mut sink);

    let t = app.build_telemetry(&hw);
    assert_eq!(t.cycle, 2);
    assert_eq!(t.temperature_c, Some(26.5));
    assert_eq!(t.humidity_percent, Some(45.0));
}

// ── Commands ─────────────────────────────────────────────────

#[test]
fn set_setpoint_keeps_controller_state() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_reading(25.0);
    app.tick(&mut hw, &mut sink).unwrap();
    let state = app.controller_state();

    app.handle_command(AppCommand::SetSetpoint(35.0), &mut hw, &mut sink);
    assert_eq!(app.current_config().setpoint_c, 35.0);
    assert_eq!(app.controller_state(), state);
    assert!(app.is_config_dirty());
    assert_eq!(sink.events.last(), Some(&AppEvent::ConfigUpdated));

    // error = 10, integral = 15, derivative = 0 → 20 + 75
    hw.push_reading(25.0);
    assert_eq!(app.tick(&mut hw, &mut sink).unwrap().duty, 95);
}

#[test]
fn out_of_range_setpoint_is_rejected() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(AppCommand::SetSetpoint(500.0), &mut hw, &mut sink);
    assert_eq!(app.current_config().setpoint_c, 30.0);
    assert!(!app.is_config_dirty());
    assert!(!sink.events.contains(&AppEvent::ConfigUpdated));
}

#[test]
fn set_gains_retunes_next_cycle() {
    let (mut app, mut hw, mut sink) = make_app();
    app.handle_command(
        AppCommand::SetGains(PidGains {
            kp: 1.0,
            ki: 0.0,
            kd: 0.0,
        }),
        &mut hw,
        &mut sink,
    );
    hw.push_reading(20.0);
    assert_eq!(app.tick(&mut hw, &mut sink).unwrap().duty, 10);
}

#[test]
fn reset_controller_clears_state() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_reading(25.0);
    app.tick(&mut hw, &mut sink).unwrap();
    app.handle_command(AppCommand::ResetController, &mut hw, &mut sink);
    assert_eq!(app.controller_state(), PidState::default());
}

#[test]
fn heater_off_command_kills_output_until_next_cycle() {
    let (mut app, mut hw, mut sink) = make_app();
    hw.push_reading(25.0);
    app.tick(&mut hw, &mut sink).unwrap();

    app.handle_command(AppCommand::HeaterOff, &mut hw, &mut sink);
    assert_eq!(hw.calls.last(), Some(&ActuatorCall::AllOff));
    assert_eq!(app.heater_duty(), 0);
    assert_eq!(sink.events.last(), Some(&AppEvent::HeaterOff));

    hw.push_reading(25.0);
    app.tick(&mut hw, &mut sink).unwrap();
    assert!(app.heater_duty() > 0);
}

#[test]
fn update_config_applies_windup_policy() {
    let (mut app, mut hw, mut sink) = make_app();
    let cfg = SystemConfig {
        anti_windup: true,
        ..SystemConfig::default()
    };
    app.handle_command(AppCommand::UpdateConfig(cfg.clone()), &mut hw, &mut sink);
    assert_eq!(app.current_config(), cfg);

    hw.push_reading(-20.0);
    app.tick(&mut hw, &mut sink).unwrap();
    assert_eq!(app.controller_state().integral, 0.0);
}

// ── Persistence ──────────────────────────────────────────────

#[test]
fn auto_save_waits_for_debounce() {
    let (mut app, mut hw, mut sink) = make_app();
    let nvs = MockNvs::new();
    app.handle_command(AppCommand::SetSetpoint(22.0), &mut hw, &mut sink);

    assert!(!app.auto_save_if_needed(&nvs));
    // 2 s cycles: three cycles clear the 5 s quiet period.
    for _ in 0..3 {
        let _ = app.tick(&mut hw, &mut sink);
    }
    assert!(app.auto_save_if_needed(&nvs));
    assert!(!app.is_config_dirty());
    assert_eq!(nvs.load().unwrap().setpoint_c, 22.0);
    assert!(!app.auto_save_if_needed(&nvs));
    assert_eq!(nvs.saves.get(), 1);
}

#[test]
fn save_command_flushes_without_waiting() {
    let (mut app, mut hw, mut sink) = make_app();
    let nvs = MockNvs::new();
    app.handle_command(AppCommand::SaveConfig, &mut hw, &mut sink);
    assert!(app.auto_save_if_needed(&nvs));
    assert_eq!(nvs.saves.get(), 1);
}

#[test]
fn force_save_writes_pending_changes() {
    let (mut app, mut hw, mut sink) = make_app();
    let nvs = MockNvs::new();
    app.force_save_if_dirty(&nvs);
    assert_eq!(nvs.saves.get(), 0);

    app.handle_command(AppCommand::SetSetpoint(31.0), &mut hw, &mut sink);
    app.force_save_if_dirty(&nvs);
    assert_eq!(nvs.saves.get(), 1);
    assert!(!app.is_config_dirty());
}

// ── End to end over the simulated line ───────────────────────

#[test]
fn simulated_dht22_drives_the_control_loop() {
    let clock = VirtualClock::new();
    let line = SimLine::new(&clock);
    // 50.0 %RH at 25.0 °C, then 28.0 °C
    line.push_reply(Frame::with_checksum([0x01, 0xF4, 0x00, 0xFA]));
    line.push_reply(Frame::with_checksum([0x01, 0xF4, 0x01, 0x18]));
    // Corrupt checksum on the third transaction.
    line.push_reply(Frame::new([0x01, 0xF4, 0x01, 0x18, 0x00]));

    let hub = SensorHub::new(
        Dht22::new(line.clone(), SimTimebase::new(&clock)),
        AirQualitySensor::new(),
    );
    let mut hw = HardwareAdapter::new(hub, HeaterDriver::new());
    let mut app = ClimateService::new(SystemConfig::default());
    let mut sink = LogSink::new();
    app.start(&mut sink);

    assert_eq!(app.tick(&mut hw, &mut sink).unwrap().duty, 10);
    assert_eq!(app.tick(&mut hw, &mut sink).unwrap().duty, 36);
    assert_eq!(
        app.tick(&mut hw, &mut sink).unwrap_err(),
        Error::Sensor(SensorError::Decode(DecodeError::ChecksumMismatch))
    );
    assert_eq!(app.heater_duty(), 36);
    assert_eq!(line.transactions(), 3);

    let t = app.build_telemetry(&hw);
    assert_eq!(t.decoder.attempts, 3);
    assert_eq!(t.decoder.successes, 2);
    assert_eq!(t.decoder.checksum_mismatches, 1);
}

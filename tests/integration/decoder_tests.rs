//! DHT22 decoder against the virtual-time line: timing margins, clock
//! wrap-around and every timeout path.

use envctl::error::DecodeError;
use envctl::sensors::dht22::{Dht22, FRAME_BITS, Frame};
use envctl::sensors::one_wire::PinDirection;
use envctl::sensors::sim::{Pulse, SimLine, SimTimebase, VirtualClock, timing};

fn rig(clock: VirtualClock) -> (SimLine, Dht22<SimLine, SimTimebase>) {
    let line = SimLine::new(&clock);
    let dht = Dht22::new(line.clone(), SimTimebase::new(&clock));
    (line, dht)
}

fn frame_bits(frame: Frame) -> Vec<bool> {
    let bytes = frame.bytes();
    (0..FRAME_BITS)
        .map(|i| bytes[i / 8] & (0x80 >> (i % 8)) != 0)
        .collect()
}

/// Reply with custom high widths for 0 and 1 bits.
fn skewed_reply(frame: Frame, zero_us: u32, one_us: u32) -> Vec<Pulse> {
    let mut script = SimLine::handshake();
    for bit in frame_bits(frame) {
        script.push(Pulse::low(timing::BIT_LOW_US));
        script.push(Pulse::high(if bit { one_us } else { zero_us }));
    }
    script.push(Pulse::low(timing::END_LOW_US));
    script
}

#[test]
fn decodes_across_timer_wraparound() {
    // The 18 ms wake pulse straddles u32::MAX.
    let (line, mut dht) = rig(VirtualClock::starting_at(u32::MAX - 10_000));
    line.push_reply(Frame::with_checksum([0x02, 0x8C, 0x01, 0x5F]));
    let r = dht.read().unwrap();
    assert!((r.temperature_celsius - 35.1).abs() < 1e-4);
    assert_eq!(line.last_wake_pulse_us(), Some(18_000));
}

#[test]
fn tolerates_bit_width_jitter_around_threshold() {
    let frame = Frame::with_checksum([0x55, 0xAA, 0x0F, 0xF0]);
    let (line, mut dht) = rig(VirtualClock::new());
    line.push_script(skewed_reply(frame, 35, 50));
    assert_eq!(dht.read_frame().unwrap(), frame);
}

#[test]
fn forty_us_high_is_zero_and_forty_one_is_one() {
    let frame = Frame::with_checksum([0x55, 0xAA, 0x0F, 0xF0]);
    let (line, mut dht) = rig(VirtualClock::new());
    line.push_script(skewed_reply(frame, 40, 41));
    assert_eq!(dht.read_frame(), Ok(frame));
}

#[test]
fn slow_polling_still_decodes() {
    let frame = Frame::with_checksum([0x01, 0x90, 0x00, 0xC8]);
    let (line, mut dht) = rig(VirtualClock::new());
    line.set_poll_cost_us(5);
    line.push_reply(frame);
    let r = dht.read().unwrap();
    assert!((r.relative_humidity_percent - 40.0).abs() < 1e-4);
    assert!((r.temperature_celsius - 20.0).abs() < 1e-4);
}

#[test]
fn late_ack_times_out() {
    let (line, mut dht) = rig(VirtualClock::new());
    let reply = SimLine::reply_for(Frame::with_checksum([1, 2, 3, 4]));
    let mut script = vec![Pulse::high(1_200)];
    script.extend(reply.into_iter().skip(1));
    line.push_script(script);
    assert_eq!(dht.read(), Err(DecodeError::StartAckTimeout));
}

#[test]
fn ack_just_inside_budget_is_accepted() {
    let frame = Frame::with_checksum([1, 2, 3, 4]);
    let (line, mut dht) = rig(VirtualClock::new());
    let reply = SimLine::reply_for(frame);
    let mut script = vec![Pulse::high(900)];
    script.extend(reply.into_iter().skip(1));
    line.push_script(script);
    assert_eq!(dht.read_frame(), Ok(frame));
}

#[test]
fn missing_response_low_edge_is_reported() {
    // Sensor pulls low for its response then never drops again.
    let (line, mut dht) = rig(VirtualClock::new());
    line.push_script(vec![
        Pulse::high(timing::ACK_DELAY_US),
        Pulse::low(timing::RESPONSE_LOW_US),
    ]);
    assert_eq!(dht.read(), Err(DecodeError::ResponseLowTimeout));
}

#[test]
fn truncated_frame_is_bit_timing_timeout() {
    let bits = [true; 20];
    let mut script = SimLine::reply_for_bits(&bits);
    script.pop(); // no end-of-frame low
    let (line, mut dht) = rig(VirtualClock::new());
    line.push_script(script);
    assert_eq!(dht.read(), Err(DecodeError::BitTimingTimeout));
    assert_eq!(dht.stats().bit_timing_timeouts, 1);
}

#[test]
fn line_stuck_low_mid_frame_is_bit_timing_timeout() {
    let mut script = SimLine::handshake();
    for _ in 0..5 {
        script.push(Pulse::low(timing::BIT_LOW_US));
        script.push(Pulse::high(timing::ONE_HIGH_US));
    }
    script.push(Pulse::low(5_000));
    let (line, mut dht) = rig(VirtualClock::new());
    line.push_script(script);
    assert_eq!(dht.read(), Err(DecodeError::BitTimingTimeout));
    assert_eq!(dht.stats().bit_timing_timeouts, 1);
    assert_eq!(line.direction(), PinDirection::Input);
}

#[test]
fn line_is_released_after_every_transaction() {
    let (line, mut dht) = rig(VirtualClock::new());
    let _ = dht.read();
    assert_eq!(line.direction(), PinDirection::Input);
    line.push_reply(Frame::with_checksum([9, 9, 9, 9]));
    dht.read().unwrap();
    assert_eq!(line.direction(), PinDirection::Input);
    assert_eq!(line.transactions(), 2);
}

#[test]
fn failure_streak_resets_on_success() {
    let (line, mut dht) = rig(VirtualClock::new());
    line.push_script(Vec::new());
    line.push_script(Vec::new());
    line.push_reply(Frame::with_checksum([0, 0, 0, 0]));
    let _ = dht.read();
    let _ = dht.read();
    assert_eq!(dht.stats().consecutive_failures, 2);
    dht.read().unwrap();
    assert_eq!(dht.stats().consecutive_failures, 0);
    dht.reset_stats();
    assert_eq!(dht.stats().attempts, 0);
}

//! Virtual-time DHT22 for host builds and tests.
//!
//! A [`VirtualClock`] is shared between a [`SimLine`] and a [`SimTimebase`].
//! Delays advance the clock directly and every line sample costs
//! `poll_cost_us`, so busy-wait loops make progress without real time
//! passing.  After the host releases the line, the sensor side replays a
//! scripted list of [`Pulse`]s; past the end of the script the line floats
//! high on its pull-up.
//!
//! Scripts are queued per transaction: each release pops the next queued
//! script, or replays the previous one when the queue is empty.

use std::cell::{Cell, RefCell};
use std::collections::VecDeque;
use std::rc::Rc;

use embedded_hal::delay::DelayNs;

use super::dht22::{FRAME_BITS, Frame};
use super::one_wire::{Level, OneWireLine, PinDirection, Timebase};

/// Nominal sensor-side timings (µs) from the AM2302 datasheet.
pub mod timing {
    /// Delay between host release and the sensor pulling low.
    pub const ACK_DELAY_US: u32 = 30;
    pub const RESPONSE_LOW_US: u32 = 80;
    pub const RESPONSE_HIGH_US: u32 = 80;
    /// Low gap before every data bit.
    pub const BIT_LOW_US: u32 = 50;
    pub const ZERO_HIGH_US: u32 = 26;
    pub const ONE_HIGH_US: u32 = 70;
    /// Final low before the sensor releases the bus.
    pub const END_LOW_US: u32 = 50;
}

// ───────────────────────────────────────────────────────────────
// Clock
// ───────────────────────────────────────────────────────────────

/// Shared microsecond counter.  Wraps like the hardware timer.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock(Rc<Cell<u32>>);

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start the clock at an arbitrary value (e.g. just before wrap-around).
    pub fn starting_at(us: u32) -> Self {
        Self(Rc::new(Cell::new(us)))
    }

    pub fn now(&self) -> u32 {
        self.0.get()
    }

    pub fn advance(&self, us: u32) {
        self.0.set(self.0.get().wrapping_add(us));
    }
}

/// [`Timebase`] that only moves when something waits on it.
#[derive(Debug, Clone)]
pub struct SimTimebase {
    clock: VirtualClock,
    residual_ns: u32,
}

impl SimTimebase {
    pub fn new(clock: &VirtualClock) -> Self {
        Self {
            clock: clock.clone(),
            residual_ns: 0,
        }
    }
}

impl DelayNs for SimTimebase {
    fn delay_ns(&mut self, ns: u32) {
        let total = u64::from(self.residual_ns) + u64::from(ns);
        self.clock.advance((total / 1_000) as u32);
        self.residual_ns = (total % 1_000) as u32;
    }

    fn delay_us(&mut self, us: u32) {
        self.clock.advance(us);
    }

    fn delay_ms(&mut self, ms: u32) {
        self.clock.advance(ms.saturating_mul(1_000));
    }
}

impl Timebase for SimTimebase {
    fn now_micros(&mut self) -> u32 {
        self.clock.now()
    }
}

// ───────────────────────────────────────────────────────────────
// Waveform
// ───────────────────────────────────────────────────────────────

/// One constant-level segment driven by the simulated sensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pulse {
    pub level: Level,
    pub duration_us: u32,
}

impl Pulse {
    pub const fn low(duration_us: u32) -> Self {
        Self {
            level: Level::Low,
            duration_us,
        }
    }

    pub const fn high(duration_us: u32) -> Self {
        Self {
            level: Level::High,
            duration_us,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Line
// ───────────────────────────────────────────────────────────────

#[derive(Debug)]
struct LineState {
    clock: VirtualClock,
    queued: VecDeque<Vec<Pulse>>,
    script: Vec<Pulse>,
    direction: PinDirection,
    driven: Level,
    low_since: Option<u32>,
    released_at: Option<u32>,
    last_wake_pulse_us: Option<u32>,
    poll_cost_us: u32,
    transactions: u32,
}

impl LineState {
    fn sensor_level(&self, now: u32) -> Level {
        let Some(released_at) = self.released_at else {
            return Level::High;
        };
        let offset = u64::from(now.wrapping_sub(released_at));
        let mut end = 0u64;
        for pulse in &self.script {
            end += u64::from(pulse.duration_us);
            if offset < end {
                return pulse.level;
            }
        }
        Level::High
    }
}

/// Simulated DHT22 data line.  Cheap to clone; clones share state so a
/// test can keep a handle while the decoder owns another.
#[derive(Debug, Clone)]
pub struct SimLine(Rc<RefCell<LineState>>);

impl SimLine {
    /// A line with no sensor attached (never acknowledges).
    pub fn new(clock: &VirtualClock) -> Self {
        Self(Rc::new(RefCell::new(LineState {
            clock: clock.clone(),
            queued: VecDeque::new(),
            script: Vec::new(),
            direction: PinDirection::Input,
            driven: Level::High,
            low_since: None,
            released_at: None,
            last_wake_pulse_us: None,
            poll_cost_us: 1,
            transactions: 0,
        })))
    }

    /// A line whose sensor answers every transaction with `frame`.
    pub fn with_reply(clock: &VirtualClock, frame: Frame) -> Self {
        let line = Self::new(clock);
        line.push_reply(frame);
        line
    }

    /// Queue a well-formed reply carrying `frame` for the next transaction.
    pub fn push_reply(&self, frame: Frame) {
        self.push_script(Self::reply_for(frame));
    }

    /// Queue an arbitrary sensor-side waveform for the next transaction.
    pub fn push_script(&self, script: Vec<Pulse>) {
        self.0.borrow_mut().queued.push_back(script);
    }

    /// Microseconds charged to the clock per `read()`.
    pub fn set_poll_cost_us(&self, us: u32) {
        self.0.borrow_mut().poll_cost_us = us;
    }

    /// Length of the most recent host wake pulse.
    pub fn last_wake_pulse_us(&self) -> Option<u32> {
        self.0.borrow().last_wake_pulse_us
    }

    /// Number of times the host released the line.
    pub fn transactions(&self) -> u32 {
        self.0.borrow().transactions
    }

    pub fn direction(&self) -> PinDirection {
        self.0.borrow().direction
    }

    /// Full nominal waveform for `frame`: ack, response, 40 bits, end.
    pub fn reply_for(frame: Frame) -> Vec<Pulse> {
        let bytes = frame.bytes();
        let mut bits = [false; FRAME_BITS];
        for (i, bit) in bits.iter_mut().enumerate() {
            *bit = bytes[i / 8] & (0x80 >> (i % 8)) != 0;
        }
        Self::reply_for_bits(&bits)
    }

    /// Nominal waveform for an arbitrary bit sequence, first bit first.
    pub fn reply_for_bits(bits: &[bool]) -> Vec<Pulse> {
        let mut script = Self::handshake();
        for &bit in bits {
            script.push(Pulse::low(timing::BIT_LOW_US));
            script.push(Pulse::high(if bit {
                timing::ONE_HIGH_US
            } else {
                timing::ZERO_HIGH_US
            }));
        }
        script.push(Pulse::low(timing::END_LOW_US));
        script
    }

    /// Ack delay plus the 80 µs low / 80 µs high response.
    pub fn handshake() -> Vec<Pulse> {
        vec![
            Pulse::high(timing::ACK_DELAY_US),
            Pulse::low(timing::RESPONSE_LOW_US),
            Pulse::high(timing::RESPONSE_HIGH_US),
        ]
    }
}

impl OneWireLine for SimLine {
    fn set_direction(&mut self, direction: PinDirection) {
        let mut s = self.0.borrow_mut();
        let now = s.clock.now();
        if s.direction == PinDirection::Output && direction == PinDirection::Input {
            if let Some(since) = s.low_since.take() {
                s.last_wake_pulse_us = Some(now.wrapping_sub(since));
            }
            s.released_at = Some(now);
            s.transactions += 1;
            if let Some(next) = s.queued.pop_front() {
                s.script = next;
            }
        }
        s.direction = direction;
    }

    fn write(&mut self, level: Level) {
        let mut s = self.0.borrow_mut();
        if level == Level::Low && s.driven != Level::Low {
            s.low_since = Some(s.clock.now());
        }
        s.driven = level;
    }

    fn read(&mut self) -> Level {
        let s = self.0.borrow();
        let now = s.clock.now();
        let level = match s.direction {
            PinDirection::Output => s.driven,
            PinDirection::Input => s.sensor_level(now),
        };
        s.clock.advance(s.poll_cost_us);
        level
    }
}

//! DHT22 (AM2302) temperature / humidity sensor over a bit-banged one-wire link.
//!
//! ## Transaction
//!
//! ```text
//!  host   ──┐ 18 ms  ┌─ 40 µs ─┐
//!           └────────┘ release  │
//!  sensor                       └─┐ 80 µs ┌─ 80 µs ─┐ 40 bits ...
//!                                 └───────┘         └─
//! ```
//!
//! 1. The host drives the line low for 18 ms, releases it to input and
//!    waits 40 µs.
//! 2. The sensor acknowledges by pulling the line low, then answers with an
//!    80 µs low / 80 µs high response.  Each of these three edges must
//!    arrive within 1000 µs.
//! 3. Forty data bits follow.  Each bit is a ~50 µs low followed by a high
//!    whose width encodes the value: ~26 µs for `0`, ~70 µs for `1`.  The
//!    high width is measured from the moment the host starts waiting for
//!    the falling edge; anything over 40 µs is a `1`.
//! 4. Bits are packed MSB-first into five bytes: humidity ×10 (big-endian),
//!    temperature ×10 (big-endian), checksum = low 8 bits of the sum of the
//!    first four bytes.
//!
//! Every failure is terminal for the call.  There is no retry and no
//! partial reading; the caller simply tries again next cycle.

use log::debug;
use serde::Serialize;

use super::one_wire::{Level, OneWireLine, PinDirection, Timebase};
use crate::error::DecodeError;

/// Host wake pulse length.
pub const WAKE_PULSE_MS: u32 = 18;
/// Settle time after releasing the line.
pub const RELEASE_SETTLE_US: u32 = 40;
/// Deadline for every level transition, handshake and data alike.
pub const EDGE_TIMEOUT_US: u32 = 1_000;
/// High phases longer than this encode a `1` bit.
pub const BIT_ONE_THRESHOLD_US: u32 = 40;
/// Data bits per transaction.
pub const FRAME_BITS: usize = 40;
/// Bytes per frame, checksum included.
pub const FRAME_BYTES: usize = FRAME_BITS / 8;

// ───────────────────────────────────────────────────────────────
// Reading
// ───────────────────────────────────────────────────────────────

/// One validated measurement.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct SensorReading {
    pub temperature_celsius: f32,
    pub relative_humidity_percent: f32,
}

// ───────────────────────────────────────────────────────────────
// Frame
// ───────────────────────────────────────────────────────────────

/// The five raw bytes of one transaction, in reception order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Frame([u8; FRAME_BYTES]);

impl Frame {
    pub const fn new(bytes: [u8; FRAME_BYTES]) -> Self {
        Self(bytes)
    }

    /// Build a frame from four payload bytes, appending the correct checksum.
    pub const fn with_checksum(payload: [u8; 4]) -> Self {
        let [a, b, c, d] = payload;
        let sum = a.wrapping_add(b).wrapping_add(c).wrapping_add(d);
        Self([a, b, c, d, sum])
    }

    pub const fn bytes(&self) -> [u8; FRAME_BYTES] {
        self.0
    }

    /// Low 8 bits of the sum of the four payload bytes.
    pub const fn expected_checksum(&self) -> u8 {
        self.0[0]
            .wrapping_add(self.0[1])
            .wrapping_add(self.0[2])
            .wrapping_add(self.0[3])
    }

    pub const fn checksum_ok(&self) -> bool {
        self.expected_checksum() == self.0[4]
    }

    /// Relative humidity in tenths of a percent.
    pub const fn humidity_raw(&self) -> u16 {
        u16::from_be_bytes([self.0[0], self.0[1]])
    }

    /// Temperature in tenths of a degree Celsius.
    pub const fn temperature_raw(&self) -> u16 {
        u16::from_be_bytes([self.0[2], self.0[3]])
    }

    /// Validate the checksum and scale the payload.
    pub fn decode(self) -> Result<SensorReading, DecodeError> {
        if !self.checksum_ok() {
            return Err(DecodeError::ChecksumMismatch);
        }
        Ok(SensorReading {
            temperature_celsius: f32::from(self.temperature_raw()) / 10.0,
            relative_humidity_percent: f32::from(self.humidity_raw()) / 10.0,
        })
    }
}

// ───────────────────────────────────────────────────────────────
// Phases
// ───────────────────────────────────────────────────────────────

/// The waiting stages of a transaction, each with its own deadline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    /// Waiting for the sensor to pull the released line low.
    AwaitingAck,
    /// Waiting for the response-low phase to end.
    AwaitingResponseHigh,
    /// Waiting for the response-high phase to end.
    AwaitingResponseLow,
    /// Waiting on an edge of data bit `bit` (0 = first received).
    Sampling { bit: u8 },
}

impl Phase {
    pub const fn timeout_error(self) -> DecodeError {
        match self {
            Self::AwaitingAck => DecodeError::StartAckTimeout,
            Self::AwaitingResponseHigh => DecodeError::ResponseHighTimeout,
            Self::AwaitingResponseLow => DecodeError::ResponseLowTimeout,
            Self::Sampling { .. } => DecodeError::BitTimingTimeout,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Statistics
// ───────────────────────────────────────────────────────────────

/// Outcome counters since construction (or the last reset).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DecoderStats {
    pub attempts: u32,
    pub successes: u32,
    pub start_ack_timeouts: u32,
    pub response_high_timeouts: u32,
    pub response_low_timeouts: u32,
    pub bit_timing_timeouts: u32,
    pub checksum_mismatches: u32,
    /// Failures since the last success.
    pub consecutive_failures: u32,
}

impl DecoderStats {
    fn record(&mut self, outcome: Result<(), DecodeError>) {
        self.attempts = self.attempts.saturating_add(1);
        let Err(reason) = outcome else {
            self.successes = self.successes.saturating_add(1);
            self.consecutive_failures = 0;
            return;
        };
        let slot = match reason {
            DecodeError::StartAckTimeout => &mut self.start_ack_timeouts,
            DecodeError::ResponseHighTimeout => &mut self.response_high_timeouts,
            DecodeError::ResponseLowTimeout => &mut self.response_low_timeouts,
            DecodeError::BitTimingTimeout => &mut self.bit_timing_timeouts,
            DecodeError::ChecksumMismatch => &mut self.checksum_mismatches,
        };
        *slot = slot.saturating_add(1);
        self.consecutive_failures = self.consecutive_failures.saturating_add(1);
    }

    pub fn failures(&self) -> u32 {
        self.attempts - self.successes
    }

    pub fn failures_for(&self, reason: DecodeError) -> u32 {
        match reason {
            DecodeError::StartAckTimeout => self.start_ack_timeouts,
            DecodeError::ResponseHighTimeout => self.response_high_timeouts,
            DecodeError::ResponseLowTimeout => self.response_low_timeouts,
            DecodeError::BitTimingTimeout => self.bit_timing_timeouts,
            DecodeError::ChecksumMismatch => self.checksum_mismatches,
        }
    }
}

// ───────────────────────────────────────────────────────────────
// Decoder
// ───────────────────────────────────────────────────────────────

/// DHT22 driver.  Owns the data line for its whole lifetime, so two
/// transactions can never interleave.
pub struct Dht22<L, T> {
    line: L,
    timer: T,
    stats: DecoderStats,
}

impl<L: OneWireLine, T: Timebase> Dht22<L, T> {
    pub fn new(line: L, timer: T) -> Self {
        Self {
            line,
            timer,
            stats: DecoderStats::default(),
        }
    }

    /// Run one complete transaction and validate the result.
    ///
    /// Blocks for the wake pulse plus the reply (roughly 23 ms on success,
    /// at most a few tens of ms before a timeout fires).
    pub fn read(&mut self) -> Result<SensorReading, DecodeError> {
        let outcome = self.read_frame().and_then(Frame::decode);
        self.stats.record(outcome.map(|_| ()));
        match &outcome {
            Ok(r) => debug!(
                "dht22: {:.1}\u{00b0}C {:.1}%RH",
                r.temperature_celsius, r.relative_humidity_percent
            ),
            Err(e) => debug!("dht22: read failed: {}", e),
        }
        outcome
    }

    /// Run the handshake and sample 40 bits without checking the checksum.
    pub fn read_frame(&mut self) -> Result<Frame, DecodeError> {
        self.wake();
        self.wait_while(Level::High, Phase::AwaitingAck)?;
        self.wait_while(Level::Low, Phase::AwaitingResponseHigh)?;
        self.wait_while(Level::High, Phase::AwaitingResponseLow)?;
        self.sample_frame()
    }

    pub fn stats(&self) -> DecoderStats {
        self.stats
    }

    pub fn reset_stats(&mut self) {
        self.stats = DecoderStats::default();
    }

    /// Give back the line and timer.
    pub fn release(self) -> (L, T) {
        (self.line, self.timer)
    }

    fn wake(&mut self) {
        self.line.set_direction(PinDirection::Output);
        self.line.write(Level::Low);
        self.timer.delay_ms(WAKE_PULSE_MS);
        self.line.set_direction(PinDirection::Input);
        self.timer.delay_us(RELEASE_SETTLE_US);
    }

    /// Spin while the line reads `level`.  Returns the microseconds elapsed
    /// from the start of the wait to the observed edge.
    fn wait_while(&mut self, level: Level, phase: Phase) -> Result<u32, DecodeError> {
        let start = self.timer.now_micros();
        while self.line.read() == level {
            if self.timer.now_micros().wrapping_sub(start) > EDGE_TIMEOUT_US {
                debug!("dht22: timeout in {:?}", phase);
                return Err(phase.timeout_error());
            }
        }
        Ok(self.timer.now_micros().wrapping_sub(start))
    }

    fn sample_frame(&mut self) -> Result<Frame, DecodeError> {
        let mut bytes = [0u8; FRAME_BYTES];
        for bit in 0..FRAME_BITS {
            let phase = Phase::Sampling { bit: bit as u8 };
            self.wait_while(Level::Low, phase)?;
            let high_us = self.wait_while(Level::High, phase)?;
            if high_us > BIT_ONE_THRESHOLD_US {
                bytes[bit / 8] |= 0x80 >> (bit % 8);
            }
        }
        Ok(Frame(bytes))
    }
}

//! Hardware seam for bit-banged single-wire links.
//!
//! The DHT22 decoder needs exactly four primitives: switch the line
//! direction, drive a level, sample a level, and read a free-running
//! microsecond counter.  Delays come from [`embedded_hal::delay::DelayNs`].
//!
//! Real hardware implements these in [`crate::adapters::gpio_line`] and
//! [`crate::adapters::time`]; the host uses [`crate::sensors::sim`].

use embedded_hal::delay::DelayNs;

/// Logic level on the data line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Level {
    Low,
    High,
}

impl Level {
    pub const fn is_high(self) -> bool {
        matches!(self, Self::High)
    }
}

impl From<bool> for Level {
    fn from(high: bool) -> Self {
        if high { Self::High } else { Self::Low }
    }
}

/// Direction of the host side of the line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinDirection {
    Input,
    Output,
}

/// A single bidirectional data conductor.
///
/// Only one owner may drive the line at a time; implementations are
/// borrowed mutably for the duration of a transaction.
pub trait OneWireLine {
    fn set_direction(&mut self, direction: PinDirection);

    /// Drive `level` while the pin is an output.
    fn write(&mut self, level: Level);

    /// Sample the current level.
    fn read(&mut self) -> Level;
}

/// Microsecond clock plus blocking delays.
///
/// `now_micros` wraps at `u32::MAX`; callers must compare timestamps with
/// `wrapping_sub`.
pub trait Timebase: DelayNs {
    fn now_micros(&mut self) -> u32;
}

impl<T: OneWireLine + ?Sized> OneWireLine for &mut T {
    fn set_direction(&mut self, direction: PinDirection) {
        (**self).set_direction(direction);
    }

    fn write(&mut self, level: Level) {
        (**self).write(level);
    }

    fn read(&mut self) -> Level {
        (**self).read()
    }
}

impl<T: Timebase + ?Sized> Timebase for &mut T {
    fn now_micros(&mut self) -> u32 {
        (**self).now_micros()
    }
}

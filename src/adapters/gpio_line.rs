//! GPIO-backed one-wire line.
//!
//! Wraps a single open-drain GPIO in the [`OneWireLine`] trait so the DHT22
//! decoder can drive it.  All register access goes through
//! [`crate::drivers::hw_init`]; on host builds those helpers are inert and
//! the line reads permanently high (nothing answers).

use crate::drivers::hw_init;
use crate::sensors::one_wire::{Level, OneWireLine, PinDirection};

/// The DHT22 data pin.
pub struct GpioLine {
    pin: i32,
    direction: PinDirection,
}

impl GpioLine {
    pub fn new(pin: i32) -> Self {
        hw_init::gpio_set_direction(pin, PinDirection::Input);
        Self {
            pin,
            direction: PinDirection::Input,
        }
    }

    pub fn pin(&self) -> i32 {
        self.pin
    }

    pub fn direction(&self) -> PinDirection {
        self.direction
    }
}

impl OneWireLine for GpioLine {
    fn set_direction(&mut self, direction: PinDirection) {
        if self.direction != direction {
            hw_init::gpio_set_direction(self.pin, direction);
            self.direction = direction;
        }
    }

    fn write(&mut self, level: Level) {
        hw_init::gpio_write(self.pin, level.is_high());
    }

    fn read(&mut self) -> Level {
        Level::from(hw_init::gpio_read(self.pin))
    }
}

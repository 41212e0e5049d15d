//! System timebase adapter.
//!
//! Provides the microsecond clock and blocking delays the DHT22 decoder
//! needs.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer and the ROM `ets_delay_us` busy-wait.
//! - **`not(target_os = "espidf")`** — uses `std::time::Instant` and
//!   `std::thread::sleep` for host-side runs.
//!
//! [`Timebase::now_micros`] truncates the 64-bit counter to `u32`, which
//! wraps after ~71 minutes; the decoder only ever subtracts nearby
//! timestamps with `wrapping_sub`.

use embedded_hal::delay::DelayNs;

use crate::sensors::one_wire::Timebase;

pub struct SystemTimebase {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for SystemTimebase {
    fn default() -> Self {
        Self::new()
    }
}

impl SystemTimebase {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since construction (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        self.start.elapsed().as_micros() as u64
    }
}

impl DelayNs for SystemTimebase {
    #[cfg(target_os = "espidf")]
    fn delay_ns(&mut self, ns: u32) {
        esp_idf_hal::delay::Ets::delay_us(ns.div_ceil(1_000));
    }

    #[cfg(not(target_os = "espidf"))]
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(std::time::Duration::from_nanos(u64::from(ns)));
    }
}

impl Timebase for SystemTimebase {
    fn now_micros(&mut self) -> u32 {
        self.uptime_us() as u32
    }
}

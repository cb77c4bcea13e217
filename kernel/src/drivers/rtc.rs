//! CMOS real-time clock
//!
//! Only the periodic interrupt is used. Reads through a descriptor wait for
//! the next interrupt; the rate is a power of two between 2 and 1024 Hz.

use super::pic;
use crate::arch::Port;
use crate::config::{RTC_DEFAULT_FREQUENCY, RTC_MAX_FREQUENCY};

const INDEX: Port = Port::new(0x70);
const DATA: Port = Port::new(0x71);

/// Register selectors with NMI disabled
const REG_A: u8 = 0x8A;
const REG_B: u8 = 0x8B;
const REG_C: u8 = 0x0C;

const PERIODIC_ENABLE: u8 = 0x40;

pub const IRQ: u8 = 8;

/// Rate divider for `frequency`, or `None` if the clock cannot produce it.
///
/// The periodic rate is `32768 >> (rate - 1)`.
pub fn rate_for(frequency: u32) -> Option<u8> {
    if !(RTC_DEFAULT_FREQUENCY..=RTC_MAX_FREQUENCY).contains(&frequency) || !frequency.is_power_of_two() {
        return None;
    }
    Some(16 - frequency.trailing_zeros() as u8)
}

pub struct Rtc {
    frequency: u32,
    ticks: u64,
}

impl Rtc {
    pub const fn new() -> Self {
        Self { frequency: RTC_DEFAULT_FREQUENCY, ticks: 0 }
    }

    /// Turn on the periodic interrupt at the default rate and unmask IRQ 8.
    pub fn init_hardware(&mut self) {
        INDEX.write(REG_B);
        let previous = DATA.read();
        INDEX.write(REG_B);
        DATA.write(previous | PERIODIC_ENABLE);
        self.set_frequency(RTC_DEFAULT_FREQUENCY);
        acknowledge();
        pic::enable_irq(IRQ);
    }

    /// Reprogram the rate. Unsupported frequencies leave it unchanged.
    pub fn set_frequency(&mut self, frequency: u32) -> bool {
        let Some(rate) = rate_for(frequency) else {
            return false;
        };
        INDEX.write(REG_A);
        let previous = DATA.read();
        INDEX.write(REG_A);
        DATA.write((previous & 0xF0) | rate);
        self.frequency = frequency;
        log::debug!("[RTC] frequency {} Hz", frequency);
        true
    }

    /// Periodic interrupt: acknowledge and count it.
    pub fn interrupt(&mut self) {
        acknowledge();
        self.ticks += 1;
    }

    pub fn frequency(&self) -> u32 {
        self.frequency
    }

    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

/// Reading register C re-arms the interrupt.
fn acknowledge() {
    INDEX.write(REG_C);
    DATA.read();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rates_cover_powers_of_two() {
        assert_eq!(rate_for(2), Some(15));
        assert_eq!(rate_for(1024), Some(6));
        assert_eq!(rate_for(0), None);
        assert_eq!(rate_for(3), None);
        assert_eq!(rate_for(2048), None);
    }

    #[test]
    fn invalid_frequency_keeps_rate() {
        let mut rtc = Rtc::new();
        assert!(rtc.set_frequency(64));
        assert!(!rtc.set_frequency(100));
        assert_eq!(rtc.frequency(), 64);
        rtc.interrupt();
        rtc.interrupt();
        assert_eq!(rtc.ticks(), 2);
    }
}

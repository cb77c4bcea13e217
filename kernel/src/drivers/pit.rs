//! Programmable interval timer, channel 0

use super::pic;
use crate::arch::Port;

const CHANNEL0: Port = Port::new(0x40);
const COMMAND: Port = Port::new(0x43);

const BASE_FREQUENCY: u32 = 1_193_182;

/// Channel 0, lobyte/hibyte, mode 3 (square wave)
const MODE_SQUARE_WAVE: u8 = 0x36;

pub const IRQ: u8 = 0;

pub fn divisor(frequency: u32) -> u16 {
    (BASE_FREQUENCY / frequency).clamp(1, u16::MAX as u32) as u16
}

/// Start ticking at `frequency` Hz and unmask IRQ 0.
pub fn init(frequency: u32) {
    let divisor = divisor(frequency);
    COMMAND.write(MODE_SQUARE_WAVE);
    CHANNEL0.write(divisor as u8);
    CHANNEL0.write((divisor >> 8) as u8);
    pic::enable_irq(IRQ);
    log::info!("[PIT] {} Hz (divisor {})", frequency, divisor);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn divisor_fits_sixteen_bits() {
        assert_eq!(divisor(20), 59659);
        assert_eq!(divisor(1), u16::MAX);
        assert_eq!(divisor(2_000_000), 1);
    }
}

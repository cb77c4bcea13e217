//! COM1 serial port, the kernel console

use crate::arch::Port;

const COM1: u16 = 0x3F8;

const DATA: Port = Port::new(COM1);
const INTERRUPT_ENABLE: Port = Port::new(COM1 + 1);
const FIFO_CONTROL: Port = Port::new(COM1 + 2);
const LINE_CONTROL: Port = Port::new(COM1 + 3);
const MODEM_CONTROL: Port = Port::new(COM1 + 4);
const LINE_STATUS: Port = Port::new(COM1 + 5);

const TRANSMIT_EMPTY: u8 = 0x20;

/// 38400 baud, 8N1, FIFOs on, no interrupts.
pub fn init() {
    INTERRUPT_ENABLE.write(0x00);
    LINE_CONTROL.write(0x80);
    DATA.write(0x03);
    INTERRUPT_ENABLE.write(0x00);
    LINE_CONTROL.write(0x03);
    FIFO_CONTROL.write(0xC7);
    MODEM_CONTROL.write(0x0B);
}

pub fn write_byte(byte: u8) {
    if cfg!(all(target_arch = "x86", target_os = "none")) {
        while LINE_STATUS.read() & TRANSMIT_EMPTY == 0 {}
    }
    DATA.write(byte);
}

//! Cascaded 8259 interrupt controllers
//!
//! IRQ 0-7 land on vectors 0x20-0x27, IRQ 8-15 on 0x28-0x2F. Every line
//! starts masked; drivers unmask what they need.

use crate::arch::Port;

const MASTER_COMMAND: Port = Port::new(0x20);
const MASTER_DATA: Port = Port::new(0x21);
const SLAVE_COMMAND: Port = Port::new(0xA0);
const SLAVE_DATA: Port = Port::new(0xA1);

const ICW1: u8 = 0x11;
const ICW2_MASTER: u8 = 0x20;
const ICW2_SLAVE: u8 = 0x28;
const ICW3_MASTER: u8 = 0x04;
const ICW3_SLAVE: u8 = 0x02;
const ICW4: u8 = 0x01;

/// Specific end-of-interrupt, OR'd with the line number
const EOI: u8 = 0x60;

/// Master line the slave is wired to
pub const CASCADE_IRQ: u8 = 2;

pub fn init() {
    MASTER_DATA.write(0xFF);
    SLAVE_DATA.write(0xFF);

    MASTER_COMMAND.write(ICW1);
    MASTER_DATA.write(ICW2_MASTER);
    MASTER_DATA.write(ICW3_MASTER);
    MASTER_DATA.write(ICW4);

    SLAVE_COMMAND.write(ICW1);
    SLAVE_DATA.write(ICW2_SLAVE);
    SLAVE_DATA.write(ICW3_SLAVE);
    SLAVE_DATA.write(ICW4);

    MASTER_DATA.write(0xFF);
    SLAVE_DATA.write(0xFF);
    enable_irq(CASCADE_IRQ);
}

pub fn enable_irq(irq: u8) {
    if irq < 8 {
        MASTER_DATA.write(MASTER_DATA.read() & !(1 << irq));
    } else {
        SLAVE_DATA.write(SLAVE_DATA.read() & !(1 << (irq - 8)));
    }
}

pub fn send_eoi(irq: u8) {
    if irq >= 8 {
        SLAVE_COMMAND.write(EOI | (irq - 8));
        MASTER_COMMAND.write(EOI | CASCADE_IRQ);
    } else {
        MASTER_COMMAND.write(EOI | irq);
    }
}

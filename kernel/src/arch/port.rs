//! Port-mapped I/O
//!
//! On the host every write is dropped and every read yields 0, which lets the
//! device models run under `cargo test`.

#[cfg(all(target_arch = "x86", target_os = "none"))]
mod imp {
    use core::arch::asm;

    #[inline]
    pub fn outb(port: u16, value: u8) {
        unsafe {
            asm!("out dx, al", in("dx") port, in("al") value, options(nomem, nostack, preserves_flags));
        }
    }

    #[inline]
    pub fn inb(port: u16) -> u8 {
        let value: u8;
        unsafe {
            asm!("in al, dx", out("al") value, in("dx") port, options(nomem, nostack, preserves_flags));
        }
        value
    }
}

#[cfg(not(all(target_arch = "x86", target_os = "none")))]
mod imp {
    #[inline]
    pub fn outb(_port: u16, _value: u8) {}

    #[inline]
    pub fn inb(_port: u16) -> u8 {
        0
    }
}

pub use imp::{inb, outb};

/// An 8-bit I/O port.
#[derive(Copy, Clone, Debug)]
pub struct Port(u16);

impl Port {
    pub const fn new(port: u16) -> Self {
        Self(port)
    }

    pub fn read(&self) -> u8 {
        inb(self.0)
    }

    pub fn write(&self, value: u8) {
        outb(self.0, value)
    }
}

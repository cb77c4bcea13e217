//! Interrupt descriptor table
//!
//! Every installed vector points at a stub from `trap/trap.S`; the stubs all
//! funnel into `trap_dispatch`.

use super::selector;
use core::arch::asm;
use core::mem::size_of;
use core::ptr::{addr_of, addr_of_mut};

/// Vectors with a stub, in the order of `trap_vector_table`.
pub const VECTORS: [u8; 24] = [
    0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 0x20, 0x21, 0x28, 0x80,
];

pub const SYSCALL_VECTOR: u8 = 0x80;

const GATE_INTERRUPT: u8 = 0x8E;
const GATE_USER: u8 = 0x60;

#[derive(Copy, Clone)]
#[repr(C)]
struct Gate {
    offset_low: u16,
    selector: u16,
    zero: u8,
    attributes: u8,
    offset_high: u16,
}

impl Gate {
    const MISSING: Self = Self { offset_low: 0, selector: 0, zero: 0, attributes: 0, offset_high: 0 };

    fn new(handler: usize, attributes: u8) -> Self {
        Self {
            offset_low: handler as u16,
            selector: selector::KERNEL_CODE,
            zero: 0,
            attributes,
            offset_high: (handler >> 16) as u16,
        }
    }
}

#[repr(C, packed)]
struct DescriptorTablePointer {
    limit: u16,
    base: u32,
}

static mut IDT: [Gate; 256] = [Gate::MISSING; 256];

extern "C" {
    static trap_vector_table: [usize; VECTORS.len()];
}

pub fn init() {
    unsafe {
        let idt = &mut *addr_of_mut!(IDT);
        let stubs = &*addr_of!(trap_vector_table);
        for (&vector, &stub) in VECTORS.iter().zip(stubs.iter()) {
            let attributes = if vector == SYSCALL_VECTOR {
                GATE_INTERRUPT | GATE_USER
            } else {
                GATE_INTERRUPT
            };
            idt[vector as usize] = Gate::new(stub, attributes);
        }
        let pointer = DescriptorTablePointer {
            limit: (size_of::<[Gate; 256]>() - 1) as u16,
            base: addr_of!(IDT) as u32,
        };
        asm!("lidt [{}]", in(reg) &pointer, options(nostack));
    }
    log::info!("[IDT] {} vectors installed", VECTORS.len());
}

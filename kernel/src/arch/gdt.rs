//! Global descriptor table and task-state segment
//!
//! Flat 4GB segments for ring 0 and ring 3 plus a single TSS. The TSS is only
//! used for its `ss0:esp0` pair, which the trap glue repoints at the current
//! process's kernel stack after every trap.

use super::selector;
use core::arch::asm;
use core::mem::size_of;
use core::ptr::{addr_of, addr_of_mut};

#[repr(C, packed)]
struct DescriptorTablePointer {
    limit: u16,
    base: u32,
}

#[repr(C)]
struct TaskStateSegment {
    link: u32,
    esp0: u32,
    ss0: u32,
    unused: [u32; 22],
    trap: u16,
    iomap_base: u16,
}

const GDT_LEN: usize = 6;

static mut GDT: [u64; GDT_LEN] = [0; GDT_LEN];

static mut TSS: TaskStateSegment = TaskStateSegment {
    link: 0,
    esp0: 0,
    ss0: 0,
    unused: [0; 22],
    trap: 0,
    iomap_base: size_of::<TaskStateSegment>() as u16,
};

const fn descriptor(base: u32, limit: u32, access: u8, flags: u8) -> u64 {
    let mut d = (limit as u64) & 0xFFFF;
    d |= ((base as u64) & 0xFF_FFFF) << 16;
    d |= (access as u64) << 40;
    d |= ((limit as u64 >> 16) & 0xF) << 48;
    d |= ((flags as u64) & 0xF) << 52;
    d |= ((base as u64 >> 24) & 0xFF) << 56;
    d
}

/// Build the table, load it, reload every segment register and the task register.
pub fn init() {
    unsafe {
        let tss = addr_of_mut!(TSS);
        (*tss).ss0 = selector::KERNEL_DATA as u32;
        let tss_base = tss as u32;
        let tss_limit = size_of::<TaskStateSegment>() as u32 - 1;

        let gdt = &mut *addr_of_mut!(GDT);
        gdt[0] = 0;
        gdt[1] = descriptor(0, 0xF_FFFF, 0x9A, 0xC);
        gdt[2] = descriptor(0, 0xF_FFFF, 0x92, 0xC);
        gdt[3] = descriptor(0, 0xF_FFFF, 0xFA, 0xC);
        gdt[4] = descriptor(0, 0xF_FFFF, 0xF2, 0xC);
        gdt[5] = descriptor(tss_base, tss_limit, 0x89, 0x0);

        let pointer = DescriptorTablePointer {
            limit: (size_of::<[u64; GDT_LEN]>() - 1) as u16,
            base: addr_of!(GDT) as u32,
        };
        asm!(
            "lgdt [{ptr}]",
            "push {cs}",
            "lea {tmp}, [2f]",
            "push {tmp}",
            "retf",
            "2:",
            "mov ds, {ds:x}",
            "mov es, {ds:x}",
            "mov fs, {ds:x}",
            "mov gs, {ds:x}",
            "mov ss, {ds:x}",
            "ltr {tss:x}",
            ptr = in(reg) &pointer,
            cs = const selector::KERNEL_CODE as u32,
            ds = in(reg) selector::KERNEL_DATA as u32,
            tss = in(reg) selector::TSS as u32,
            tmp = out(reg) _,
        );
    }
    log::info!("[GDT] loaded, tss at {:#x}", addr_of!(TSS) as usize);
}

/// Stack the CPU switches to when a ring 3 process traps into the kernel.
pub fn set_kernel_stack(esp0: usize) {
    unsafe {
        (*addr_of_mut!(TSS)).esp0 = esp0 as u32;
    }
}

//! x86 platform primitives
//!
//! Everything that needs privileged instructions lives here, behind a few
//! narrow functions. Host builds get inert versions so the rest of the kernel
//! can be unit tested.

pub mod port;

#[cfg(all(target_arch = "x86", target_os = "none"))]
pub mod gdt;
#[cfg(all(target_arch = "x86", target_os = "none"))]
pub mod idt;

pub use port::Port;

/// Segment selectors installed by `gdt::init`.
pub mod selector {
    pub const KERNEL_CODE: u16 = 0x08;
    pub const KERNEL_DATA: u16 = 0x10;
    pub const USER_CODE: u16 = 0x18 | 3;
    pub const USER_DATA: u16 = 0x20 | 3;
    pub const TSS: u16 = 0x28;
}

/// `eflags` with only the interrupt flag (and the always-one bit) set.
pub const EFLAGS_IF: u32 = 0x202;

#[cfg(all(target_arch = "x86", target_os = "none"))]
mod imp {
    use core::arch::asm;

    /// Drop every cached translation by reloading `cr3`.
    #[inline]
    pub fn flush_tlb() {
        unsafe {
            asm!("mov {tmp}, cr3", "mov cr3, {tmp}", tmp = out(reg) _, options(nostack, preserves_flags));
        }
    }

    /// Load the page directory, enable 4MB pages, then turn paging on.
    ///
    /// # Safety
    /// `directory` must be the physical address of a directory that identity
    /// maps the running kernel.
    pub unsafe fn enable_paging(directory: usize) {
        asm!(
            "mov cr3, {dir}",
            "mov {tmp}, cr4",
            "or {tmp}, 0x10",
            "mov cr4, {tmp}",
            "mov {tmp}, cr0",
            "or {tmp}, 0x80000000",
            "mov cr0, {tmp}",
            dir = in(reg) directory,
            tmp = out(reg) _,
            options(nostack),
        );
    }

    /// Faulting linear address of the last page fault.
    pub fn read_cr2() -> usize {
        let value: usize;
        unsafe {
            asm!("mov {}, cr2", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        value
    }

    pub fn disable_interrupts() {
        unsafe { asm!("cli", options(nomem, nostack)) }
    }

    /// Open an interrupt window and sleep until the next interrupt has been
    /// handled, then mask interrupts again.
    pub fn wait_for_interrupt() {
        unsafe { asm!("sti", "hlt", "cli", options(nomem, nostack)) }
    }

    pub fn halt_forever() -> ! {
        loop {
            unsafe { asm!("cli", "hlt", options(nomem, nostack)) }
        }
    }

    /// Unwind the interrupt frame at `esp` and return from it with `iretd`.
    ///
    /// This is the only way a suspended process is reactivated.
    ///
    /// # Safety
    /// `esp` must address a complete frame built by the trap entry path or by
    /// `execute`.
    pub unsafe fn resume(esp: usize, ebp: usize) -> ! {
        asm!(
            "mov esp, {esp}",
            "mov ebp, {ebp}",
            "jmp interrupt_return",
            esp = in(reg) esp,
            ebp = in(reg) ebp,
            options(noreturn),
        )
    }
}

#[cfg(not(all(target_arch = "x86", target_os = "none")))]
mod imp {
    pub fn flush_tlb() {}

    pub fn read_cr2() -> usize {
        0
    }
}

pub use imp::*;

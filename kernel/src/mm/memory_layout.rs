//! Memory Layout Definitions
//!
//! Physical and virtual addresses the kernel hard-wires, and the address
//! newtypes the paging code is written against.

use crate::config::{
    BIG_PAGE_SIZE, IMAGE_OFFSET, KERNEL_END, KERNEL_SLOT_SIZE, MAX_PROCESSES, PAGE_SIZE, PAGE_SIZE_BITS,
    USER_BASE,
};
use crate::task::Pid;

/// Physical text-mode display buffer
pub const VIDEO: usize = 0xB8000;

/// Kernel-only page that always maps the physical display
pub const VIDEO_ALIAS: usize = 0xB9000;

/// First off-screen terminal buffer; buffer `i` is `i` pages further
pub const TERMINAL_VIDEO: usize = 0xBA000;

/// Directory slot of the kernel's 4MB big page
pub const KERNEL_DIR_INDEX: usize = 1;

/// Directory slot of the per-process user region (128MB / 4MB)
pub const USER_DIR_INDEX: usize = USER_BASE / BIG_PAGE_SIZE;

/// Directory slot of the vidmap page table
pub const VIDMAP_DIR_INDEX: usize = 35;

/// Entry of the vidmap table exposing the display target
pub const VIDMAP_PAGE_INDEX: usize = 10;

/// User-visible address handed out by `vidmap`
pub const VIDMAP_ADDR: usize = VIDMAP_DIR_INDEX * BIG_PAGE_SIZE + VIDMAP_PAGE_INDEX * PAGE_SIZE;

/// Where program images start inside the user region
pub const IMAGE_BASE: usize = USER_BASE + IMAGE_OFFSET;

/// Lowest kernel slot; the slot of pid `p` sits `5 - p` slots above it
pub const ARENA_BASE: usize = KERNEL_END - MAX_PROCESSES * KERNEL_SLOT_SIZE;

/// Physical frame backing the user region of `pid`: 8MB + 4MB * pid.
#[inline]
pub const fn process_frame(pid: Pid) -> PhysAddr {
    PhysAddr(KERNEL_END + BIG_PAGE_SIZE * pid.index())
}

/// Base of the 8KB region holding the PCB and kernel stack of `pid`.
#[cfg(test)]
pub const fn kernel_slot_base(pid: Pid) -> PhysAddr {
    PhysAddr(KERNEL_END - KERNEL_SLOT_SIZE * (pid.index() + 1))
}

/// `esp0` for `pid`: one word below the top of its kernel slot.
#[cfg(test)]
pub const fn kernel_stack_top(pid: Pid) -> usize {
    KERNEL_END - KERNEL_SLOT_SIZE * pid.index() - 4
}

/// Off-screen text buffer of terminal `index`.
#[inline]
pub const fn terminal_buffer(index: usize) -> PhysAddr {
    PhysAddr(TERMINAL_VIDEO + index * PAGE_SIZE)
}

/// Get page offset from address
#[inline]
pub const fn page_offset(addr: usize) -> usize {
    addr & (PAGE_SIZE - 1)
}

/// Physical address type
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct PhysAddr(pub usize);

impl PhysAddr {
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    pub const fn as_usize(&self) -> usize {
        self.0
    }

    /// 20-bit frame number as stored in a paging entry
    pub const fn frame(&self) -> u32 {
        (self.0 >> PAGE_SIZE_BITS) as u32 & 0xF_FFFF
    }

    pub const fn from_frame(frame: u32) -> Self {
        Self((frame as usize) << PAGE_SIZE_BITS)
    }
}

/// Virtual address type
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Debug)]
pub struct VirtAddr(pub usize);

impl VirtAddr {
    pub const fn new(addr: usize) -> Self {
        Self(addr)
    }

    pub const fn as_usize(&self) -> usize {
        self.0
    }

    /// Page directory slot (top 10 bits)
    pub const fn directory_index(&self) -> usize {
        (self.0 >> 22) & 0x3FF
    }

    /// Page table slot (middle 10 bits)
    pub const fn table_index(&self) -> usize {
        (self.0 >> PAGE_SIZE_BITS) & 0x3FF
    }

    /// Offset inside a 4MB big page
    pub const fn big_page_offset(&self) -> usize {
        self.0 & (BIG_PAGE_SIZE - 1)
    }

    pub const fn page_offset(&self) -> usize {
        page_offset(self.0)
    }
}

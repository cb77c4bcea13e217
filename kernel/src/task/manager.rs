//! Process Manager
//!
//! The six kernel slots and the table of PCBs living in them.

use super::{Pcb, Pid, SavedContext};
use crate::config::{KERNEL_SLOT_SIZE, MAX_PROCESSES};
use crate::drivers::terminal::TerminalId;
use crate::error::{SysError, SysResult};
use crate::trap::context::{InterruptFrame, FRAME_WORDS};
use core::mem::{offset_of, size_of};

/// Words of kernel stack left in a slot after the PCB
pub const STACK_WORDS: usize = (KERNEL_SLOT_SIZE - size_of::<Pcb>()) / 4;

/// One 8KB slot: the PCB at the bottom, the kernel stack growing down
/// towards it from the top. Overflowing the stack corrupts the PCB.
#[repr(C, align(8192))]
pub struct KernelSlot {
    pub pcb: Pcb,
    pub stack: [u32; STACK_WORDS],
}

const _: () = assert!(size_of::<KernelSlot>() == KERNEL_SLOT_SIZE);

/// The slots in address order. Pid `p` owns slot `MAX_PROCESSES - 1 - p`,
/// so higher pids sit lower in memory.
#[repr(C)]
pub struct ProcessArena {
    slots: [KernelSlot; MAX_PROCESSES],
}

impl ProcessArena {
    pub const fn new() -> Self {
        const EMPTY: KernelSlot = KernelSlot { pcb: Pcb::EMPTY, stack: [0; STACK_WORDS] };
        Self { slots: [EMPTY; MAX_PROCESSES] }
    }
}

const fn slot_index(pid: Pid) -> usize {
    MAX_PROCESSES - 1 - pid.index()
}

/// Word index of the frame a trap from user mode builds, and of launch frames
const TOP_FRAME: usize = STACK_WORDS - 1 - FRAME_WORDS;

pub struct ProcessTable {
    arena: &'static mut ProcessArena,
}

impl ProcessTable {
    pub fn new(arena: &'static mut ProcessArena) -> Self {
        let mut table = Self { arena };
        for pid in Pid::all() {
            let pcb = table.pcb_mut(pid);
            *pcb = Pcb::EMPTY;
            pcb.pid = pid;
        }
        table
    }

    pub fn pcb(&self, pid: Pid) -> &Pcb {
        &self.arena.slots[slot_index(pid)].pcb
    }

    pub fn pcb_mut(&mut self, pid: Pid) -> &mut Pcb {
        &mut self.arena.slots[slot_index(pid)].pcb
    }

    pub fn in_use(&self, pid: Pid) -> bool {
        self.pcb(pid).in_use
    }

    /// Lowest free child pid.
    pub fn allocate_child(&self) -> SysResult<Pid> {
        Pid::children()
            .find(|&pid| !self.in_use(pid))
            .ok_or(SysError::ResourceExhausted)
    }

    /// The base shell pid of `terminal`, if it is free.
    pub fn allocate_shell(&self, terminal: TerminalId) -> SysResult<Pid> {
        let pid = Pid::base_shell(terminal);
        if self.in_use(pid) {
            return Err(SysError::ResourceExhausted);
        }
        Ok(pid)
    }

    pub fn active_count(&self) -> usize {
        Pid::all().filter(|&pid| self.in_use(pid)).count()
    }

    fn slot_address(&self, pid: Pid) -> usize {
        &self.arena.slots[slot_index(pid)] as *const KernelSlot as usize
    }

    fn base(&self) -> usize {
        &*self.arena as *const ProcessArena as usize
    }

    /// `esp0` for `pid`: one word below the end of its slot.
    pub fn kernel_stack_top(&self, pid: Pid) -> usize {
        self.slot_address(pid) + KERNEL_SLOT_SIZE - 4
    }

    /// Build a first-entry frame for `pid` at the top of its kernel stack.
    pub fn write_launch_frame(&mut self, pid: Pid, entry: u32) -> SysResult<SavedContext> {
        let esp = self.slot_address(pid) + offset_of!(KernelSlot, stack) + TOP_FRAME * 4;
        let words = frame_words(&mut self.arena.slots[slot_index(pid)].stack, TOP_FRAME)
            .ok_or(SysError::InvalidArgument)?;
        InterruptFrame::new(words).launch(entry);
        Ok(SavedContext::new(esp, 0))
    }

    /// Locate the slot and stack word `esp` points at, if a whole frame fits.
    fn locate(&self, esp: usize) -> Option<(usize, usize)> {
        let offset = esp.checked_sub(self.base())?;
        let slot = offset / KERNEL_SLOT_SIZE;
        if slot >= MAX_PROCESSES {
            return None;
        }
        let within = (offset % KERNEL_SLOT_SIZE).checked_sub(offset_of!(KernelSlot, stack))?;
        if within % 4 != 0 || within / 4 + FRAME_WORDS > STACK_WORDS {
            return None;
        }
        Some((slot, within / 4))
    }

    /// The frame a saved context points at.
    pub fn frame_mut(&mut self, context: SavedContext) -> SysResult<InterruptFrame<'_>> {
        let (slot, index) = self.locate(context.esp).ok_or(SysError::InvalidArgument)?;
        frame_words(&mut self.arena.slots[slot].stack, index)
            .map(InterruptFrame::new)
            .ok_or(SysError::InvalidArgument)
    }

    /// Owner of the kernel stack `esp` lies on.
    #[cfg(test)]
    pub fn owner_of(&self, esp: usize) -> Option<Pid> {
        let (slot, _) = self.locate(esp)?;
        Pid::new(MAX_PROCESSES - 1 - slot)
    }

    /// Wrap the frame at `esp` as a context, reading its saved `ebp`.
    pub fn context_at(&mut self, esp: usize) -> SysResult<SavedContext> {
        let ebp = self.frame_mut(SavedContext::new(esp, 0))?.ebp();
        Ok(SavedContext::new(esp, ebp as usize))
    }
}

fn frame_words(stack: &mut [u32; STACK_WORDS], index: usize) -> Option<&mut [u32; FRAME_WORDS]> {
    stack.get_mut(index..)?.first_chunk_mut::<FRAME_WORDS>()
}

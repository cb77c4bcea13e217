//! Kernel state
//!
//! Everything the kernel mutates lives in one `Kernel` value. The boot binary
//! keeps it behind a lock that is only taken with interrupts masked, so each
//! trap sees a consistent snapshot and runs to completion.

use crate::config::{NUM_TERMINALS, TAB_WIDTH};
use crate::drivers::keyboard::{KeyAction, Keyboard};
use crate::drivers::rtc::Rtc;
use crate::drivers::terminal::{TerminalId, Terminals};
use crate::drivers::vga::{self, Video};
use crate::error::SysResult;
use crate::fs::FileSystem;
use crate::mm::{AddressSpace, DisplayTarget, PageDirectory, PageTable, UserFrames, UserMemory};
use crate::task::{Launch, Pid, ProcessArena, ProcessTable, SavedContext};
use core::fmt;

/// Memory the kernel is built over
pub struct Backing {
    pub directory: &'static mut PageDirectory,
    pub kernel_table: &'static mut PageTable,
    pub vidmap_table: &'static mut PageTable,
    pub arena: &'static mut ProcessArena,
    /// Kernel view of the physical display
    pub screen: &'static mut [u16],
    pub terminal_buffers: [&'static mut [u16]; NUM_TERMINALS],
    pub user: UserFrames,
    pub fs_image: &'static [u8],
}

#[cfg(all(target_arch = "x86", target_os = "none"))]
impl Backing {
    /// Backing at the fixed physical addresses.
    ///
    /// The display is reached through its alias page, so nothing may draw
    /// before paging is on.
    ///
    /// # Safety
    /// Call once, before anything else refers to these regions.
    pub unsafe fn hardware(fs_image: &'static [u8]) -> Self {
        use crate::config::{BIG_PAGE_SIZE, KERNEL_SLOT_SIZE, MAX_PROCESSES, USER_BASE};
        use crate::drivers::vga::CELLS;
        use crate::mm::{terminal_buffer, ARENA_BASE, VIDEO_ALIAS};
        use core::ptr::addr_of_mut;
        use core::slice::from_raw_parts_mut;

        static mut DIRECTORY: PageDirectory = PageDirectory::new();
        static mut KERNEL_TABLE: PageTable = PageTable::new();
        static mut VIDMAP_TABLE: PageTable = PageTable::new();

        // Stale stack words must never read back as frames; `ProcessTable::new`
        // then writes every PCB.
        let arena = ARENA_BASE as *mut ProcessArena;
        core::ptr::write_bytes(arena as *mut u8, 0, MAX_PROCESSES * KERNEL_SLOT_SIZE);

        let cells = |address: usize| -> &'static mut [u16] { from_raw_parts_mut(address as *mut u16, CELLS) };
        Self {
            directory: &mut *addr_of_mut!(DIRECTORY),
            kernel_table: &mut *addr_of_mut!(KERNEL_TABLE),
            vidmap_table: &mut *addr_of_mut!(VIDMAP_TABLE),
            arena: &mut *arena,
            screen: cells(VIDEO_ALIAS),
            terminal_buffers: [
                cells(terminal_buffer(0).as_usize()),
                cells(terminal_buffer(1).as_usize()),
                cells(terminal_buffer(2).as_usize()),
            ],
            user: UserFrames::Mapped(from_raw_parts_mut(USER_BASE as *mut u8, BIG_PAGE_SIZE)),
            fs_image,
        }
    }
}

pub struct Kernel {
    pub(crate) space: AddressSpace,
    pub(crate) processes: ProcessTable,
    pub(crate) terminals: Terminals,
    pub(crate) video: Video,
    pub(crate) keyboard: Keyboard,
    pub(crate) rtc: Rtc,
    pub(crate) fs: FileSystem<'static>,
    pub(crate) user: UserMemory,
    /// Process owning the CPU
    pub(crate) current: Option<Pid>,
    /// `esp0` of `current`, loaded into the TSS after every trap
    pub(crate) kernel_stack: usize,
}

impl Kernel {
    /// Install the kernel mappings over `backing`. Touches neither the
    /// display nor the user region.
    pub fn new(backing: Backing) -> SysResult<Self> {
        let fs = FileSystem::new(backing.fs_image)?;
        let mut space = AddressSpace::new(backing.directory, backing.kernel_table, backing.vidmap_table);
        space.install_kernel_mappings();
        Ok(Self {
            space,
            processes: ProcessTable::new(backing.arena),
            terminals: Terminals::new(),
            video: Video::new(backing.screen, backing.terminal_buffers),
            keyboard: Keyboard::new(),
            rtc: Rtc::new(),
            fs,
            user: UserMemory::new(backing.user),
            current: None,
            kernel_stack: 0,
        })
    }

    /// Clear the screen and start terminal 0's shell.
    ///
    /// Returns the context to enter it with. The timer must stay off until
    /// this has run so the scheduler always finds an active terminal.
    pub fn boot(&mut self) -> SysResult<SavedContext> {
        self.video.clear_all();
        vga::move_hardware_cursor(self.terminals.cursor(TerminalId::FIRST));
        match self.launch_shell(TerminalId::FIRST)? {
            Launch::Running(context) => Ok(context),
            Launch::Parked(pid) => panic!("boot shell {} was parked", pid),
        }
    }

    pub fn current(&self) -> Option<Pid> {
        self.current
    }

    pub fn kernel_stack(&self) -> usize {
        self.kernel_stack
    }

    pub fn directory_address(&self) -> usize {
        self.space.directory_address()
    }

    pub fn rtc_mut(&mut self) -> &mut Rtc {
        &mut self.rtc
    }

    /// Point the user region at `pid`, both in the page directory and in
    /// the kernel's window onto it.
    pub(crate) fn map_user(&mut self, pid: Pid) {
        self.space.map_process_region(pid);
        self.user.map(pid);
    }

    /// Where the display page should point while `scheduled` runs.
    pub(crate) fn display_target(&self, scheduled: TerminalId) -> DisplayTarget {
        if scheduled == self.terminals.displayed() {
            DisplayTarget::Physical
        } else {
            DisplayTarget::Buffer(scheduled)
        }
    }

    /// Draw `bytes` on `terminal`'s current surface.
    pub(crate) fn render(&mut self, terminal: TerminalId, bytes: &[u8]) {
        let displayed = self.terminals.displayed();
        let surface = self.video.surface(terminal, displayed);
        let cursor = self.terminals.cursor_mut(terminal);
        vga::write_bytes(surface, cursor, bytes);
        if terminal == displayed {
            vga::move_hardware_cursor(*cursor);
        }
    }

    /// Formatted output on a terminal.
    pub(crate) fn terminal_writer(&mut self, terminal: TerminalId) -> TerminalWriter<'_> {
        TerminalWriter { kernel: self, terminal }
    }

    /// Run one decoded keystroke against the displayed terminal.
    pub fn handle_scancode(&mut self, scancode: u8) {
        let Some(action) = self.keyboard.feed(scancode) else {
            return;
        };
        let displayed = self.terminals.displayed();
        match action {
            KeyAction::Char(byte) => self.type_byte(displayed, byte),
            KeyAction::Tab => {
                for _ in 0..TAB_WIDTH {
                    self.type_byte(displayed, b' ');
                }
            }
            KeyAction::Backspace => {
                if self.terminals.get_mut(displayed).backspace() {
                    let surface = self.video.surface(displayed, displayed);
                    let cursor = self.terminals.cursor_mut(displayed);
                    vga::erase(surface, cursor);
                    vga::move_hardware_cursor(*cursor);
                }
            }
            KeyAction::Enter => {
                let terminal = self.terminals.get_mut(displayed);
                if !terminal.line_ready() {
                    terminal.complete_line();
                    self.render(displayed, b"\n");
                }
            }
            KeyAction::SwitchTerminal(target) => self.switch_terminal(target),
            KeyAction::ClearScreen => self.clear_terminal(displayed),
        }
    }

    fn type_byte(&mut self, terminal: TerminalId, byte: u8) {
        if self.terminals.get_mut(terminal).push(byte) {
            self.render(terminal, &[byte]);
        }
    }

    /// Blank the terminal and redraw the line being typed.
    fn clear_terminal(&mut self, terminal: TerminalId) {
        let displayed = self.terminals.displayed();
        let surface = self.video.surface(terminal, displayed);
        vga::clear(surface, self.terminals.cursor_mut(terminal));
        let mut pending = [0u8; crate::config::ARG_BUF_LEN];
        let typed = self.terminals.get(terminal).pending();
        let len = typed.len();
        pending[..len].copy_from_slice(typed);
        self.render(terminal, &pending[..len]);
    }

    /// Show `target` on the physical display, launching its shell on the
    /// first visit.
    pub fn switch_terminal(&mut self, target: TerminalId) {
        let from = self.terminals.displayed();
        if target == from {
            return;
        }
        self.video.switch(from, target);
        self.terminals.set_displayed(target);
        let display = self.display_target(self.terminals.scheduled());
        self.space.remap_display_target(display);
        vga::move_hardware_cursor(self.terminals.cursor(target));
        log::debug!("[Terminal] displaying terminal {}", target.index());

        if !self.terminals.get(target).is_active() {
            if let Err(err) = self.launch_shell(target) {
                log::error!("[Terminal] no shell on terminal {}: {}", target.index(), err);
            }
        }
    }
}

pub(crate) struct TerminalWriter<'k> {
    kernel: &'k mut Kernel,
    terminal: TerminalId,
}

impl fmt::Write for TerminalWriter<'_> {
    fn write_str(&mut self, s: &str) -> fmt::Result {
        self.kernel.render(self.terminal, s.as_bytes());
        Ok(())
    }
}

//! Process management module
//!
//! Six process slots. Pids 0..=2 are the resident shells of terminals 0..=2;
//! programs they launch take pids 3..=5.

mod context;
mod lifecycle;
mod manager;
mod pcb;
mod scheduler;

pub use context::SavedContext;
pub use lifecycle::{parse_command, Command, ExitStatus, Launch};
pub use manager::{KernelSlot, ProcessArena, ProcessTable, STACK_WORDS};
pub use pcb::Pcb;

use crate::config::{MAX_PROCESSES, NUM_TERMINALS};
use crate::drivers::terminal::TerminalId;

/// Process id, always in `0..MAX_PROCESSES`
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct Pid(u8);

impl Pid {
    /// Terminal 0's shell, the first process started at boot
    pub const BOOT: Pid = Pid(0);

    pub const fn new(index: usize) -> Option<Self> {
        if index < MAX_PROCESSES {
            Some(Self(index as u8))
        } else {
            None
        }
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }

    pub fn all() -> impl Iterator<Item = Pid> {
        (0..MAX_PROCESSES as u8).map(Pid)
    }

    /// Pids handed to programs started from a shell.
    pub fn children() -> impl Iterator<Item = Pid> {
        (NUM_TERMINALS as u8..MAX_PROCESSES as u8).map(Pid)
    }

    /// Resident shells are never freed; halting one starts a new one.
    pub const fn is_base_shell(self) -> bool {
        (self.0 as usize) < NUM_TERMINALS
    }

    pub const fn base_shell(terminal: TerminalId) -> Pid {
        Pid(terminal.index() as u8)
    }
}

impl core::fmt::Display for Pid {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

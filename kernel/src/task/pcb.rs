//! Process control block

use super::{Pid, SavedContext};
use crate::config::ARG_BUF_LEN;
use crate::drivers::terminal::TerminalId;
use crate::fs::FileTable;

pub struct Pcb {
    pub pid: Pid,
    /// `None` for the resident shells
    pub parent: Option<Pid>,
    pub terminal: TerminalId,
    pub files: FileTable,
    /// Parent's frame from its `execute` call, resumed by `halt`
    pub syscall_context: Option<SavedContext>,
    /// Frame captured by the last timer tick, resumed by the scheduler
    pub sched_context: Option<SavedContext>,
    pub in_use: bool,
    args: [u8; ARG_BUF_LEN],
    args_len: usize,
}

impl Pcb {
    pub const EMPTY: Pcb = Pcb {
        pid: Pid::BOOT,
        parent: None,
        terminal: TerminalId::FIRST,
        files: FileTable::new(),
        syscall_context: None,
        sched_context: None,
        in_use: false,
        args: [0; ARG_BUF_LEN],
        args_len: 0,
    };

    pub fn args(&self) -> &[u8] {
        &self.args[..self.args_len]
    }

    pub fn set_args(&mut self, args: &[u8]) {
        let len = args.len().min(ARG_BUF_LEN);
        self.args = [0; ARG_BUF_LEN];
        self.args[..len].copy_from_slice(&args[..len]);
        self.args_len = len;
    }

    /// Back to the unused state.
    pub fn recycle(&mut self) {
        *self = Pcb { pid: self.pid, ..Pcb::EMPTY };
    }
}

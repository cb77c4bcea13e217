//! System call handling module
//!
//! `int 0x80` with the call number in `eax` and up to three arguments in
//! `ebx`, `ecx` and `edx`. Every failure reaches user space as -1.

mod fs;
mod process;

use crate::error::{SysError, SysResult};
use crate::state::Kernel;
use crate::task::{Pcb, SavedContext};

pub const SYSCALL_HALT: u32 = 1;
pub const SYSCALL_EXECUTE: u32 = 2;
pub const SYSCALL_READ: u32 = 3;
pub const SYSCALL_WRITE: u32 = 4;
pub const SYSCALL_OPEN: u32 = 5;
pub const SYSCALL_CLOSE: u32 = 6;
pub const SYSCALL_GETARGS: u32 = 7;
pub const SYSCALL_VIDMAP: u32 = 8;
pub const SYSCALL_SET_HANDLER: u32 = 9;
pub const SYSCALL_SIGRETURN: u32 = 10;

/// What the trap path does after a call
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Outcome {
    /// Resume the caller with this value in `eax`
    Return(i32),
    /// Resume a different context
    Switch(SavedContext),
    /// Nothing to return yet; retry once an interrupt has come in
    Block,
}

impl Kernel {
    pub fn syscall(&mut self, caller: SavedContext, number: u32, args: [u32; 3]) -> Outcome {
        let [a0, a1, a2] = args;
        let result = match number {
            SYSCALL_HALT => Ok(Outcome::Switch(self.sys_halt(a0))),
            SYSCALL_EXECUTE => self.sys_execute(a0, caller).map(Outcome::Switch),
            SYSCALL_READ => self.sys_read(a0 as i32, a1, a2 as i32),
            SYSCALL_WRITE => self.sys_write(a0 as i32, a1, a2 as i32).map(Outcome::Return),
            SYSCALL_OPEN => self.sys_open(a0).map(Outcome::Return),
            SYSCALL_CLOSE => self.sys_close(a0 as i32).map(Outcome::Return),
            SYSCALL_GETARGS => self.sys_getargs(a0, a1 as i32).map(Outcome::Return),
            SYSCALL_VIDMAP => self.sys_vidmap(a0).map(Outcome::Return),
            SYSCALL_SET_HANDLER | SYSCALL_SIGRETURN => Err(SysError::Unsupported),
            _ => Err(SysError::InvalidArgument),
        };
        result.unwrap_or_else(|err| {
            log::debug!("[Syscall] {} failed: {}", number, err);
            Outcome::Return(err.code())
        })
    }

    fn current_pcb_mut(&mut self) -> SysResult<&mut Pcb> {
        let pid = self.current.ok_or(SysError::InvalidArgument)?;
        Ok(self.processes.pcb_mut(pid))
    }
}

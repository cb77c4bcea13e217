//! Process management syscalls

use crate::config::ARG_BUF_LEN;
use crate::error::{SysError, SysResult};
use crate::mm::{UserMemory, VIDMAP_ADDR};
use crate::state::Kernel;
use crate::task::{ExitStatus, SavedContext};

impl Kernel {
    pub(super) fn sys_halt(&mut self, status: u32) -> SavedContext {
        self.halt(ExitStatus::Exited(status as u8))
    }

    pub(super) fn sys_execute(&mut self, command: u32, caller: SavedContext) -> SysResult<SavedContext> {
        let mut line = [0u8; ARG_BUF_LEN];
        let text = self.user.c_string(command, ARG_BUF_LEN)?;
        let len = text.len();
        line[..len].copy_from_slice(text);
        self.execute(&line[..len], caller)
    }

    /// Copy the argument text, NUL padded, into `buf`.
    pub(super) fn sys_getargs(&mut self, buf: u32, nbytes: i32) -> SysResult<i32> {
        if nbytes <= 0 {
            return Err(SysError::InvalidArgument);
        }
        let pid = self.current.ok_or(SysError::InvalidArgument)?;
        let args = self.processes.pcb(pid).args();
        let dest = self.user.slice_mut(buf, nbytes as usize)?;
        let count = args.len().min(dest.len());
        dest[..count].copy_from_slice(&args[..count]);
        dest[count..].fill(0);
        Ok(0)
    }

    /// Store the user address of the text screen at `screen_start`.
    pub(super) fn sys_vidmap(&mut self, screen_start: u32) -> SysResult<i32> {
        if !UserMemory::contains(screen_start, 4) {
            return Err(SysError::InvalidArgument);
        }
        self.user.write_u32(screen_start, VIDMAP_ADDR as u32)?;
        Ok(0)
    }
}

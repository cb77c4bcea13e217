//! Process lifecycle
//!
//! `execute` loads a program into a fresh slot and enters it; `halt` tears
//! the slot down and resumes whoever is waiting on it.

use super::{Pid, SavedContext};
use crate::config::{ARG_BUF_LEN, FAULT_STATUS, FILENAME_LEN};
use crate::drivers::terminal::TerminalId;
use crate::error::{SysError, SysResult};
use crate::fs::{FileTable, FileType};
use crate::state::Kernel;

/// First bytes of every executable
const MAGIC: [u8; 4] = [0x7F, b'E', b'L', b'F'];
/// Bytes read to find the entry point
const HEADER_LEN: usize = 28;
const ENTRY_OFFSET: usize = 24;

/// A parsed command line
#[derive(Debug, PartialEq, Eq)]
pub struct Command<'a> {
    pub name: &'a [u8],
    pub args: &'a [u8],
}

/// Split `line` at its first space into a program name and the rest.
pub fn parse_command(line: &[u8]) -> SysResult<Command<'_>> {
    if line.is_empty() || line.len() > ARG_BUF_LEN {
        return Err(SysError::InvalidArgument);
    }
    let (name, args) = match line.iter().position(|&b| b == b' ') {
        Some(space) => (&line[..space], &line[space + 1..]),
        None => (line, &line[line.len()..]),
    };
    if name.is_empty() || name.len() > FILENAME_LEN {
        return Err(SysError::InvalidArgument);
    }
    Ok(Command { name, args })
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ExitStatus {
    /// Voluntary `halt`; only the low byte is kept
    Exited(u8),
    /// Killed by a CPU exception
    Faulted,
}

impl ExitStatus {
    /// What the parent's `execute` returns.
    pub fn code(self) -> u32 {
        match self {
            ExitStatus::Exited(status) => status as u32,
            ExitStatus::Faulted => FAULT_STATUS,
        }
    }
}

/// How a new process was started
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Launch {
    /// Its terminal is scheduled: enter it now
    Running(SavedContext),
    /// Its terminal is not scheduled: the scheduler starts it on rotation
    Parked(Pid),
}

impl Kernel {
    /// Load the program named by `line` into a new slot bound to `terminal`.
    ///
    /// On success the new region is left mapped and the terminal's foreground
    /// is the new pid. On failure nothing is allocated.
    fn spawn(
        &mut self,
        line: &[u8],
        terminal: TerminalId,
        caller: Option<SavedContext>,
    ) -> SysResult<(Pid, SavedContext)> {
        let command = parse_command(line)?;
        let dentry = self.fs.read_dentry_by_name(command.name)?;
        if dentry.file_type != FileType::Regular {
            return Err(SysError::InvalidFormat);
        }
        let mut header = [0u8; HEADER_LEN];
        let read = self.fs.read_data(dentry.inode, 0, &mut header)?;
        if read < HEADER_LEN || header[..MAGIC.len()] != MAGIC {
            return Err(SysError::InvalidFormat);
        }
        let entry = u32::from_le_bytes([
            header[ENTRY_OFFSET],
            header[ENTRY_OFFSET + 1],
            header[ENTRY_OFFSET + 2],
            header[ENTRY_OFFSET + 3],
        ]);

        let pid = if self.terminals.get(terminal).is_active() {
            self.processes.allocate_child()?
        } else {
            self.processes.allocate_shell(terminal)?
        };
        let parent = self.terminals.get(terminal).foreground();

        self.map_user(pid);
        let loaded = self
            .fs
            .read_data(dentry.inode, 0, self.user.image_mut())
            .and_then(|_| self.processes.write_launch_frame(pid, entry));
        let context = match loaded {
            Ok(context) => context,
            Err(err) => {
                self.restore_current_mapping();
                return Err(err);
            }
        };

        let pcb = self.processes.pcb_mut(pid);
        pcb.parent = parent;
        pcb.terminal = terminal;
        pcb.files = FileTable::for_terminal(terminal);
        pcb.syscall_context = caller;
        pcb.sched_context = None;
        pcb.set_args(command.args);
        pcb.in_use = true;
        self.terminals.get_mut(terminal).set_foreground(Some(pid));

        log::info!(
            "[Task] pid {} runs {} on terminal {}, entry {:#x}",
            pid,
            core::str::from_utf8(command.name).unwrap_or("?"),
            terminal.index(),
            entry
        );
        Ok((pid, context))
    }

    fn restore_current_mapping(&mut self) {
        if let Some(current) = self.current {
            self.map_user(current);
        }
    }

    /// Hand the CPU to a freshly spawned `pid`.
    fn start(&mut self, pid: Pid, context: SavedContext) -> SavedContext {
        self.current = Some(pid);
        self.kernel_stack = self.processes.kernel_stack_top(pid);
        context
    }

    /// Run `line` as a child of the current process on the scheduled
    /// terminal. `caller` is the frame of the `execute` call, resumed with
    /// the exit status when the child halts.
    pub fn execute(&mut self, line: &[u8], caller: SavedContext) -> SysResult<SavedContext> {
        let terminal = self.terminals.scheduled();
        let (pid, context) = self.spawn(line, terminal, Some(caller))?;
        Ok(self.start(pid, context))
    }

    /// Start the base shell of an idle `terminal`.
    pub fn launch_shell(&mut self, terminal: TerminalId) -> SysResult<Launch> {
        let (pid, context) = self.spawn(b"shell", terminal, None)?;
        if terminal == self.terminals.scheduled() {
            return Ok(Launch::Running(self.start(pid, context)));
        }
        // The first tick that rotates onto the terminal enters the shell.
        self.processes.pcb_mut(pid).sched_context = Some(context);
        self.restore_current_mapping();
        Ok(Launch::Parked(pid))
    }

    /// End the current process and return the context to resume.
    ///
    /// A child returns into its parent's `execute` with the status in `eax`.
    /// A base shell is replaced by a new shell in the same slot.
    pub fn halt(&mut self, status: ExitStatus) -> SavedContext {
        let Some(pid) = self.current else {
            panic!("halt with no current process");
        };
        let pcb = self.processes.pcb(pid);
        let terminal = pcb.terminal;
        let return_to = match (pid.is_base_shell(), pcb.parent, pcb.syscall_context) {
            (true, _, _) => None,
            (false, Some(parent), Some(caller)) => Some((parent, caller)),
            (false, _, _) => panic!("pid {} has nothing to return to", pid),
        };
        let code = status.code();

        let pcb = self.processes.pcb_mut(pid);
        pcb.files.close_all();
        pcb.recycle();
        log::info!("[Task] pid {} halted with status {}", pid, code);

        let Some((parent, caller)) = return_to else {
            self.current = None;
            self.terminals.get_mut(terminal).set_foreground(None);
            return match self.launch_shell(terminal) {
                Ok(Launch::Running(context)) => context,
                other => panic!("terminal {} lost its shell: {:?}", terminal.index(), other),
            };
        };

        self.map_user(parent);
        self.current = Some(parent);
        self.kernel_stack = self.processes.kernel_stack_top(parent);
        self.terminals.get_mut(terminal).set_foreground(Some(parent));
        match self.processes.frame_mut(caller) {
            Ok(mut frame) => frame.set_return(code as i32),
            Err(err) => panic!("pid {} has a bad return frame: {}", parent, err),
        }
        caller
    }
}

//! File descriptors
//!
//! A descriptor is bound to one of four device kinds when it is opened and
//! dispatched on that kind afterwards.

use crate::config::MAX_FILES;
use crate::drivers::terminal::TerminalId;
use crate::error::{SysError, SysResult};

/// Lowest descriptor `open` and `close` may touch
pub const FIRST_USER_FD: usize = 2;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileKind {
    /// Descriptors 0 (input side) and 1 (output side)
    Terminal(TerminalId),
    Regular { inode: u32 },
    /// `wake_at` is the clock tick a blocked read is waiting for
    Rtc { wake_at: Option<u64> },
    Directory,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct OpenFile {
    pub kind: FileKind,
    /// Byte offset for regular files, entry index for directories
    pub position: u32,
}

impl OpenFile {
    pub const fn new(kind: FileKind) -> Self {
        Self { kind, position: 0 }
    }
}

/// Per-process descriptor table
#[derive(Copy, Clone, Debug)]
pub struct FileTable {
    slots: [Option<OpenFile>; MAX_FILES],
}

impl FileTable {
    pub const fn new() -> Self {
        Self { slots: [None; MAX_FILES] }
    }

    /// Fresh table with 0 and 1 bound to `terminal`.
    pub const fn for_terminal(terminal: TerminalId) -> Self {
        let mut table = Self::new();
        table.slots[0] = Some(OpenFile::new(FileKind::Terminal(terminal)));
        table.slots[1] = Some(OpenFile::new(FileKind::Terminal(terminal)));
        table
    }

    /// Lowest unused descriptor.
    pub fn first_free(&self) -> SysResult<usize> {
        (FIRST_USER_FD..MAX_FILES)
            .find(|&fd| self.slots[fd].is_none())
            .ok_or(SysError::ResourceExhausted)
    }

    pub fn install(&mut self, fd: usize, file: OpenFile) {
        self.slots[fd] = Some(file);
    }

    pub fn get_mut(&mut self, fd: i32) -> SysResult<&mut OpenFile> {
        let index = usize::try_from(fd).map_err(|_| SysError::InvalidArgument)?;
        self.slots
            .get_mut(index)
            .and_then(Option::as_mut)
            .ok_or(SysError::InvalidArgument)
    }

    pub fn close(&mut self, fd: i32) -> SysResult<OpenFile> {
        let index = usize::try_from(fd).map_err(|_| SysError::InvalidArgument)?;
        if !(FIRST_USER_FD..MAX_FILES).contains(&index) {
            return Err(SysError::InvalidArgument);
        }
        self.slots[index].take().ok_or(SysError::InvalidArgument)
    }

    /// Release descriptors 2..8.
    pub fn close_all(&mut self) {
        for slot in &mut self.slots[FIRST_USER_FD..] {
            *slot = None;
        }
    }

    pub fn open_count(&self) -> usize {
        self.slots.iter().filter(|slot| slot.is_some()).count()
    }
}

//! Access to the user region from the kernel
//!
//! Every pointer a process passes in is checked against the 4MB region at
//! `USER_BASE` before the kernel touches it.

use crate::config::{BIG_PAGE_SIZE, IMAGE_OFFSET, MAX_PROCESSES, USER_BASE};
use crate::error::{SysError, SysResult};
use crate::task::Pid;

/// Memory behind the user region
pub enum UserFrames {
    /// The live mapping at `USER_BASE`; the page directory selects the frame
    Mapped(&'static mut [u8]),
    /// One buffer per pid, selected in software
    Detached([&'static mut [u8]; MAX_PROCESSES]),
}

pub struct UserMemory {
    frames: UserFrames,
    mapped: Pid,
}

impl UserMemory {
    pub fn new(frames: UserFrames) -> Self {
        Self { frames, mapped: Pid::BOOT }
    }

    /// Follow `AddressSpace::map_process_region`.
    pub fn map(&mut self, pid: Pid) {
        self.mapped = pid;
    }

    pub fn mapped(&self) -> Pid {
        self.mapped
    }

    fn window(&self) -> &[u8] {
        match &self.frames {
            UserFrames::Mapped(window) => window,
            UserFrames::Detached(frames) => &frames[self.mapped.index()][..],
        }
    }

    fn window_mut(&mut self) -> &mut [u8] {
        match &mut self.frames {
            UserFrames::Mapped(window) => window,
            UserFrames::Detached(frames) => &mut frames[self.mapped.index()][..],
        }
    }

    /// Window offset of `[address, address + len)`, if it lies in the region.
    fn offset(address: u32, len: usize) -> SysResult<usize> {
        let start = (address as usize)
            .checked_sub(USER_BASE)
            .ok_or(SysError::InvalidArgument)?;
        match start.checked_add(len) {
            Some(end) if end <= BIG_PAGE_SIZE => Ok(start),
            _ => Err(SysError::InvalidArgument),
        }
    }

    pub fn contains(address: u32, len: usize) -> bool {
        Self::offset(address, len).is_ok()
    }

    pub fn slice(&self, address: u32, len: usize) -> SysResult<&[u8]> {
        let start = Self::offset(address, len)?;
        Ok(&self.window()[start..start + len])
    }

    pub fn slice_mut(&mut self, address: u32, len: usize) -> SysResult<&mut [u8]> {
        let start = Self::offset(address, len)?;
        Ok(&mut self.window_mut()[start..start + len])
    }

    /// NUL-terminated string of at most `max` bytes (terminator excluded).
    pub fn c_string(&self, address: u32, max: usize) -> SysResult<&[u8]> {
        let start = Self::offset(address, 0)?;
        let tail = &self.window()[start..];
        let limit = tail.len().min(max + 1);
        let len = tail[..limit]
            .iter()
            .position(|&b| b == 0)
            .ok_or(SysError::InvalidArgument)?;
        Ok(&tail[..len])
    }

    pub fn write_u32(&mut self, address: u32, value: u32) -> SysResult<()> {
        self.slice_mut(address, 4)?.copy_from_slice(&value.to_le_bytes());
        Ok(())
    }

    /// Where the program image is loaded, up to the end of the region.
    pub fn image_mut(&mut self) -> &mut [u8] {
        &mut self.window_mut()[IMAGE_OFFSET..BIG_PAGE_SIZE]
    }
}

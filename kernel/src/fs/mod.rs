//! Read-only file system
//!
//! The image is a sequence of 4KB blocks: a boot block holding the counts and
//! up to 63 directory entries, then the inodes (a length and up to 1023 data
//! block indices each), then the data blocks. The whole image lives in memory
//! for the kernel's lifetime.

pub mod file;
#[cfg(test)]
pub mod image;

use crate::config::FILENAME_LEN;
use crate::error::{SysError, SysResult};

pub use file::{FileKind, FileTable, OpenFile};

pub const BLOCK_SIZE: usize = 4096;
pub const MAX_DENTRIES: usize = 63;

const DENTRY_SIZE: usize = 64;
/// Counts plus reserved bytes ahead of the first entry
const BOOT_HEADER_SIZE: usize = 64;
const MAX_INODE_BLOCKS: usize = (BLOCK_SIZE / 4) - 1;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum FileType {
    Rtc,
    Directory,
    Regular,
}

impl FileType {
    fn from_raw(raw: u32) -> SysResult<Self> {
        match raw {
            0 => Ok(FileType::Rtc),
            1 => Ok(FileType::Directory),
            2 => Ok(FileType::Regular),
            _ => Err(SysError::InvalidFormat),
        }
    }
}

#[derive(Copy, Clone, Debug)]
pub struct Dentry {
    name: [u8; FILENAME_LEN],
    pub file_type: FileType,
    pub inode: u32,
}

impl Dentry {
    /// Name without NUL padding; a 32-byte name has no terminator.
    pub fn name(&self) -> &[u8] {
        let len = self.name.iter().position(|&b| b == 0).unwrap_or(FILENAME_LEN);
        &self.name[..len]
    }
}

pub struct FileSystem<'a> {
    image: &'a [u8],
    dentry_count: u32,
    inode_count: u32,
    block_count: u32,
}

fn read_u32(bytes: &[u8], offset: usize) -> SysResult<u32> {
    bytes
        .get(offset..offset + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or(SysError::InvalidFormat)
}

impl<'a> FileSystem<'a> {
    /// Validate the boot block and the image size against its counts.
    pub fn new(image: &'a [u8]) -> SysResult<Self> {
        let dentry_count = read_u32(image, 0)?;
        let inode_count = read_u32(image, 4)?;
        let block_count = read_u32(image, 8)?;
        if dentry_count as usize > MAX_DENTRIES {
            return Err(SysError::InvalidFormat);
        }
        let blocks = 1 + inode_count as usize + block_count as usize;
        if image.len() < blocks * BLOCK_SIZE {
            return Err(SysError::InvalidFormat);
        }
        log::info!(
            "[FS] {} entries, {} inodes, {} data blocks",
            dentry_count,
            inode_count,
            block_count
        );
        Ok(Self { image, dentry_count, inode_count, block_count })
    }

    pub fn dentry_count(&self) -> u32 {
        self.dentry_count
    }

    fn dentry_at(&self, slot: usize) -> SysResult<Dentry> {
        let base = BOOT_HEADER_SIZE + slot * DENTRY_SIZE;
        let raw = self.image.get(base..base + DENTRY_SIZE).ok_or(SysError::InvalidFormat)?;
        let mut name = [0u8; FILENAME_LEN];
        name.copy_from_slice(&raw[..FILENAME_LEN]);
        Ok(Dentry {
            name,
            file_type: FileType::from_raw(read_u32(raw, FILENAME_LEN)?)?,
            inode: read_u32(raw, FILENAME_LEN + 4)?,
        })
    }

    /// Exact match against the (up to 32 byte) entry names.
    pub fn read_dentry_by_name(&self, name: &[u8]) -> SysResult<Dentry> {
        if name.is_empty() || name.len() > FILENAME_LEN {
            return Err(SysError::NotFound);
        }
        for slot in 0..self.dentry_count as usize {
            let dentry = self.dentry_at(slot)?;
            if dentry.name() == name {
                return Ok(dentry);
            }
        }
        Err(SysError::NotFound)
    }

    /// Entry by position.
    ///
    /// Only indices above the entry count are refused, so `index == count`
    /// yields the unused slot just past the last entry.
    pub fn read_dentry_by_index(&self, index: u32) -> SysResult<Dentry> {
        if self.dentry_count < index || index as usize >= MAX_DENTRIES {
            return Err(SysError::NotFound);
        }
        self.dentry_at(index as usize)
    }

    fn inode_base(&self, inode: u32) -> SysResult<usize> {
        if inode >= self.inode_count {
            return Err(SysError::InvalidArgument);
        }
        Ok((1 + inode as usize) * BLOCK_SIZE)
    }

    pub fn file_length(&self, inode: u32) -> SysResult<u32> {
        read_u32(self.image, self.inode_base(inode)?)
    }

    /// Copy from byte `offset` of `inode` into `buf`; returns bytes copied,
    /// 0 at end of file.
    pub fn read_data(&self, inode: u32, offset: u32, buf: &mut [u8]) -> SysResult<usize> {
        let inode_base = self.inode_base(inode)?;
        let length = read_u32(self.image, inode_base)? as usize;
        let offset = offset as usize;
        if offset >= length {
            return Ok(0);
        }
        let total = buf.len().min(length - offset);
        let data_base = (1 + self.inode_count as usize) * BLOCK_SIZE;

        let mut copied = 0;
        while copied < total {
            let position = offset + copied;
            let index = position / BLOCK_SIZE;
            if index >= MAX_INODE_BLOCKS {
                return Err(SysError::InvalidFormat);
            }
            let block = read_u32(self.image, inode_base + 4 + index * 4)?;
            if block >= self.block_count {
                return Err(SysError::InvalidFormat);
            }
            let within = position % BLOCK_SIZE;
            let chunk = (BLOCK_SIZE - within).min(total - copied);
            let start = data_base + block as usize * BLOCK_SIZE + within;
            let source = self.image.get(start..start + chunk).ok_or(SysError::InvalidFormat)?;
            buf[copied..copied + chunk].copy_from_slice(source);
            copied += chunk;
        }
        Ok(copied)
    }
}

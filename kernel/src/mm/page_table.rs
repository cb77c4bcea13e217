//! Page Table Management
//!
//! Two-level 32-bit x86 paging. A directory entry either points at a page
//! table or, with `HUGE` set, maps a 4MB big page directly.

use super::memory_layout::PhysAddr;
use core::fmt::{self, Debug, Formatter};

/// Number of entries in a directory or table
pub const ENTRIES: usize = 1024;

bitflags::bitflags! {
    /// Low 12 bits shared by directory and table entries
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct PageFlags: u32 {
        const PRESENT = 1 << 0;
        const WRITABLE = 1 << 1;
        const USER = 1 << 2;
        const WRITE_THROUGH = 1 << 3;
        const CACHE_DISABLE = 1 << 4;
        const ACCESSED = 1 << 5;
        const DIRTY = 1 << 6;
        /// Page-size bit: a directory entry maps 4MB directly
        const HUGE = 1 << 7;
        const GLOBAL = 1 << 8;
    }
}

const FLAG_MASK: u32 = 0xFFF;

/// How the hardware reads a directory slot
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DirectoryKind {
    NotPresent,
    BigPage(PhysAddr),
    Table(PhysAddr),
}

/// Page directory entry
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct DirectoryEntry {
    bits: u32,
}

impl DirectoryEntry {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    /// Entry pointing at a 4KB-aligned page table
    pub fn table(table: PhysAddr, flags: PageFlags) -> Self {
        let flags = (flags - PageFlags::HUGE) | PageFlags::PRESENT;
        Self { bits: table.frame() << 12 | flags.bits() }
    }

    /// Entry mapping a 4MB big page
    pub fn big_page(frame: PhysAddr, flags: PageFlags) -> Self {
        let flags = flags | PageFlags::HUGE | PageFlags::PRESENT;
        Self { bits: frame.frame() << 12 | flags.bits() }
    }

    pub fn flags(&self) -> PageFlags {
        PageFlags::from_bits_truncate(self.bits & FLAG_MASK)
    }

    pub fn address(&self) -> PhysAddr {
        PhysAddr::from_frame(self.bits >> 12)
    }

    pub fn is_present(&self) -> bool {
        self.flags().contains(PageFlags::PRESENT)
    }

    pub fn kind(&self) -> DirectoryKind {
        if !self.is_present() {
            DirectoryKind::NotPresent
        } else if self.flags().contains(PageFlags::HUGE) {
            DirectoryKind::BigPage(self.address())
        } else {
            DirectoryKind::Table(self.address())
        }
    }

    /// Repoint the physical frame, keeping the flags.
    pub fn set_address(&mut self, address: PhysAddr) {
        self.bits = address.frame() << 12 | (self.bits & FLAG_MASK);
    }
}

impl Debug for DirectoryEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PDE")
            .field("address", &format_args!("{:#x}", self.address().as_usize()))
            .field("flags", &self.flags())
            .finish()
    }
}

/// Page table entry
#[derive(Copy, Clone, PartialEq, Eq)]
#[repr(transparent)]
pub struct TableEntry {
    bits: u32,
}

impl TableEntry {
    pub const fn empty() -> Self {
        Self { bits: 0 }
    }

    pub fn new(page: PhysAddr, flags: PageFlags) -> Self {
        let flags = (flags - PageFlags::HUGE) | PageFlags::PRESENT;
        Self { bits: page.frame() << 12 | flags.bits() }
    }

    pub fn flags(&self) -> PageFlags {
        PageFlags::from_bits_truncate(self.bits & FLAG_MASK)
    }

    pub fn address(&self) -> PhysAddr {
        PhysAddr::from_frame(self.bits >> 12)
    }

    pub fn is_present(&self) -> bool {
        self.flags().contains(PageFlags::PRESENT)
    }

    pub fn set_address(&mut self, address: PhysAddr) {
        self.bits = address.frame() << 12 | (self.bits & FLAG_MASK);
    }
}

impl Debug for TableEntry {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("PTE")
            .field("address", &format_args!("{:#x}", self.address().as_usize()))
            .field("flags", &self.flags())
            .finish()
    }
}

/// Page directory, 4KB aligned as the hardware requires
#[repr(C, align(4096))]
pub struct PageDirectory {
    pub entries: [DirectoryEntry; ENTRIES],
}

impl PageDirectory {
    pub const fn new() -> Self {
        Self { entries: [DirectoryEntry::empty(); ENTRIES] }
    }

    pub fn clear(&mut self) {
        self.entries.fill(DirectoryEntry::empty());
    }
}

/// Page table, 4KB aligned
#[repr(C, align(4096))]
pub struct PageTable {
    pub entries: [TableEntry; ENTRIES],
}

impl PageTable {
    pub const fn new() -> Self {
        Self { entries: [TableEntry::empty(); ENTRIES] }
    }

    pub fn clear(&mut self) {
        self.entries.fill(TableEntry::empty());
    }
}

const _: () = assert!(core::mem::size_of::<PageDirectory>() == 4096);
const _: () = assert!(core::mem::size_of::<PageTable>() == 4096);

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn big_page_and_table_are_exclusive() {
        let big = DirectoryEntry::big_page(PhysAddr::new(0x40_0000), PageFlags::WRITABLE);
        assert_eq!(big.kind(), DirectoryKind::BigPage(PhysAddr::new(0x40_0000)));

        let table = DirectoryEntry::table(PhysAddr::new(0x1000), PageFlags::WRITABLE | PageFlags::HUGE);
        assert_eq!(table.kind(), DirectoryKind::Table(PhysAddr::new(0x1000)));
        assert!(!table.flags().contains(PageFlags::HUGE));

        assert_eq!(DirectoryEntry::empty().kind(), DirectoryKind::NotPresent);
    }

    #[test]
    fn set_address_keeps_flags() {
        let mut entry = DirectoryEntry::big_page(PhysAddr::new(0x80_0000), PageFlags::USER | PageFlags::WRITABLE);
        entry.set_address(PhysAddr::new(0xC0_0000));
        assert_eq!(entry.address(), PhysAddr::new(0xC0_0000));
        assert!(entry.flags().contains(PageFlags::USER | PageFlags::HUGE | PageFlags::PRESENT));

        let mut pte = TableEntry::new(PhysAddr::new(0xB8000), PageFlags::WRITABLE);
        pte.set_address(PhysAddr::new(0xBB000));
        assert_eq!(pte.address().as_usize(), 0xBB000);
        assert!(pte.is_present());
    }
}

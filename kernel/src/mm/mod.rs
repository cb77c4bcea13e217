//! Memory Management Module
//!
//! The virtual memory manager: one page directory shared by every process,
//! a page table for the first 4MB (display pages) and one for the vidmap
//! page. Switching processes only ever rewrites the single user-region
//! directory slot.

pub mod memory_layout;
pub mod page_table;
pub mod user;

pub use memory_layout::*;
pub use page_table::{DirectoryEntry, DirectoryKind, PageDirectory, PageFlags, PageTable, TableEntry};
pub use user::{UserFrames, UserMemory};

use crate::arch;
use crate::config::NUM_TERMINALS;
use crate::drivers::terminal::TerminalId;
use crate::task::Pid;

/// What the display page (and the vidmap page) currently shows
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum DisplayTarget {
    /// The physical screen
    Physical,
    /// A terminal's private off-screen buffer
    Buffer(TerminalId),
}

impl DisplayTarget {
    pub fn frame(&self) -> PhysAddr {
        match self {
            DisplayTarget::Physical => PhysAddr::new(VIDEO),
            DisplayTarget::Buffer(terminal) => terminal_buffer(terminal.index()),
        }
    }
}

pub struct AddressSpace {
    directory: &'static mut PageDirectory,
    kernel_table: &'static mut PageTable,
    vidmap_table: &'static mut PageTable,
}

impl AddressSpace {
    pub fn new(
        directory: &'static mut PageDirectory,
        kernel_table: &'static mut PageTable,
        vidmap_table: &'static mut PageTable,
    ) -> Self {
        Self { directory, kernel_table, vidmap_table }
    }

    /// Rebuild every table from scratch.
    ///
    /// Marks everything not present, then enables the display page, its
    /// kernel alias, the terminal buffers, the kernel big page, the vidmap
    /// table and the user-region slot (initially pid 0's frame).
    pub fn install_kernel_mappings(&mut self) {
        self.directory.clear();
        self.kernel_table.clear();
        self.vidmap_table.clear();

        let rw = PageFlags::WRITABLE;
        let video = VirtAddr::new(VIDEO).table_index();
        self.kernel_table.entries[video] = TableEntry::new(PhysAddr::new(VIDEO), rw);
        let alias = VirtAddr::new(VIDEO_ALIAS).table_index();
        self.kernel_table.entries[alias] = TableEntry::new(PhysAddr::new(VIDEO), rw);
        for index in 0..NUM_TERMINALS {
            let buffer = terminal_buffer(index);
            let slot = VirtAddr::new(buffer.as_usize()).table_index();
            self.kernel_table.entries[slot] = TableEntry::new(buffer, rw);
        }
        self.directory.entries[0] = DirectoryEntry::table(table_address(self.kernel_table), rw);

        self.directory.entries[KERNEL_DIR_INDEX] =
            DirectoryEntry::big_page(PhysAddr::new(crate::config::BIG_PAGE_SIZE), rw | PageFlags::GLOBAL);

        self.vidmap_table.entries[VIDMAP_PAGE_INDEX] =
            TableEntry::new(PhysAddr::new(VIDEO), rw | PageFlags::USER);
        self.directory.entries[VIDMAP_DIR_INDEX] =
            DirectoryEntry::table(table_address(self.vidmap_table), rw | PageFlags::USER);

        self.directory.entries[USER_DIR_INDEX] =
            DirectoryEntry::big_page(process_frame(Pid::BOOT), rw | PageFlags::USER);

        log::info!("[MM] kernel mappings installed, directory at {:#x}", self.directory_address());
    }

    /// Point the user region at `pid`'s frame and flush the TLB.
    pub fn map_process_region(&mut self, pid: Pid) {
        self.directory.entries[USER_DIR_INDEX].set_address(process_frame(pid));
        arch::flush_tlb();
    }

    /// Point the display page and the vidmap page at `target` and flush the TLB.
    pub fn remap_display_target(&mut self, target: DisplayTarget) {
        let frame = target.frame();
        self.kernel_table.entries[VirtAddr::new(VIDEO).table_index()].set_address(frame);
        self.vidmap_table.entries[VIDMAP_PAGE_INDEX].set_address(frame);
        arch::flush_tlb();
    }

    /// Software page walk over the tables this address space owns.
    pub fn translate(&self, va: VirtAddr) -> Option<PhysAddr> {
        let index = va.directory_index();
        match self.directory.entries[index].kind() {
            DirectoryKind::NotPresent => None,
            DirectoryKind::BigPage(frame) => Some(PhysAddr::new(frame.as_usize() + va.big_page_offset())),
            DirectoryKind::Table(_) => {
                let table = match index {
                    0 => &*self.kernel_table,
                    VIDMAP_DIR_INDEX => &*self.vidmap_table,
                    _ => return None,
                };
                let entry = table.entries[va.table_index()];
                entry
                    .is_present()
                    .then(|| PhysAddr::new(entry.address().as_usize() + va.page_offset()))
            }
        }
    }

    /// Physical address to load into `cr3`.
    pub fn directory_address(&self) -> usize {
        &*self.directory as *const PageDirectory as usize
    }
}

fn table_address(table: &PageTable) -> PhysAddr {
    PhysAddr::new(table as *const PageTable as usize)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::USER_BASE;

    fn address_space() -> AddressSpace {
        AddressSpace::new(
            Box::leak(Box::new(PageDirectory::new())),
            Box::leak(Box::new(PageTable::new())),
            Box::leak(Box::new(PageTable::new())),
        )
    }

    #[test]
    fn kernel_mappings_cover_expected_pages() {
        let mut space = address_space();
        space.install_kernel_mappings();

        assert_eq!(space.translate(VirtAddr::new(VIDEO + 4)), Some(PhysAddr::new(VIDEO + 4)));
        assert_eq!(space.translate(VirtAddr::new(VIDEO_ALIAS)), Some(PhysAddr::new(VIDEO)));
        assert_eq!(space.translate(VirtAddr::new(0x40_1234)), Some(PhysAddr::new(0x40_1234)));
        assert_eq!(space.translate(VirtAddr::new(0xBA000 + 0x2000)), Some(PhysAddr::new(0xBC000)));
        assert_eq!(space.translate(VirtAddr::new(0)), None);
        assert_eq!(space.translate(VirtAddr::new(0x90_0000)), None);
        assert_eq!(space.translate(VirtAddr::new(VIDMAP_ADDR)), Some(PhysAddr::new(VIDEO)));
    }

    #[test]
    fn user_region_follows_pid() {
        let mut space = address_space();
        space.install_kernel_mappings();
        for pid in Pid::all() {
            space.map_process_region(pid);
            let expected = PhysAddr::new(process_frame(pid).as_usize() + 0x48000);
            assert_eq!(space.translate(VirtAddr::new(USER_BASE + 0x48000)), Some(expected));
        }
    }

    #[test]
    fn display_target_moves_both_pages() {
        let mut space = address_space();
        space.install_kernel_mappings();
        let terminal = TerminalId::new(2).unwrap();
        space.remap_display_target(DisplayTarget::Buffer(terminal));
        assert_eq!(space.translate(VirtAddr::new(VIDEO)), Some(PhysAddr::new(0xBC000)));
        assert_eq!(space.translate(VirtAddr::new(VIDMAP_ADDR)), Some(PhysAddr::new(0xBC000)));
        assert_eq!(space.translate(VirtAddr::new(VIDEO_ALIAS)), Some(PhysAddr::new(VIDEO)));

        space.remap_display_target(DisplayTarget::Physical);
        assert_eq!(space.translate(VirtAddr::new(VIDEO)), Some(PhysAddr::new(VIDEO)));
    }
}

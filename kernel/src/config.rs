//! Kernel configuration constants

use log::LevelFilter;

/// Number of terminals (and therefore of resident base shells)
pub const NUM_TERMINALS: usize = 3;

/// Number of process slots
pub const MAX_PROCESSES: usize = 6;

/// Descriptors per process
pub const MAX_FILES: usize = 8;

/// Argument buffer length, also the longest accepted command line
pub const ARG_BUF_LEN: usize = 128;

/// Longest file name stored in a directory entry
pub const FILENAME_LEN: usize = 32;

/// Page size (4KB)
pub const PAGE_SIZE: usize = 0x1000;

/// Page size bits
pub const PAGE_SIZE_BITS: usize = 12;

/// Big page size (4MB)
pub const BIG_PAGE_SIZE: usize = 0x40_0000;

/// Per-process kernel slot holding the PCB and the kernel stack (8KB)
pub const KERNEL_SLOT_SIZE: usize = 0x2000;

/// End of the kernel big page; kernel slots grow down from here
pub const KERNEL_END: usize = 0x80_0000;

/// Virtual base of the user region (128MB)
pub const USER_BASE: usize = 0x0800_0000;

/// Offset of the program image inside the user region
pub const IMAGE_OFFSET: usize = 0x4_8000;

/// Initial user stack pointer, one word below the end of the user region
pub const USER_STACK_TOP: usize = USER_BASE + BIG_PAGE_SIZE - 4;

/// Exit status reported for a process killed by an exception
pub const FAULT_STATUS: u32 = 256;

/// Text screen geometry
pub const SCREEN_COLS: usize = 80;
pub const SCREEN_ROWS: usize = 25;

/// Grey on black
pub const TEXT_ATTRIBUTE: u8 = 0x07;

/// Spaces inserted for a tab key
pub const TAB_WIDTH: usize = 4;

/// Timer interrupt frequency driving the scheduler
pub const PIT_FREQUENCY: u32 = 20;

/// Rate the real-time clock falls back to on open
pub const RTC_DEFAULT_FREQUENCY: u32 = 2;

/// Highest frequency a process may request from the real-time clock
pub const RTC_MAX_FREQUENCY: u32 = 1024;

/// Log level of the kernel console logger
pub const LOG_LEVEL: LevelFilter = LevelFilter::Info;

//! Kernel core
//!
//! Everything except the boot glue: paging, processes, terminals, devices,
//! the file system and the system-call layer. Hardware access sits behind
//! `arch`, so the rest builds and runs as ordinary host code under test.

#![cfg_attr(not(test), no_std)]
#![cfg_attr(test, allow(dead_code))]

#[macro_use]
pub mod console;
pub mod arch;
pub mod config;
pub mod drivers;
pub mod error;
pub mod fs;
mod lang_items;
pub mod mm;
pub mod state;
pub mod syscall;
pub mod task;
pub mod trap;

#[cfg(test)]
mod testutil;

pub use error::{SysError, SysResult};
pub use state::{Backing, Kernel};

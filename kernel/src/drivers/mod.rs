//! Device drivers

pub mod keyboard;
pub mod pic;
pub mod pit;
pub mod rtc;
pub mod serial;
pub mod terminal;
pub mod vga;

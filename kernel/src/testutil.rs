//! Shared fixtures for the unit tests

use crate::config::{BIG_PAGE_SIZE, NUM_TERMINALS, USER_BASE};
use crate::drivers::terminal::TerminalId;
use crate::drivers::vga::CELLS;
use crate::fs::image::ImageBuilder;
use crate::mm::{PageDirectory, PageTable, UserFrames};
use crate::state::{Backing, Kernel};
use crate::task::{Pid, ProcessArena, SavedContext};
use crate::trap::context::FRAME_WORDS;

pub const SHELL_ENTRY: u32 = 0x0804_9000;
pub const HELLO_ENTRY: u32 = 0x0804_9100;

pub const FRAME0: &[u8] = b"/\\/\\/\\/\\/\\/\\/\\/\\/\\/\\/\\/\\\n  o\n     o    o\n  ><_>\n";

/// Header-only executable: the magic, then the entry point at byte 24.
fn program(entry: u32) -> Vec<u8> {
    let mut image = vec![0u8; 512];
    image[..4].copy_from_slice(b"\x7fELF");
    image[24..28].copy_from_slice(&entry.to_le_bytes());
    image
}

pub fn fs_image() -> Vec<u8> {
    ImageBuilder::new()
        .file("shell", &program(SHELL_ENTRY))
        .file("hello", &program(HELLO_ENTRY))
        .file("frame0.txt", FRAME0)
        .file("tiny", b"\x7fELF")
        .rtc("rtc")
        .file("verylargetextwithverylongname.txt", b"very large text\n")
        .build()
}

fn leak<T>(value: T) -> &'static mut T {
    Box::leak(Box::new(value))
}

fn frame() -> &'static mut [u8] {
    vec![0u8; BIG_PAGE_SIZE].leak()
}

fn cells() -> &'static mut [u16] {
    vec![0u16; CELLS].leak()
}

/// A kernel over leaked host buffers, before `boot`.
pub fn kernel() -> Kernel {
    let backing = Backing {
        directory: leak(PageDirectory::new()),
        kernel_table: leak(PageTable::new()),
        vidmap_table: leak(PageTable::new()),
        arena: leak(ProcessArena::new()),
        screen: cells(),
        terminal_buffers: [cells(), cells(), cells()],
        user: UserFrames::Detached([frame(), frame(), frame(), frame(), frame(), frame()]),
        fs_image: fs_image().leak(),
    };
    match Kernel::new(backing) {
        Ok(kernel) => kernel,
        Err(err) => panic!("test image rejected: {}", err),
    }
}

/// A kernel with terminal 0's shell running.
pub fn booted() -> Kernel {
    let mut kernel = kernel();
    kernel.boot().unwrap();
    kernel
}

/// The frame a trap from `pid`'s user mode would build.
pub fn user_frame(kernel: &mut Kernel, pid: Pid) -> SavedContext {
    let esp = kernel.processes.kernel_stack_top(pid) - FRAME_WORDS * 4;
    kernel.processes.context_at(esp).unwrap()
}

/// Dress `pid`'s user frame up as `int vector`; returns the frame address.
pub fn raise(kernel: &mut Kernel, pid: Pid, vector: u32, eax: u32, args: [u32; 3]) -> usize {
    let context = user_frame(kernel, pid);
    kernel.processes.frame_mut(context).unwrap().fake_trap(vector, eax, args);
    context.esp
}

pub fn make_kernel_frame(kernel: &mut Kernel, esp: usize) {
    let context = kernel.processes.context_at(esp).unwrap();
    kernel.processes.frame_mut(context).unwrap().set_kernel_mode();
}

/// Store `text` plus a NUL at `USER_BASE + offset` in the mapped region.
pub fn put_string(kernel: &mut Kernel, offset: usize, text: &str) -> u32 {
    let address = (USER_BASE + offset) as u32;
    let dest = kernel.user.slice_mut(address, text.len() + 1).unwrap();
    dest[..text.len()].copy_from_slice(text.as_bytes());
    dest[text.len()] = 0;
    address
}

/// Tick until `terminal` is scheduled.
pub fn rotate_to(kernel: &mut Kernel, terminal: TerminalId) {
    for _ in 0..NUM_TERMINALS * 2 {
        if kernel.terminals.scheduled() == terminal {
            return;
        }
        let pid = kernel.current().unwrap();
        let frame = user_frame(kernel, pid);
        kernel.tick(frame);
    }
    assert_eq!(kernel.terminals.scheduled(), terminal);
}

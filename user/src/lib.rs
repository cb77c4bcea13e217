#![no_std]
#![no_main]

mod lang_items;

use core::arch::asm;

/// System call numbers
pub const SYS_HALT: u32 = 1;
pub const SYS_EXECUTE: u32 = 2;
pub const SYS_READ: u32 = 3;
pub const SYS_WRITE: u32 = 4;
pub const SYS_OPEN: u32 = 5;
pub const SYS_CLOSE: u32 = 6;
pub const SYS_GETARGS: u32 = 7;
pub const SYS_VIDMAP: u32 = 8;
pub const SYS_SET_HANDLER: u32 = 9;
pub const SYS_SIGRETURN: u32 = 10;

pub const STDIN: i32 = 0;
pub const STDOUT: i32 = 1;

/// Longest command line the kernel accepts
pub const MAX_COMMAND: usize = 128;
/// Longest file name
pub const MAX_NAME: usize = 32;

/// Status `execute` reports for a program killed by an exception
pub const EXCEPTION_STATUS: i32 = 256;

#[inline(always)]
fn syscall(id: u32, args: [u32; 3]) -> i32 {
    let ret: i32;
    unsafe {
        asm!(
            "int 0x80",
            inlateout("eax") id as i32 => ret,
            in("ebx") args[0],
            in("ecx") args[1],
            in("edx") args[2],
        );
    }
    ret
}

/// Copy `text` into `buf` with a trailing NUL, or `None` if it does not fit.
fn c_string<'a>(text: &[u8], buf: &'a mut [u8]) -> Option<&'a [u8]> {
    if text.len() >= buf.len() {
        return None;
    }
    buf[..text.len()].copy_from_slice(text);
    buf[text.len()] = 0;
    Some(&buf[..=text.len()])
}

pub fn sys_halt(status: u8) -> ! {
    syscall(SYS_HALT, [status as u32, 0, 0]);
    unreachable!("halt returned")
}

/// Run `command` and wait for it; returns its exit status or -1.
pub fn sys_execute(command: &[u8]) -> i32 {
    let mut buf = [0u8; MAX_COMMAND + 2];
    match c_string(command, &mut buf) {
        Some(text) => syscall(SYS_EXECUTE, [text.as_ptr() as u32, 0, 0]),
        None => -1,
    }
}

pub fn sys_read(fd: i32, buf: &mut [u8]) -> i32 {
    syscall(SYS_READ, [fd as u32, buf.as_mut_ptr() as u32, buf.len() as u32])
}

pub fn sys_write(fd: i32, buf: &[u8]) -> i32 {
    syscall(SYS_WRITE, [fd as u32, buf.as_ptr() as u32, buf.len() as u32])
}

pub fn sys_open(name: &[u8]) -> i32 {
    let mut buf = [0u8; MAX_NAME + 2];
    match c_string(name, &mut buf) {
        Some(text) => syscall(SYS_OPEN, [text.as_ptr() as u32, 0, 0]),
        None => -1,
    }
}

pub fn sys_close(fd: i32) -> i32 {
    syscall(SYS_CLOSE, [fd as u32, 0, 0])
}

/// Fill `buf` with this program's arguments, NUL padded.
pub fn sys_getargs(buf: &mut [u8]) -> i32 {
    syscall(SYS_GETARGS, [buf.as_mut_ptr() as u32, buf.len() as u32, 0])
}

/// Address of the 80x25 text screen as seen by this process.
pub fn sys_vidmap() -> Option<*mut u16> {
    let mut screen: u32 = 0;
    match syscall(SYS_VIDMAP, [&mut screen as *mut u32 as u32, 0, 0]) {
        0 => Some(screen as *mut u16),
        _ => None,
    }
}

pub fn sys_set_handler(signum: u32, handler: usize) -> i32 {
    syscall(SYS_SET_HANDLER, [signum, handler as u32, 0])
}

pub fn sys_sigreturn() -> i32 {
    syscall(SYS_SIGRETURN, [0, 0, 0])
}

/// Argument text, trimmed at the first NUL.
pub fn args(buf: &mut [u8; MAX_COMMAND]) -> Option<&[u8]> {
    if sys_getargs(buf) != 0 {
        return None;
    }
    let len = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
    (len > 0).then(|| &buf[..len])
}

/// Console writer for implementing core::fmt::Write
struct Stdout;

impl core::fmt::Write for Stdout {
    fn write_str(&mut self, s: &str) -> core::fmt::Result {
        sys_write(STDOUT, s.as_bytes());
        Ok(())
    }
}

/// Print formatted string to stdout
pub fn _print(args: core::fmt::Arguments) {
    use core::fmt::Write;
    let _ = Stdout.write_fmt(args);
}

/// Print macro (like std::print!)
#[macro_export]
macro_rules! print {
    ($($arg:tt)*) => {
        $crate::_print(core::format_args!($($arg)*))
    };
}

/// Println macro (like std::println!)
#[macro_export]
macro_rules! println {
    () => {
        $crate::print!("\n")
    };
    ($($arg:tt)*) => {
        $crate::print!("{}\n", core::format_args!($($arg)*))
    };
}

#[no_mangle]
#[link_section = ".text.entry"]
pub extern "C" fn _start() -> ! {
    extern "Rust" {
        fn main() -> i32;
    }
    let status = unsafe { main() };
    sys_halt(status as u8)
}

#![no_std]
#![no_main]

//! Prints every line of every regular file that contains the pattern.

use user_lib::{args, println, sys_close, sys_open, sys_read, sys_write, MAX_COMMAND, MAX_NAME, STDOUT};

const LINE_LEN: usize = 1024;

struct Line {
    buf: [u8; LINE_LEN],
    len: usize,
}

impl Line {
    fn push(&mut self, byte: u8) {
        if self.len < LINE_LEN {
            self.buf[self.len] = byte;
            self.len += 1;
        }
    }

    fn emit_if_match(&mut self, name: &[u8], pattern: &[u8]) {
        let line = &self.buf[..self.len];
        if line.windows(pattern.len()).any(|w| w == pattern) {
            sys_write(STDOUT, name);
            sys_write(STDOUT, b":");
            sys_write(STDOUT, line);
            println!();
        }
        self.len = 0;
    }
}

fn search(name: &[u8], pattern: &[u8]) {
    let fd = sys_open(name);
    if fd == -1 {
        return;
    }
    let mut line = Line { buf: [0; LINE_LEN], len: 0 };
    let mut chunk = [0u8; 512];
    loop {
        let count = sys_read(fd, &mut chunk);
        if count <= 0 {
            break;
        }
        for &byte in &chunk[..count as usize] {
            match byte {
                b'\n' => line.emit_if_match(name, pattern),
                // Binary files have no business being grepped.
                0 => {
                    sys_close(fd);
                    return;
                }
                _ => line.push(byte),
            }
        }
    }
    if line.len > 0 {
        line.emit_if_match(name, pattern);
    }
    sys_close(fd);
}

#[no_mangle]
pub fn main() -> i32 {
    let mut arg_buf = [0u8; MAX_COMMAND];
    let Some(pattern) = args(&mut arg_buf) else {
        println!("usage: grep <pattern>");
        return 3;
    };

    let dir = sys_open(b".");
    if dir == -1 {
        println!("directory open failed");
        return 2;
    }
    let mut name = [0u8; MAX_NAME];
    loop {
        let count = sys_read(dir, &mut name);
        if count <= 0 {
            break;
        }
        let name = &name[..count as usize];
        if name != b"." && name != b"rtc" {
            search(name, pattern);
        }
    }
    sys_close(dir);
    0
}

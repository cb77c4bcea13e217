#![no_std]
#![no_main]

use user_lib::{print, sys_read, sys_write, STDIN, STDOUT};

#[no_mangle]
pub fn main() -> i32 {
    print!("Hi, what's your name? ");
    let mut name = [0u8; 32];
    let count = sys_read(STDIN, &mut name);
    if count < 0 {
        return 3;
    }
    print!("Hello, ");
    sys_write(STDOUT, &name[..count as usize]);
    0
}

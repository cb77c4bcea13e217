#![no_std]
#![no_main]

use user_lib::{println, sys_close, sys_open, sys_read, sys_write, MAX_NAME, STDOUT};

#[no_mangle]
pub fn main() -> i32 {
    let fd = sys_open(b".");
    if fd == -1 {
        println!("directory open failed");
        return 2;
    }

    let mut name = [0u8; MAX_NAME + 1];
    loop {
        let count = sys_read(fd, &mut name[..MAX_NAME]);
        if count == 0 {
            break;
        }
        if count < 0 {
            println!("directory entry read failed");
            return 3;
        }
        sys_write(STDOUT, &name[..count as usize]);
        println!();
    }
    sys_close(fd);
    0
}

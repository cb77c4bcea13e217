#![no_std]
#![no_main]

use user_lib::{args, println, sys_close, sys_open, sys_read, sys_write, MAX_COMMAND, STDOUT};

#[no_mangle]
pub fn main() -> i32 {
    let mut arg_buf = [0u8; MAX_COMMAND];
    let Some(name) = args(&mut arg_buf) else {
        println!("usage: cat <file>");
        return 3;
    };

    let fd = sys_open(name);
    if fd == -1 {
        println!("file open failed");
        return 2;
    }

    let mut chunk = [0u8; 1024];
    loop {
        let count = sys_read(fd, &mut chunk);
        if count == 0 {
            break;
        }
        if count < 0 {
            println!("file read failed");
            return 3;
        }
        sys_write(STDOUT, &chunk[..count as usize]);
    }
    sys_close(fd);
    0
}

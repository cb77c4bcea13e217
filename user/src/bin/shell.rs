#![no_std]
#![no_main]

use user_lib::{print, println, sys_execute, sys_read, EXCEPTION_STATUS, MAX_COMMAND, STDIN};

#[no_mangle]
pub fn main() -> i32 {
    let mut line = [0u8; MAX_COMMAND + 1];
    loop {
        print!("391OS> ");
        let count = sys_read(STDIN, &mut line);
        if count < 0 {
            println!("read from keyboard failed");
            return 3;
        }
        let mut command = &line[..count as usize];
        while let [rest @ .., b'\n' | b'\r'] = command {
            command = rest;
        }
        if command.is_empty() {
            continue;
        }
        if command == b"exit" {
            return 0;
        }

        match sys_execute(command) {
            -1 => println!("no such command"),
            EXCEPTION_STATUS => println!("program terminated by exception"),
            0 => {}
            _ => println!("program terminated abnormally"),
        }
    }
}

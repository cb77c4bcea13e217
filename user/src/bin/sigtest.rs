#![no_std]
#![no_main]

use user_lib::{println, sys_set_handler, sys_sigreturn};

extern "C" fn on_signal() {
    println!("signal handler ran");
}

#[no_mangle]
pub fn main() -> i32 {
    for signum in 0..5 {
        let ret = sys_set_handler(signum, on_signal as usize);
        println!("set_handler({}) = {}", signum, ret);
    }
    println!("sigreturn = {}", sys_sigreturn());
    0
}

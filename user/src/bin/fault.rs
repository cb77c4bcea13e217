#![no_std]
#![no_main]

use user_lib::println;

#[no_mangle]
pub fn main() -> i32 {
    println!("dereferencing a null pointer");
    let null = core::ptr::null_mut::<u32>();
    unsafe { null.write_volatile(0xDEAD) };
    println!("still alive?");
    1
}

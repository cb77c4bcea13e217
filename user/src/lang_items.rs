use crate::{println, sys_halt};

#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    if let Some(location) = info.location() {
        println!("panicked at {}:{} {}", location.file(), location.line(), info.message());
    } else {
        println!("panicked: {}", info.message());
    }
    sys_halt(255)
}

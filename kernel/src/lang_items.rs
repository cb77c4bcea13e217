//! Language items and panic handler

#[cfg(all(not(test), target_os = "none"))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    crate::arch::disable_interrupts();
    if let Some(location) = info.location() {
        crate::println!(
            "\n[Kernel Panic] at {}:{} {}",
            location.file(),
            location.line(),
            info.message()
        );
    } else {
        crate::println!("\n[Kernel Panic] {}", info.message());
    }
    crate::arch::halt_forever()
}

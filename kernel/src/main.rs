#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", no_main)]

#[cfg(all(target_arch = "x86", target_os = "none"))]
mod boot {
    use core::arch::global_asm;
    use lazy_static::lazy_static;
    use spin::Mutex;
    use triterm_kernel::arch::{self, gdt, idt};
    use triterm_kernel::config::PIT_FREQUENCY;
    use triterm_kernel::drivers::keyboard::Keyboard;
    use triterm_kernel::drivers::{pic, pit};
    use triterm_kernel::trap::Dispatch;
    use triterm_kernel::{console, println, Backing, Kernel};

    global_asm!(include_str!("entry.S"));
    global_asm!(include_str!("trap/trap.S"));

    static FS_IMAGE: &[u8] = include_bytes!(concat!(env!("OUT_DIR"), "/fs.img"));

    const MULTIBOOT_BOOTLOADER_MAGIC: u32 = 0x2BAD_B002;

    lazy_static! {
        static ref KERNEL: Mutex<Kernel> = Mutex::new(build_kernel());
    }

    fn build_kernel() -> Kernel {
        // SAFETY: runs once, from the first lock in kernel_main.
        let backing = unsafe { Backing::hardware(FS_IMAGE) };
        match Kernel::new(backing) {
            Ok(kernel) => kernel,
            Err(err) => panic!("file system image rejected: {}", err),
        }
    }

    /// Kernel entry point, called from `_start` with the multiboot registers.
    #[no_mangle]
    pub extern "C" fn kernel_main(magic: u32, _info: u32) -> ! {
        clear_bss();
        console::init();

        println!("=================================");
        println!("triterm kernel v{}", env!("CARGO_PKG_VERSION"));
        println!("=================================");
        if magic != MULTIBOOT_BOOTLOADER_MAGIC {
            log::warn!("[Boot] unexpected bootloader magic {:#x}", magic);
        }

        gdt::init();
        idt::init();
        pic::init();

        let entry = {
            let mut kernel = KERNEL.lock();
            // SAFETY: the directory identity maps the kernel big page and
            // the display pages this code runs from.
            unsafe { arch::enable_paging(kernel.directory_address()) };
            log::info!("[MM] paging enabled");

            Keyboard::enable();
            kernel.rtc_mut().init_hardware();
            let entry = match kernel.boot() {
                Ok(context) => context,
                Err(err) => panic!("cannot start the first shell: {}", err),
            };
            // The first shell is running before the timer can fire.
            pit::init(PIT_FREQUENCY);
            gdt::set_kernel_stack(kernel.kernel_stack());
            entry
        };

        // SAFETY: a launch frame on the first shell's kernel stack, with
        // its region mapped.
        unsafe { entry.resume() }
    }

    /// Called by `trap_common` with the frame it built; returns the frame to
    /// unwind.
    #[no_mangle]
    extern "C" fn trap_dispatch(esp: usize) -> usize {
        loop {
            let dispatch = {
                let Some(mut kernel) = KERNEL.try_lock() else {
                    panic!("trap while the kernel lock is held");
                };
                let dispatch = kernel.trap(esp);
                gdt::set_kernel_stack(kernel.kernel_stack());
                dispatch
            };
            match dispatch {
                Dispatch::Resume(context) => return context.esp,
                Dispatch::Wait => arch::wait_for_interrupt(),
            }
        }
    }

    fn clear_bss() {
        extern "C" {
            fn sbss();
            fn ebss();
        }
        unsafe {
            core::slice::from_raw_parts_mut(sbss as usize as *mut u8, ebss as usize - sbss as usize).fill(0);
        }
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    eprintln!("triterm-kernel boots on bare metal only; build it with `cargo kbuild`");
}

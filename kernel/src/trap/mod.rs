//! Interrupt and trap handling module
//!
//! The assembly entry path hands every trap to `Kernel::trap` with the
//! address of its frame and resumes whatever context comes back.

pub mod context;

use crate::arch;
use crate::drivers::keyboard::{self, Keyboard};
use crate::drivers::{pic, pit, rtc};
use crate::state::Kernel;
use crate::syscall::Outcome;
use crate::task::{ExitStatus, SavedContext};
use core::fmt::Write;

pub const TIMER_VECTOR: u32 = 0x20;
pub const KEYBOARD_VECTOR: u32 = 0x21;
pub const RTC_VECTOR: u32 = 0x28;
pub const SYSCALL_VECTOR: u32 = 0x80;

const PAGE_FAULT: u32 = 14;

const EXCEPTION_NAMES: [&str; 20] = [
    "Divide Error",
    "Debug",
    "Non-Maskable Interrupt",
    "Breakpoint",
    "Overflow",
    "Bound Range Exceeded",
    "Invalid Opcode",
    "Device Not Available",
    "Double Fault",
    "Coprocessor Segment Overrun",
    "Invalid TSS",
    "Segment Not Present",
    "Stack-Segment Fault",
    "General Protection Fault",
    "Page Fault",
    "Reserved",
    "x87 Floating-Point Exception",
    "Alignment Check",
    "Machine Check",
    "SIMD Floating-Point Exception",
];

/// What the entry path does next
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Dispatch {
    /// Load this context and return from it
    Resume(SavedContext),
    /// The call blocked: sleep until an interrupt, then dispatch the same
    /// frame again
    Wait,
}

impl Kernel {
    /// Handle the trap whose frame starts at `esp`.
    pub fn trap(&mut self, esp: usize) -> Dispatch {
        let context = match self.processes.context_at(esp) {
            Ok(context) => context,
            Err(_) => panic!("trap frame at {:#x} is not on a process stack", esp),
        };
        let (vector, from_user) = match self.processes.frame_mut(context) {
            Ok(frame) => (frame.vector(), frame.from_user()),
            Err(err) => panic!("unreadable trap frame at {:#x}: {}", esp, err),
        };

        match vector {
            0..=19 => Dispatch::Resume(self.exception(context, vector, from_user)),
            TIMER_VECTOR => {
                pic::send_eoi(pit::IRQ);
                Dispatch::Resume(self.tick(context))
            }
            KEYBOARD_VECTOR => {
                if let Some(scancode) = Keyboard::read_scancode() {
                    self.handle_scancode(scancode);
                }
                pic::send_eoi(keyboard::IRQ);
                Dispatch::Resume(context)
            }
            RTC_VECTOR => {
                self.rtc.interrupt();
                pic::send_eoi(rtc::IRQ);
                Dispatch::Resume(context)
            }
            SYSCALL_VECTOR => self.dispatch_syscall(context),
            _ => {
                log::warn!("[Trap] unexpected vector {:#x}", vector);
                Dispatch::Resume(context)
            }
        }
    }

    fn dispatch_syscall(&mut self, context: SavedContext) -> Dispatch {
        let (number, args) = match self.processes.frame_mut(context) {
            Ok(frame) => frame.syscall_args(),
            Err(err) => panic!("unreadable syscall frame: {}", err),
        };
        match self.syscall(context, number, args) {
            Outcome::Return(value) => {
                if let Ok(mut frame) = self.processes.frame_mut(context) {
                    frame.set_return(value);
                }
                Dispatch::Resume(context)
            }
            Outcome::Switch(next) => Dispatch::Resume(next),
            Outcome::Block => Dispatch::Wait,
        }
    }

    /// Report a CPU exception. A user process is killed with status 256;
    /// an exception in the kernel itself is fatal.
    fn exception(&mut self, context: SavedContext, vector: u32, from_user: bool) -> SavedContext {
        let name = EXCEPTION_NAMES[vector as usize];
        let (error, eip) = match self.processes.frame_mut(context) {
            Ok(frame) => (frame.error_code(), frame.eip()),
            Err(_) => (0, 0),
        };
        if !from_user {
            panic!("Exception {}: {} in kernel at {:#x}, error {:#x}", vector, name, eip, error);
        }
        let fault_address = (vector == PAGE_FAULT).then(arch::read_cr2);

        let terminal = match self.current {
            Some(pid) => self.processes.pcb(pid).terminal,
            None => self.terminals.scheduled(),
        };
        let mut out = self.terminal_writer(terminal);
        let _ = writeln!(out, "Exception {}: {}", vector, name);
        let _ = writeln!(out, "  error code {:#x}, eip {:#x}", error, eip);
        if let Some(address) = fault_address {
            let _ = writeln!(out, "  fault address {:#x}", address);
        }
        log::error!(
            "[Trap] {} in pid {:?} at {:#x}, error {:#x}",
            name,
            self.current.map(|pid| pid.index()),
            eip,
            error
        );
        self.halt(ExitStatus::Faulted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::drivers::terminal::TerminalId;
    use crate::drivers::vga::cell;
    use crate::syscall::SYSCALL_EXECUTE;
    use crate::task::Pid;
    use crate::testutil;

    fn screen_text(kernel: &Kernel, row: usize) -> String {
        let cols = crate::config::SCREEN_COLS;
        kernel.video.screen()[row * cols..(row + 1) * cols]
            .iter()
            .map(|&c| (c & 0xFF) as u8 as char)
            .collect::<String>()
            .trim_end()
            .to_string()
    }

    #[test]
    fn syscall_trap_writes_eax() {
        let mut kernel = testutil::booted();
        let esp = testutil::raise(&mut kernel, Pid::BOOT, SYSCALL_VECTOR, 99, [0, 0, 0]);
        let context = kernel.processes.context_at(esp).unwrap();
        assert_eq!(kernel.trap(esp), Dispatch::Resume(context));
        assert_eq!(kernel.processes.frame_mut(context).unwrap().eax(), u32::MAX);
    }

    #[test]
    fn blocked_read_waits() {
        let mut kernel = testutil::booted();
        let buf = crate::config::USER_BASE as u32 + 0x2000;
        let esp = testutil::raise(&mut kernel, Pid::BOOT, SYSCALL_VECTOR, 3, [0, buf, 16]);
        assert_eq!(kernel.trap(esp), Dispatch::Wait);
    }

    #[test]
    fn faulting_child_returns_256_to_its_shell() {
        let mut kernel = testutil::booted();
        let command = testutil::put_string(&mut kernel, 0x1000, "hello");
        let esp = testutil::raise(&mut kernel, Pid::BOOT, SYSCALL_VECTOR, SYSCALL_EXECUTE, [command, 0, 0]);
        let parent = kernel.processes.context_at(esp).unwrap();
        let Dispatch::Resume(child) = kernel.trap(esp) else {
            panic!("execute blocked");
        };
        assert_ne!(child, parent);

        let child_pid = kernel.current().unwrap();
        let fault = testutil::raise(&mut kernel, child_pid, PAGE_FAULT, 0, [0, 0, 0]);
        assert_eq!(kernel.trap(fault), Dispatch::Resume(parent));
        assert_eq!(kernel.processes.frame_mut(parent).unwrap().eax(), 256);
        assert_eq!(screen_text(&kernel, 0), "Exception 14: Page Fault");
    }

    #[test]
    fn faulting_base_shell_is_replaced() {
        let mut kernel = testutil::booted();
        let esp = testutil::raise(&mut kernel, Pid::BOOT, 13, 0, [0, 0, 0]);
        let Dispatch::Resume(context) = kernel.trap(esp) else {
            panic!("fault blocked");
        };
        assert_eq!(kernel.current(), Some(Pid::BOOT));
        assert!(kernel.processes.frame_mut(context).unwrap().from_user());
        assert_eq!(kernel.terminals.get(TerminalId::FIRST).foreground(), Some(Pid::BOOT));
    }

    #[test]
    fn keyboard_and_rtc_interrupts_resume_the_same_frame() {
        let mut kernel = testutil::booted();
        let esp = testutil::raise(&mut kernel, Pid::BOOT, RTC_VECTOR, 0, [0, 0, 0]);
        let context = kernel.processes.context_at(esp).unwrap();
        assert_eq!(kernel.trap(esp), Dispatch::Resume(context));
        assert_eq!(kernel.rtc_mut().ticks(), 1);

        let esp = testutil::raise(&mut kernel, Pid::BOOT, KEYBOARD_VECTOR, 0, [0, 0, 0]);
        assert_eq!(kernel.trap(esp), Dispatch::Resume(context));
    }

    #[test]
    fn timer_rotates_terminals() {
        let mut kernel = testutil::booted();
        kernel.switch_terminal(TerminalId::new(2).unwrap());
        let esp = testutil::raise(&mut kernel, Pid::BOOT, TIMER_VECTOR, 0, [0, 0, 0]);
        let Dispatch::Resume(next) = kernel.trap(esp) else {
            panic!("tick blocked");
        };
        assert_eq!(kernel.current(), Pid::new(2));
        assert_eq!(kernel.processes.owner_of(next.esp), Pid::new(2));
        assert_eq!(kernel.video.screen()[0], cell(b' '));
    }

    #[test]
    #[should_panic(expected = "in kernel")]
    fn kernel_exception_panics() {
        let mut kernel = testutil::booted();
        let esp = testutil::raise(&mut kernel, Pid::BOOT, 0, 0, [0, 0, 0]);
        testutil::make_kernel_frame(&mut kernel, esp);
        kernel.trap(esp);
    }
}

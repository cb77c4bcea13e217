//! Interrupt frame layout
//!
//! The frame every trap builds on the kernel stack, lowest address first:
//! the data segment registers pushed by `trap_common`, the `pushad` block,
//! the vector and error code pushed by the stub, and the block the CPU pushes
//! itself. The last two words only exist for traps taken from user mode.

use crate::arch::{selector, EFLAGS_IF};
use crate::config::USER_STACK_TOP;

pub const FRAME_WORDS: usize = 19;

const GS: usize = 0;
const FS: usize = 1;
const ES: usize = 2;
const DS: usize = 3;
const EBP: usize = 6;
const EBX: usize = 8;
const EDX: usize = 9;
const ECX: usize = 10;
const EAX: usize = 11;
const VECTOR: usize = 12;
const ERROR: usize = 13;
const EIP: usize = 14;
const CS: usize = 15;
const EFLAGS: usize = 16;
const USER_ESP: usize = 17;
const USER_SS: usize = 18;

/// Typed view over the words of one frame
pub struct InterruptFrame<'a> {
    words: &'a mut [u32; FRAME_WORDS],
}

impl<'a> InterruptFrame<'a> {
    pub fn new(words: &'a mut [u32; FRAME_WORDS]) -> Self {
        Self { words }
    }

    /// Turn the frame into a first entry to user mode at `entry`.
    ///
    /// General registers start at zero, interrupts are enabled and the user
    /// stack starts at the top of the user region.
    pub fn launch(&mut self, entry: u32) {
        self.words.fill(0);
        let data = selector::USER_DATA as u32;
        for slot in [GS, FS, ES, DS] {
            self.words[slot] = data;
        }
        self.words[EIP] = entry;
        self.words[CS] = selector::USER_CODE as u32;
        self.words[EFLAGS] = EFLAGS_IF;
        self.words[USER_ESP] = USER_STACK_TOP as u32;
        self.words[USER_SS] = data;
    }

    pub fn vector(&self) -> u32 {
        self.words[VECTOR]
    }

    pub fn error_code(&self) -> u32 {
        self.words[ERROR]
    }

    pub fn eip(&self) -> u32 {
        self.words[EIP]
    }

    pub fn ebp(&self) -> u32 {
        self.words[EBP]
    }

    #[cfg(test)]
    pub fn eflags(&self) -> u32 {
        self.words[EFLAGS]
    }

    #[cfg(test)]
    pub fn user_esp(&self) -> u32 {
        self.words[USER_ESP]
    }

    /// Trap came from privilege level 3.
    pub fn from_user(&self) -> bool {
        self.words[CS] & 3 == 3
    }

    /// System call number and its three arguments.
    pub fn syscall_args(&self) -> (u32, [u32; 3]) {
        (self.words[EAX], [self.words[EBX], self.words[ECX], self.words[EDX]])
    }

    pub fn eax(&self) -> u32 {
        self.words[EAX]
    }

    /// Value the interrupted code sees in `eax` after `iret`.
    pub fn set_return(&mut self, value: i32) {
        self.words[EAX] = value as u32;
    }

    /// Make the frame look like `int vector` from user mode.
    #[cfg(test)]
    pub fn fake_trap(&mut self, vector: u32, eax: u32, args: [u32; 3]) {
        self.words[VECTOR] = vector;
        self.words[CS] = selector::USER_CODE as u32;
        self.words[EAX] = eax;
        self.words[EBX] = args[0];
        self.words[ECX] = args[1];
        self.words[EDX] = args[2];
    }

    #[cfg(test)]
    pub fn set_kernel_mode(&mut self) {
        self.words[CS] = selector::KERNEL_CODE as u32;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_frame_enters_user_mode() {
        let mut words = [0xAAAA_AAAAu32; FRAME_WORDS];
        let mut frame = InterruptFrame::new(&mut words);
        frame.launch(0x0804_9000);
        assert!(frame.from_user());
        assert_eq!(frame.eip(), 0x0804_9000);
        assert_eq!(frame.eflags() & 0x200, 0x200);
        assert_eq!(frame.user_esp(), 0x083F_FFFC);
        assert_eq!(frame.eax(), 0);
        assert_eq!(words[DS], 0x23);
        assert_eq!(words[CS], 0x1B);
        assert_eq!(words[USER_SS], 0x23);
    }

    #[test]
    fn return_value_lands_in_eax() {
        let mut words = [0u32; FRAME_WORDS];
        words[EAX] = 4;
        words[EBX] = 1;
        words[ECX] = 0x0800_1000;
        words[EDX] = 12;
        let mut frame = InterruptFrame::new(&mut words);
        assert_eq!(frame.syscall_args(), (4, [1, 0x0800_1000, 12]));
        frame.set_return(-1);
        assert_eq!(frame.eax(), u32::MAX);
    }
}

//! Saved execution context

/// Where a suspended process picks up again.
///
/// `esp` addresses a complete interrupt frame on a kernel stack; `ebp` is the
/// frame pointer that was live when it was captured. The only way to act on
/// one is to hand it back to the trap return path.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct SavedContext {
    pub esp: usize,
    pub ebp: usize,
}

impl SavedContext {
    pub const fn new(esp: usize, ebp: usize) -> Self {
        Self { esp, ebp }
    }

    /// Jump into the context. Never returns.
    ///
    /// # Safety
    /// The context must come from the trap entry path or from a launch frame
    /// written by `ProcessTable::write_launch_frame`, and its address space
    /// must be the one currently mapped.
    #[cfg(all(target_arch = "x86", target_os = "none"))]
    pub unsafe fn resume(self) -> ! {
        crate::arch::resume(self.esp, self.ebp)
    }
}

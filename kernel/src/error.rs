//! Kernel error type
//!
//! Every failure a system call can report. Callers in user space only ever
//! see the sentinel -1; the variants exist for the kernel's own logic, logs
//! and tests.

use core::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SysError {
    /// Malformed pointer, bad descriptor index, oversized command line
    InvalidArgument,
    /// No directory entry with that name
    NotFound,
    /// Not an executable, or a corrupt file-system structure
    InvalidFormat,
    /// No free process slot or descriptor
    ResourceExhausted,
    /// Defined but unimplemented call
    Unsupported,
}

pub type SysResult<T> = Result<T, SysError>;

impl SysError {
    /// Value placed in `eax` when a system call fails.
    pub const fn code(self) -> i32 {
        -1
    }
}

impl fmt::Display for SysError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            SysError::InvalidArgument => "invalid argument",
            SysError::NotFound => "no such file",
            SysError::InvalidFormat => "invalid format",
            SysError::ResourceExhausted => "resource exhausted",
            SysError::Unsupported => "unsupported",
        };
        f.write_str(text)
    }
}

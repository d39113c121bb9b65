//! Gate tunables
//!
//! The defaults describe a 32-bit layout with user space below 3 GiB.
//! Embedders with a different split pass their own [`Limits`] to
//! [`Syscalls::new`](crate::syscall::Syscalls::new).

use crate::mm::VirtAddr;

/// Default user/kernel boundary. Every user byte lies strictly below it.
pub const USER_TOP: usize = 0xC000_0000;

/// Default number of descriptors a process may hold open at once.
pub const MAX_OPEN_FILES: usize = 128;

/// Default longest user string accepted, NUL terminator included.
pub const MAX_STRING_LEN: usize = 4096;

/// Limits enforced by the syscall gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// First address that belongs to the kernel.
    pub user_top: VirtAddr,
    /// Capacity of each process's descriptor table.
    pub max_open_files: usize,
    /// Upper bound on file names and command lines, NUL included.
    pub max_string_len: usize,
}

impl Limits {
    pub const DEFAULT: Self = Self {
        user_top: VirtAddr::new(USER_TOP),
        max_open_files: MAX_OPEN_FILES,
        max_string_len: MAX_STRING_LEN,
    };
}

impl Default for Limits {
    fn default() -> Self {
        Self::DEFAULT
    }
}

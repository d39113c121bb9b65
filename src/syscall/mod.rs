//! System Call Interface
//!
//! The gate between user programs and the kernel.
//!
//! # Security Model
//! - Whitelist approach: only the numbers in [`SyscallId`] are accepted;
//!   anything else terminates the caller
//! - Every user address is validated before use, across its full length
//! - Invalid addresses terminate the caller with status -1, never the kernel
//! - Filesystem and console access is serialised by one resource lock
//!
//! # Current Syscalls
//! - 0: halt()
//! - 1: exit(status)
//! - 2: exec(cmd_line) -> pid
//! - 3: wait(pid) -> status
//! - 4: create(name, initial_size) -> bool
//! - 5: remove(name) -> bool
//! - 6: open(name) -> fd
//! - 7: filesize(fd) -> size
//! - 8: read(fd, buf, len) -> count
//! - 9: write(fd, buf, len) -> count
//! - 10: seek(fd, pos)
//! - 11: tell(fd) -> pos
//! - 12: close(fd)

mod file;
mod frame;
mod handler;
mod numbers;
mod process;
pub mod validate;

pub use frame::{Syscall, TrapFrame};
pub use handler::{Control, SyscallError, Syscalls};
pub use numbers::SyscallId;
pub use validate::{Fault, UserBuffer, UserBufferMut, WORD_SIZE};

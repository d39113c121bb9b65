//! Sysgate - the user/kernel system call boundary
//!
//! Everything a user program can ask of the kernel passes through here.
//! The gate decodes a trapped request, validates every user address it is
//! about to touch, and forwards the call to the process manager, the
//! filesystem or the console.
//!
//! # Layers
//! - `mm`: address types and the per-process address space contract
//! - `syscall`: frame decoding, pointer validation, dispatch, handlers
//! - `process`: process record, exit-status slots, descriptor table
//! - `fs`: filesystem/console contracts and the global resource lock
//! - `fixed_point`: 17.14 scaled real arithmetic
//!
//! # Security Model
//! - No user word is read before its address range is validated
//! - Bad addresses terminate the offending process with status -1
//! - Filesystem and console state is only reachable through the resource lock
//! - Unknown syscall numbers terminate the caller

#![cfg_attr(not(test), no_std)]
#![deny(unsafe_op_in_unsafe_fn)]

extern crate alloc;

pub mod config;
pub mod fixed_point;
pub mod fs;
pub mod mm;
pub mod process;
pub mod syscall;

pub use config::Limits;
pub use fixed_point::Real;
pub use fs::{Console, DefaultRawMutex, FileSystem, ResourceLock};
pub use mm::{AddressSpace, PageFlags, VirtAddr};
pub use process::{ExitSlot, Fd, Pid, Process, ProcessManager};
pub use syscall::{Control, SyscallError, SyscallId, Syscalls, TrapFrame};

//! System Call Dispatcher
//!
//! Decodes a trapped request and routes it to its handler.
//!
//! # Security Considerations
//! - The frame is decoded through [`Syscall::decode`], which validates
//!   every word before reading it
//! - Unknown syscall numbers terminate the caller
//! - Any validation failure inside a handler terminates the caller with
//!   status -1; no handler holds the resource lock when that happens

use alloc::string::String;
use core::fmt;

use log::{debug, info, warn};

use crate::config::Limits;
use lock_api::RawMutex;

use crate::fs::{Console, DefaultRawMutex, FileSystem, ResourceLock};
use crate::mm::{AddressSpace, VirtAddr};
use crate::process::{Process, ProcessManager};

use super::frame::{Syscall, TrapFrame};
use super::validate::{read_user_str, Fault};

/// Why a system call could not be carried out at all.
///
/// Every variant ends the calling process with status -1. Ordinary
/// failures such as a missing file are handler return values instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyscallError {
    /// A user address failed validation.
    BadAddress(Fault),
    /// The syscall number is not in the table.
    UnknownSyscall(u32),
}

impl From<Fault> for SyscallError {
    fn from(fault: Fault) -> Self {
        Self::BadAddress(fault)
    }
}

impl fmt::Display for SyscallError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadAddress(fault) => write!(f, "bad address: {}", fault),
            Self::UnknownSyscall(number) => write!(f, "unknown syscall {}", number),
        }
    }
}

/// What the trap glue must do once a syscall has been handled.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    /// Return to the calling process.
    Resume,
    /// The process has exited with this status; switch away and reap it.
    Exit(i32),
    /// Power the machine off without further cleanup.
    PowerOff,
}

/// The syscall gate.
///
/// Shared by every thread in the system. The filesystem and console live
/// inside the resource lock, whose waiting behaviour is chosen by `R`; the
/// process manager is expected to do its own synchronisation.
pub struct Syscalls<F, C, M, R = DefaultRawMutex> {
    pub(super) io: ResourceLock<F, C, R>,
    pub(super) processes: M,
    pub(super) limits: Limits,
}

impl<F: FileSystem, C: Console, M: ProcessManager, R: RawMutex> Syscalls<F, C, M, R> {
    pub fn new(fs: F, console: C, processes: M, limits: Limits) -> Self {
        Self {
            io: ResourceLock::new(fs, console),
            processes,
            limits,
        }
    }

    pub fn io(&self) -> &ResourceLock<F, C, R> {
        &self.io
    }

    pub fn processes(&self) -> &M {
        &self.processes
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Handle one system call trapped from `process`.
    ///
    /// The result, if the call produces one, is stored in `frame.eax`.
    pub fn dispatch<S: AddressSpace>(
        &self,
        frame: &mut TrapFrame,
        process: &mut Process<S, F::File>,
    ) -> Control {
        let esp = VirtAddr::from(frame.esp);
        let call = match Syscall::decode(process.space(), self.limits.user_top, esp) {
            Ok(call) => call,
            Err(err) => return self.fail(process, err),
        };
        debug!("[SYSCALL] {}: {:?}", process.name(), call);

        let result = match call {
            Syscall::Halt => {
                info!("[SYSCALL] halt requested by {}", process.name());
                return Control::PowerOff;
            }
            Syscall::Exit { status } => return self.exit(process, status),
            Syscall::Exec { cmd_line } => self.sys_exec(process, cmd_line).map(Some),
            Syscall::Wait { pid } => Ok(Some(self.sys_wait(pid))),
            Syscall::Create { name, initial_size } => self
                .sys_create(process, name, initial_size)
                .map(|created| Some(created as i32)),
            Syscall::Remove { name } => self
                .sys_remove(process, name)
                .map(|removed| Some(removed as i32)),
            Syscall::Open { name } => self.sys_open(process, name).map(Some),
            Syscall::Filesize { fd } => Ok(Some(self.sys_filesize(process, fd))),
            Syscall::Read { fd, buffer, size } => self.sys_read(process, fd, buffer, size).map(Some),
            Syscall::Write { fd, buffer, size } => self.sys_write(process, fd, buffer, size).map(Some),
            Syscall::Seek { fd, pos } => {
                self.sys_seek(process, fd, pos);
                Ok(None)
            }
            Syscall::Tell { fd } => Ok(Some(self.sys_tell(process, fd) as i32)),
            Syscall::Close { fd } => {
                self.sys_close(process, fd);
                Ok(None)
            }
        };

        match result {
            Ok(Some(value)) => {
                frame.eax = value as u32;
                Control::Resume
            }
            Ok(None) => Control::Resume,
            Err(err) => self.fail(process, err),
        }
    }

    /// Terminate `process` with `status`.
    ///
    /// Closes whatever the process still has open, prints the exit line on
    /// the console and reports the status to the parent. Also used by the
    /// trap glue when a process faults outside a system call.
    pub fn exit<S: AddressSpace>(&self, process: &mut Process<S, F::File>, status: i32) -> Control {
        let line = alloc::format!("{}: exit({})\n", process.name(), status);
        {
            let mut io = self.io.lock();
            for (fd, file) in process.files_mut().drain() {
                debug!("[SYSCALL] closing fd {} on exit", fd);
                io.fs.close(file);
            }
            io.console.putbuf(line.as_bytes());
        }
        process.report_exit(status);
        info!("[PROCESS] {} exited with status {}", process.name(), status);
        Control::Exit(status)
    }

    fn fail<S: AddressSpace>(&self, process: &mut Process<S, F::File>, err: SyscallError) -> Control {
        warn!("[SYSCALL] {}: {}, terminating", process.name(), err);
        self.exit(process, -1)
    }

    /// Copy a user string argument.
    ///
    /// `Ok(None)` means the bytes were readable but are not UTF-8; callers
    /// treat that like a name that does not exist.
    pub(super) fn user_string<S: AddressSpace>(
        &self,
        space: &S,
        addr: VirtAddr,
    ) -> Result<Option<String>, SyscallError> {
        let bytes = read_user_str(space, self.limits.user_top, addr, self.limits.max_string_len)?;
        Ok(String::from_utf8(bytes).ok())
    }
}

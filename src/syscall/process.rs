//! Process lifecycle handlers: exec and wait.
//!
//! `exit` lives with the dispatcher because every fatal path ends there.

use lock_api::RawMutex;
use log::debug;

use crate::fs::{Console, FileSystem};
use crate::mm::{AddressSpace, VirtAddr};
use crate::process::{Pid, Process, ProcessManager};

use super::handler::{SyscallError, Syscalls};

impl<F: FileSystem, C: Console, M: ProcessManager, R: RawMutex> Syscalls<F, C, M, R> {
    /// Start a process from a user command line. Returns its pid or -1.
    ///
    /// Creation runs under the resource lock so loading the executable
    /// cannot interleave with other filesystem calls.
    pub(super) fn sys_exec<S: AddressSpace>(
        &self,
        process: &Process<S, F::File>,
        cmd_line: VirtAddr,
    ) -> Result<i32, SyscallError> {
        let Some(cmd_line) = self.user_string(process.space(), cmd_line)? else {
            return Ok(-1);
        };

        let _io = self.io.lock();
        let pid = self.processes.execute(&cmd_line);
        debug!("[SYSCALL] exec {:?} -> {:?}", cmd_line, pid);
        Ok(pid.map_or(-1, |pid| pid.0))
    }

    /// Wait for a child. Returns its exit status or -1.
    pub(super) fn sys_wait(&self, pid: Pid) -> i32 {
        self.processes.wait(pid).unwrap_or(-1)
    }
}

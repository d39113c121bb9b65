//! Filesystem and console handlers.
//!
//! Every user buffer is validated before the resource lock is taken, so a
//! bad pointer never terminates a process while it holds the lock. Data
//! moves between user memory and the devices through a bounce buffer of
//! at most one page.

use alloc::vec;

use lock_api::RawMutex;
use log::debug;

use crate::fs::{Console, FileSystem};
use crate::mm::{AddressSpace, VirtAddr, PAGE_SIZE};
use crate::process::{Fd, Process, ProcessManager};

use super::handler::{SyscallError, Syscalls};
use super::validate::{validate_user_read, validate_user_write};

impl<F: FileSystem, C: Console, M: ProcessManager, R: RawMutex> Syscalls<F, C, M, R> {
    pub(super) fn sys_create<S: AddressSpace>(
        &self,
        process: &Process<S, F::File>,
        name: VirtAddr,
        initial_size: u32,
    ) -> Result<bool, SyscallError> {
        let Some(name) = self.user_string(process.space(), name)? else {
            return Ok(false);
        };
        Ok(self.io.lock().fs.create(&name, initial_size))
    }

    pub(super) fn sys_remove<S: AddressSpace>(
        &self,
        process: &Process<S, F::File>,
        name: VirtAddr,
    ) -> Result<bool, SyscallError> {
        let Some(name) = self.user_string(process.space(), name)? else {
            return Ok(false);
        };
        Ok(self.io.lock().fs.remove(&name))
    }

    /// Open a file and give it the next descriptor. Returns -1 on failure,
    /// in which case no descriptor is consumed.
    pub(super) fn sys_open<S: AddressSpace>(
        &self,
        process: &mut Process<S, F::File>,
        name: VirtAddr,
    ) -> Result<i32, SyscallError> {
        let Some(name) = self.user_string(process.space(), name)? else {
            return Ok(-1);
        };
        if let Err(err) = process.files_mut().reserve() {
            debug!("[SYSCALL] open {:?}: {}", name, err);
            return Ok(-1);
        }

        let opened = self.io.lock().fs.open(&name);
        let Some(file) = opened else {
            return Ok(-1);
        };
        Ok(process.files_mut().insert(file).0)
    }

    pub(super) fn sys_filesize<S: AddressSpace>(&self, process: &Process<S, F::File>, fd: Fd) -> i32 {
        match process.files().get(fd) {
            Some(file) => self.io.lock().fs.length(file),
            None => -1,
        }
    }

    /// Read into a user buffer.
    ///
    /// Console input takes the lock once per key so other processes can get
    /// at the devices between keystrokes. File reads hold it for the whole
    /// transfer.
    pub(super) fn sys_read<S: AddressSpace>(
        &self,
        process: &mut Process<S, F::File>,
        fd: Fd,
        buffer: VirtAddr,
        size: u32,
    ) -> Result<i32, SyscallError> {
        let Some(count) = transfer_count(size) else {
            return Ok(-1);
        };
        let user_top = self.limits.user_top;
        let (space, files) = process.space_and_files();
        let mut dst = validate_user_write(space, user_top, buffer, size as usize)?;

        if fd == Fd::STDIN {
            for offset in 0..dst.len() {
                let key = self.io.lock().console.getc();
                dst.write_at(offset, &[key]);
            }
            return Ok(count);
        }

        let Some(file) = files.get_mut(fd) else {
            return Ok(-1);
        };
        let mut bounce = vec![0u8; dst.len().min(PAGE_SIZE)];
        let mut total = 0;
        let mut io = self.io.lock();
        while total < dst.len() {
            let want = bounce.len().min(dst.len() - total);
            let got = io.fs.read(file, &mut bounce[..want]).max(0) as usize;
            dst.write_at(total, &bounce[..got]);
            total += got;
            if got < want {
                break;
            }
        }
        Ok(total as i32)
    }

    /// Write from a user buffer.
    ///
    /// Console output is emitted page by page under a single guard, so
    /// lines from different processes do not interleave.
    pub(super) fn sys_write<S: AddressSpace>(
        &self,
        process: &mut Process<S, F::File>,
        fd: Fd,
        buffer: VirtAddr,
        size: u32,
    ) -> Result<i32, SyscallError> {
        let Some(count) = transfer_count(size) else {
            return Ok(-1);
        };
        let user_top = self.limits.user_top;
        let (space, files) = process.space_and_files();
        let src = validate_user_read(&*space, user_top, buffer, size as usize)?;

        if fd == Fd::STDOUT {
            let mut bounce = vec![0u8; src.len().min(PAGE_SIZE)];
            let mut io = self.io.lock();
            let mut offset = 0;
            while offset < src.len() {
                let chunk = src.read_at(offset, &mut bounce);
                io.console.putbuf(&bounce[..chunk]);
                offset += chunk;
            }
            return Ok(count);
        }

        let Some(file) = files.get_mut(fd) else {
            return Ok(-1);
        };
        let mut bounce = vec![0u8; src.len().min(PAGE_SIZE)];
        let mut total = 0;
        let mut io = self.io.lock();
        while total < src.len() {
            let chunk = src.read_at(total, &mut bounce);
            let put = io.fs.write(file, &bounce[..chunk]).max(0) as usize;
            total += put;
            if put < chunk {
                break;
            }
        }
        Ok(total as i32)
    }

    /// Move the file position. Unknown descriptors are ignored.
    pub(super) fn sys_seek<S: AddressSpace>(&self, process: &mut Process<S, F::File>, fd: Fd, pos: u32) {
        if let Some(file) = process.files_mut().get_mut(fd) {
            self.io.lock().fs.seek(file, pos);
        }
    }

    /// Current file position, or `u32::MAX` (-1) for an unknown descriptor.
    pub(super) fn sys_tell<S: AddressSpace>(&self, process: &Process<S, F::File>, fd: Fd) -> u32 {
        match process.files().get(fd) {
            Some(file) => self.io.lock().fs.tell(file),
            None => u32::MAX,
        }
    }

    /// Close a descriptor. Unknown descriptors are ignored.
    pub(super) fn sys_close<S: AddressSpace>(&self, process: &mut Process<S, F::File>, fd: Fd) {
        if let Some(file) = process.files_mut().remove(fd) {
            self.io.lock().fs.close(file);
        }
    }
}

/// Byte count for a transfer of `size`, or `None` when the result could
/// not be reported back as a non-negative `i32`.
fn transfer_count(size: u32) -> Option<i32> {
    let count = i32::try_from(size).ok();
    if count.is_none() {
        debug!("[SYSCALL] transfer of {} bytes refused", size);
    }
    count
}

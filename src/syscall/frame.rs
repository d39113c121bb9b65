//! Trap Frame Decoding
//!
//! On entry the user stack pointer addresses the syscall number, followed
//! by its argument words:
//!
//! ```text
//!   esp + 12 ─► arg 3
//!   esp +  8 ─► arg 2
//!   esp +  4 ─► arg 1
//!   esp      ─► syscall number
//! ```
//!
//! The stack pointer is user-controlled, so every word is validated
//! before it is read, and only as many words as the syscall takes are
//! read at all.

use crate::mm::{AddressSpace, VirtAddr};
use crate::process::{Fd, Pid};

use super::handler::SyscallError;
use super::numbers::SyscallId;
use super::validate::{read_user_word, Fault, WORD_SIZE};

/// User register state saved at the trap.
#[repr(C)]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TrapFrame {
    /// User stack pointer at the trap.
    pub esp: u32,
    /// Result register, handed back to user mode.
    pub eax: u32,
}

impl TrapFrame {
    pub const fn new(esp: u32) -> Self {
        Self { esp, eax: 0 }
    }
}

/// A decoded system call with typed arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Syscall {
    Halt,
    Exit { status: i32 },
    Exec { cmd_line: VirtAddr },
    Wait { pid: Pid },
    Create { name: VirtAddr, initial_size: u32 },
    Remove { name: VirtAddr },
    Open { name: VirtAddr },
    Filesize { fd: Fd },
    Read { fd: Fd, buffer: VirtAddr, size: u32 },
    Write { fd: Fd, buffer: VirtAddr, size: u32 },
    Seek { fd: Fd, pos: u32 },
    Tell { fd: Fd },
    Close { fd: Fd },
}

impl Syscall {
    /// Validate and decode the call whose number sits at `esp`.
    pub fn decode<S: AddressSpace>(
        space: &S,
        user_top: VirtAddr,
        esp: VirtAddr,
    ) -> Result<Self, SyscallError> {
        let word = |index: usize| -> Result<u32, SyscallError> {
            let addr = esp
                .checked_add(index * WORD_SIZE)
                .ok_or(SyscallError::BadAddress(Fault::Overflow))?;
            Ok(read_user_word(space, user_top, addr)?)
        };

        let id = SyscallId::try_from(word(0)?).map_err(SyscallError::UnknownSyscall)?;
        let mut args = [0u32; 3];
        for (i, arg) in args.iter_mut().enumerate().take(id.arity()) {
            *arg = word(i + 1)?;
        }
        let [a, b, c] = args;

        Ok(match id {
            SyscallId::Halt => Self::Halt,
            SyscallId::Exit => Self::Exit { status: a as i32 },
            SyscallId::Exec => Self::Exec { cmd_line: a.into() },
            SyscallId::Wait => Self::Wait { pid: Pid(a as i32) },
            SyscallId::Create => Self::Create { name: a.into(), initial_size: b },
            SyscallId::Remove => Self::Remove { name: a.into() },
            SyscallId::Open => Self::Open { name: a.into() },
            SyscallId::Filesize => Self::Filesize { fd: Fd(a as i32) },
            SyscallId::Read => Self::Read { fd: Fd(a as i32), buffer: b.into(), size: c },
            SyscallId::Write => Self::Write { fd: Fd(a as i32), buffer: b.into(), size: c },
            SyscallId::Seek => Self::Seek { fd: Fd(a as i32), pos: b },
            SyscallId::Tell => Self::Tell { fd: Fd(a as i32) },
            SyscallId::Close => Self::Close { fd: Fd(a as i32) },
        })
    }

    pub const fn id(&self) -> SyscallId {
        match self {
            Self::Halt => SyscallId::Halt,
            Self::Exit { .. } => SyscallId::Exit,
            Self::Exec { .. } => SyscallId::Exec,
            Self::Wait { .. } => SyscallId::Wait,
            Self::Create { .. } => SyscallId::Create,
            Self::Remove { .. } => SyscallId::Remove,
            Self::Open { .. } => SyscallId::Open,
            Self::Filesize { .. } => SyscallId::Filesize,
            Self::Read { .. } => SyscallId::Read,
            Self::Write { .. } => SyscallId::Write,
            Self::Seek { .. } => SyscallId::Seek,
            Self::Tell { .. } => SyscallId::Tell,
            Self::Close { .. } => SyscallId::Close,
        }
    }
}

//! System Call Numbers
//!
//! The numbering is part of the user ABI: user-side wrappers push the
//! number and then up to three argument words before trapping.

use core::fmt;

/// System calls understood by the gate.
#[repr(u32)]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SyscallId {
    /// Power the machine off.
    Halt = 0,
    /// Terminate the calling process.
    Exit = 1,
    /// Start a new process from a command line.
    Exec = 2,
    /// Wait for a child process to exit.
    Wait = 3,
    /// Create a file.
    Create = 4,
    /// Delete a file.
    Remove = 5,
    /// Open a file.
    Open = 6,
    /// Size of an open file.
    Filesize = 7,
    /// Read from a descriptor.
    Read = 8,
    /// Write to a descriptor.
    Write = 9,
    /// Move the position of an open file.
    Seek = 10,
    /// Current position of an open file.
    Tell = 11,
    /// Close a descriptor.
    Close = 12,
}

impl SyscallId {
    /// Every syscall, in number order.
    pub const ALL: [Self; 13] = [
        Self::Halt,
        Self::Exit,
        Self::Exec,
        Self::Wait,
        Self::Create,
        Self::Remove,
        Self::Open,
        Self::Filesize,
        Self::Read,
        Self::Write,
        Self::Seek,
        Self::Tell,
        Self::Close,
    ];

    /// Number of argument words following the syscall number.
    pub const fn arity(self) -> usize {
        match self {
            Self::Halt => 0,
            Self::Exit | Self::Exec | Self::Wait | Self::Remove | Self::Open => 1,
            Self::Filesize | Self::Tell | Self::Close => 1,
            Self::Create | Self::Seek => 2,
            Self::Read | Self::Write => 3,
        }
    }

    pub const fn name(self) -> &'static str {
        match self {
            Self::Halt => "halt",
            Self::Exit => "exit",
            Self::Exec => "exec",
            Self::Wait => "wait",
            Self::Create => "create",
            Self::Remove => "remove",
            Self::Open => "open",
            Self::Filesize => "filesize",
            Self::Read => "read",
            Self::Write => "write",
            Self::Seek => "seek",
            Self::Tell => "tell",
            Self::Close => "close",
        }
    }
}

impl TryFrom<u32> for SyscallId {
    type Error = u32;

    fn try_from(number: u32) -> Result<Self, u32> {
        Self::ALL.get(number as usize).copied().ok_or(number)
    }
}

impl fmt::Display for SyscallId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

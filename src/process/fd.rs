//! Open-File Table
//!
//! Each process owns one table mapping descriptors to filesystem handles.
//!
//! # Design
//! - Descriptors 0 and 1 belong to the console and are never stored here
//! - New descriptors come from a per-process counter that only moves up,
//!   so a closed descriptor is never handed out again
//! - Records are kept sorted by descriptor, which the monotonic counter
//!   gives for free, so lookup is a binary search
//! - Capacity is fixed per process; exhaustion is reported, not panicked on

use alloc::vec::Vec;
use core::fmt;

/// A file descriptor as seen by user programs.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Fd(pub i32);

impl Fd {
    /// Console input.
    pub const STDIN: Self = Self(0);
    /// Console output.
    pub const STDOUT: Self = Self(1);
    /// First descriptor handed out for files.
    pub const FIRST_FILE: Self = Self(2);
}

impl fmt::Display for Fd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Error type for descriptor table operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileTableError {
    /// The table already holds its maximum number of records.
    Full,
    /// Memory for a new record could not be reserved.
    OutOfMemory,
    /// The descriptor counter has run out of values.
    Exhausted,
}

impl fmt::Display for FileTableError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Full => write!(f, "descriptor table full"),
            Self::OutOfMemory => write!(f, "out of memory for descriptor record"),
            Self::Exhausted => write!(f, "descriptor numbers exhausted"),
        }
    }
}

/// One open file.
#[derive(Debug)]
struct OpenFile<H> {
    fd: Fd,
    handle: H,
}

/// Per-process descriptor table.
#[derive(Debug)]
pub struct FileTable<H> {
    files: Vec<OpenFile<H>>,
    next_fd: Fd,
    capacity: usize,
}

impl<H> FileTable<H> {
    /// Create an empty table that holds at most `capacity` open files.
    pub const fn new(capacity: usize) -> Self {
        Self {
            files: Vec::new(),
            next_fd: Fd::FIRST_FILE,
            capacity,
        }
    }

    /// Make room for one more record.
    ///
    /// Called before the file is opened so a failed open never leaves
    /// anything behind, and so [`insert`](Self::insert) cannot fail.
    pub fn reserve(&mut self) -> Result<(), FileTableError> {
        if self.files.len() >= self.capacity {
            return Err(FileTableError::Full);
        }
        if self.next_fd.0 == i32::MAX {
            return Err(FileTableError::Exhausted);
        }
        self.files
            .try_reserve(1)
            .map_err(|_| FileTableError::OutOfMemory)
    }

    /// Store a handle under the next descriptor and return it.
    ///
    /// The caller must have called [`reserve`](Self::reserve) first, which
    /// also keeps the counter below `i32::MAX`.
    pub(crate) fn insert(&mut self, handle: H) -> Fd {
        let fd = self.next_fd;
        self.next_fd = Fd(fd.0 + 1);
        self.files.push(OpenFile { fd, handle });
        fd
    }

    /// Look up a descriptor.
    pub fn get(&self, fd: Fd) -> Option<&H> {
        self.position(fd).map(|i| &self.files[i].handle)
    }

    /// Look up a descriptor for mutation.
    pub fn get_mut(&mut self, fd: Fd) -> Option<&mut H> {
        let index = self.position(fd)?;
        Some(&mut self.files[index].handle)
    }

    /// Remove a descriptor, returning its handle.
    pub fn remove(&mut self, fd: Fd) -> Option<H> {
        self.position(fd).map(|i| self.files.remove(i).handle)
    }

    /// Remove every record, in descriptor order.
    pub fn drain(&mut self) -> impl Iterator<Item = (Fd, H)> + '_ {
        self.files.drain(..).map(|open| (open.fd, open.handle))
    }

    /// The descriptor the next successful open will receive.
    pub fn next_fd(&self) -> Fd {
        self.next_fd
    }

    /// Number of open files.
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    fn position(&self, fd: Fd) -> Option<usize> {
        self.files.binary_search_by_key(&fd, |open| open.fd).ok()
    }
}

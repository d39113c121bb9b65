//! Process state seen by the syscall gate
//!
//! The process manager owns process creation, scheduling and reaping. The
//! gate only needs the slice of a process that system calls touch: its
//! name, its address space, its descriptor table and the link used to
//! report its exit status to the parent.
//!
//! # Exit status delivery
//! ```text
//!   parent (manager side)              child
//! ┌──────────────────────┐        ┌──────────────────┐
//! │ Arc<ExitSlot> per pid│◄─weak──│ parent: Weak<..> │
//! └──────────────────────┘        └──────────────────┘
//! ```
//! The child holds only a weak link, so a parent that has already gone
//! away simply drops the status on the floor.

mod fd;

use alloc::string::String;
use alloc::sync::{Arc, Weak};
use core::fmt;

use spin::Once;

use crate::config::Limits;
use crate::mm::AddressSpace;

pub use fd::{Fd, FileTable, FileTableError};

/// A process identifier.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Debug)]
#[repr(transparent)]
pub struct Pid(pub i32);

impl fmt::Display for Pid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Where a child's exit status lands.
///
/// The status can be recorded once; later attempts are ignored.
pub struct ExitSlot {
    status: Once<i32>,
}

impl ExitSlot {
    pub const fn new() -> Self {
        Self { status: Once::new() }
    }

    /// Create a slot for a new child and the weak link the child keeps.
    pub fn linked() -> (Arc<Self>, Weak<Self>) {
        let slot = Arc::new(Self::new());
        let link = Arc::downgrade(&slot);
        (slot, link)
    }

    /// Record `status`. Returns `false` if a status was already recorded.
    pub fn record(&self, status: i32) -> bool {
        let mut first = false;
        self.status.call_once(|| {
            first = true;
            status
        });
        first
    }

    /// The recorded status, if the child has exited.
    pub fn status(&self) -> Option<i32> {
        self.status.get().copied()
    }
}

impl Default for ExitSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ExitSlot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExitSlot({:?})", self.status())
    }
}

/// The syscall-relevant part of a process.
pub struct Process<S, H> {
    name: String,
    space: S,
    files: FileTable<H>,
    parent: Weak<ExitSlot>,
}

impl<S: AddressSpace, H> Process<S, H> {
    /// Create a process whose exit status is reported through `parent`.
    pub fn new(name: impl Into<String>, space: S, parent: Weak<ExitSlot>, limits: &Limits) -> Self {
        Self {
            name: name.into(),
            space,
            files: FileTable::new(limits.max_open_files),
            parent,
        }
    }

    /// Create a process with nobody to report to.
    pub fn orphan(name: impl Into<String>, space: S, limits: &Limits) -> Self {
        Self::new(name, space, Weak::new(), limits)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn space(&self) -> &S {
        &self.space
    }

    pub fn space_mut(&mut self) -> &mut S {
        &mut self.space
    }

    pub fn files(&self) -> &FileTable<H> {
        &self.files
    }

    pub(crate) fn files_mut(&mut self) -> &mut FileTable<H> {
        &mut self.files
    }

    /// Split borrow used by handlers that copy between a file and user memory.
    pub(crate) fn space_and_files(&mut self) -> (&mut S, &mut FileTable<H>) {
        (&mut self.space, &mut self.files)
    }

    /// Report `status` to the parent, if it still exists.
    pub(crate) fn report_exit(&self, status: i32) -> bool {
        match self.parent.upgrade() {
            Some(slot) => slot.record(status),
            None => false,
        }
    }
}

/// Process creation and reaping, supplied by the embedding kernel.
///
/// Both calls may block the calling thread.
pub trait ProcessManager {
    /// Start a new process from a command line. The program name is the
    /// first whitespace-separated word.
    fn execute(&self, cmd_line: &str) -> Option<Pid>;

    /// Wait for a child to exit and return its status. `None` if `pid` is
    /// not a child of the caller or has already been waited for.
    fn wait(&self, pid: Pid) -> Option<i32>;
}

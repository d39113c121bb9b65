//! Per-Process Address Space Contract
//!
//! The page-table code lives outside the gate. All the gate needs from it
//! is a way to ask "is this page mapped, and how" and a way to copy bytes
//! once a range has been checked.

use bitflags::bitflags;

use super::address::VirtAddr;

bitflags! {
    /// Permissions of a mapped user page, as reported by the page table.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct PageFlags: u32 {
        /// Page is backed by a frame.
        const PRESENT = 1 << 0;
        /// Page may be written.
        const WRITABLE = 1 << 1;
        /// Page is accessible from user mode.
        const USER = 1 << 2;

        /// Ordinary read-only user page (code, rodata).
        const USER_RO = Self::PRESENT.bits() | Self::USER.bits();
        /// Ordinary user data/stack page.
        const USER_RW = Self::USER_RO.bits() | Self::WRITABLE.bits();
    }
}

/// Address space of one process.
///
/// Implementations wrap the process's page directory. `translate` must not
/// fault for any input; `read`/`write` may assume the range has already
/// been validated page by page through `translate`.
pub trait AddressSpace {
    /// Flags of the page containing `page`, or `None` if it is unmapped.
    fn translate(&self, page: VirtAddr) -> Option<PageFlags>;

    /// Copy `dst.len()` bytes starting at `addr` out of user memory.
    fn read(&self, addr: VirtAddr, dst: &mut [u8]);

    /// Copy `src` into user memory starting at `addr`.
    fn write(&mut self, addr: VirtAddr, src: &[u8]);
}

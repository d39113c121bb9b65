//! System Call Input Validation
//!
//! Every user address is checked here before the kernel touches it.
//!
//! # Security Principles
//! - Validate ALL inputs before use
//! - Fail-secure: deny by default
//! - Prevent common vulnerabilities:
//!   - Kernel memory disclosure (range must end below the user boundary)
//!   - Wrap-around (range arithmetic is checked)
//!   - Faults inside the kernel (every page of the range must be mapped)
//!   - Null pointer dereference (explicit checks)
//!   - Writes through read-only mappings (destination pages must be writable)
//!
//! Validation never blocks and never takes the resource lock.

use alloc::vec::Vec;
use core::fmt;

use crate::mm::{AddressSpace, PageFlags, VirtAddr, PAGE_SHIFT, PAGE_SIZE};

/// Size of one argument word on the user stack.
pub const WORD_SIZE: usize = 4;

/// Why a user address was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// The pointer is null.
    Null,
    /// The range reaches the kernel half; carries the first offending address.
    KernelAddress(VirtAddr),
    /// `address + length` wraps around.
    Overflow,
    /// A page of the range is not mapped for user access.
    Unmapped(VirtAddr),
    /// A destination page is mapped read-only.
    ReadOnly(VirtAddr),
    /// A string has no NUL within the length limit.
    Unterminated(VirtAddr),
}

impl fmt::Display for Fault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null pointer"),
            Self::KernelAddress(addr) => write!(f, "kernel address {}", addr),
            Self::Overflow => write!(f, "address range wraps"),
            Self::Unmapped(addr) => write!(f, "unmapped address {}", addr),
            Self::ReadOnly(addr) => write!(f, "read-only page at {}", addr),
            Self::Unterminated(addr) => write!(f, "unterminated string at {}", addr),
        }
    }
}

/// Check that `[addr, addr + len)` is user memory mapped with `required`.
///
/// A zero-length range still needs a non-null user address, but no page
/// is consulted since nothing will be accessed.
pub fn check_range<S: AddressSpace>(
    space: &S,
    user_top: VirtAddr,
    addr: VirtAddr,
    len: usize,
    required: PageFlags,
) -> Result<(), Fault> {
    if addr.is_null() {
        return Err(Fault::Null);
    }
    if addr >= user_top {
        return Err(Fault::KernelAddress(addr));
    }
    if len == 0 {
        return Ok(());
    }

    let end = addr.checked_add(len).ok_or(Fault::Overflow)?;
    if end > user_top {
        return Err(Fault::KernelAddress(user_top));
    }

    let last_page = VirtAddr::new(end.as_usize() - 1).page_number();
    for page in addr.page_number()..=last_page {
        let page = VirtAddr::new(page << PAGE_SHIFT);
        let flags = space.translate(page).unwrap_or(PageFlags::empty());
        if !flags.contains(PageFlags::USER_RO) {
            return Err(Fault::Unmapped(page.max(addr)));
        }
        if !flags.contains(required) {
            return Err(Fault::ReadOnly(page.max(addr)));
        }
    }
    Ok(())
}

/// A validated readable user range.
///
/// Only constructed by [`validate_user_read`], so holding one proves the
/// whole range was checked against the address space it borrows.
#[derive(Debug)]
pub struct UserBuffer<'a, S> {
    space: &'a S,
    addr: VirtAddr,
    len: usize,
}

impl<S: AddressSpace> UserBuffer<'_, S> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy bytes starting at `offset` into `dst`. Returns the count copied,
    /// which is short only when `dst` runs past the end of the range.
    pub fn read_at(&self, offset: usize, dst: &mut [u8]) -> usize {
        let count = dst.len().min(self.len.saturating_sub(offset));
        if count > 0 {
            self.space.read(VirtAddr::new(self.addr.as_usize() + offset), &mut dst[..count]);
        }
        count
    }
}

/// A validated writable user range.
#[derive(Debug)]
pub struct UserBufferMut<'a, S> {
    space: &'a mut S,
    addr: VirtAddr,
    len: usize,
}

impl<S: AddressSpace> UserBufferMut<'_, S> {
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Copy `src` into the range at `offset`. Returns the count copied.
    pub fn write_at(&mut self, offset: usize, src: &[u8]) -> usize {
        let count = src.len().min(self.len.saturating_sub(offset));
        if count > 0 {
            self.space.write(VirtAddr::new(self.addr.as_usize() + offset), &src[..count]);
        }
        count
    }
}

/// Validate a user-space read buffer
///
/// # Security Checks
/// 1. Pointer is non-null
/// 2. Pointer + length doesn't overflow
/// 3. Whole range is below the user boundary
/// 4. Every page of the range is mapped for user access
pub fn validate_user_read<S: AddressSpace>(
    space: &S,
    user_top: VirtAddr,
    addr: VirtAddr,
    len: usize,
) -> Result<UserBuffer<'_, S>, Fault> {
    check_range(space, user_top, addr, len, PageFlags::USER_RO)?;
    Ok(UserBuffer { space, addr, len })
}

/// Validate a user-space write buffer
///
/// Same as read validation, plus every page must be writable.
pub fn validate_user_write<S: AddressSpace>(
    space: &mut S,
    user_top: VirtAddr,
    addr: VirtAddr,
    len: usize,
) -> Result<UserBufferMut<'_, S>, Fault> {
    check_range(&*space, user_top, addr, len, PageFlags::USER_RW)?;
    Ok(UserBufferMut { space, addr, len })
}

/// Validate and read one little-endian word.
pub fn read_user_word<S: AddressSpace>(
    space: &S,
    user_top: VirtAddr,
    addr: VirtAddr,
) -> Result<u32, Fault> {
    let mut word = [0u8; WORD_SIZE];
    validate_user_read(space, user_top, addr, WORD_SIZE)?.read_at(0, &mut word);
    Ok(u32::from_le_bytes(word))
}

/// Validate and copy a NUL-terminated user string, without the NUL.
///
/// Pages are checked one at a time as the scan reaches them, so a string
/// that ends just before an unmapped page is accepted. `max_len` counts
/// the terminator.
pub fn read_user_str<S: AddressSpace>(
    space: &S,
    user_top: VirtAddr,
    addr: VirtAddr,
    max_len: usize,
) -> Result<Vec<u8>, Fault> {
    let mut bytes = Vec::new();
    let mut cursor = addr;

    while bytes.len() < max_len {
        let room = (PAGE_SIZE - cursor.page_offset())
            .min(max_len - bytes.len())
            .min(user_top.as_usize().saturating_sub(cursor.as_usize()));
        let chunk = validate_user_read(space, user_top, cursor, room)?;

        let start = bytes.len();
        bytes.resize(start + room, 0);
        chunk.read_at(0, &mut bytes[start..]);
        if let Some(nul) = bytes[start..].iter().position(|&b| b == 0) {
            bytes.truncate(start + nul);
            return Ok(bytes);
        }
        cursor = cursor.checked_add(room).ok_or(Fault::Overflow)?;
    }

    Err(Fault::Unterminated(addr))
}

//! Memory views used by the syscall gate
//!
//! Provides:
//! - Typed user virtual addresses
//! - The address-space contract implemented by the page-table code
//!
//! # Security Principles
//! - User addresses are plain values until validated
//! - Every byte access goes through the owning address space

mod address;
mod space;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use address::{VirtAddr, PAGE_MASK, PAGE_SHIFT, PAGE_SIZE};
pub use space::{AddressSpace, PageFlags};

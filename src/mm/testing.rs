//! In-memory address space for tests.
//!
//! Built for the crate's own unit tests and, with the `testing` feature,
//! for integration tests and embedders exercising the gate on a host.

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::vec;
use alloc::vec::Vec;

use super::{AddressSpace, PageFlags, VirtAddr, PAGE_SIZE};

/// Sparse page map backed by heap pages.
#[derive(Debug, Default)]
pub struct MockSpace {
    pages: BTreeMap<usize, (PageFlags, Box<[u8]>)>,
}

impl MockSpace {
    pub fn new() -> Self {
        Self::default()
    }

    /// Map `count` zeroed pages starting at page-aligned `base`.
    pub fn map(&mut self, base: usize, count: usize, flags: PageFlags) {
        for i in 0..count {
            let page = base + i * PAGE_SIZE;
            self.pages.insert(page, (flags, vec![0; PAGE_SIZE].into_boxed_slice()));
        }
    }

    /// Store bytes regardless of page permissions.
    ///
    /// # Panics
    /// If any byte falls on an unmapped page.
    pub fn poke(&mut self, addr: usize, bytes: &[u8]) {
        for (i, &b) in bytes.iter().enumerate() {
            let a = VirtAddr::new(addr + i);
            let (_, page) = self.pages.get_mut(&a.page_base().as_usize()).expect("poke into unmapped page");
            page[a.page_offset()] = b;
        }
    }

    pub fn peek(&self, addr: usize, len: usize) -> Vec<u8> {
        let mut out = vec![0; len];
        self.read(VirtAddr::new(addr), &mut out);
        out
    }
}

impl AddressSpace for MockSpace {
    fn translate(&self, page: VirtAddr) -> Option<PageFlags> {
        self.pages.get(&page.page_base().as_usize()).map(|(flags, _)| *flags)
    }

    fn read(&self, addr: VirtAddr, dst: &mut [u8]) {
        for (i, slot) in dst.iter_mut().enumerate() {
            let a = VirtAddr::new(addr.as_usize() + i);
            let (_, page) = &self.pages[&a.page_base().as_usize()];
            *slot = page[a.page_offset()];
        }
    }

    fn write(&mut self, addr: VirtAddr, src: &[u8]) {
        self.poke(addr.as_usize(), src);
    }
}

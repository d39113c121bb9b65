//! Filesystem and Console Contracts
//!
//! Neither the on-disk filesystem nor the console drivers are safe for
//! concurrent use, so both live behind one system-wide lock. The lock owns
//! them: the only way to reach either device is through a guard, which
//! makes "no filesystem or console access without the lock" a property of
//! the types rather than a convention.
//!
//! Waiting for the lock is the embedder's business: the raw mutex is a type
//! parameter, so a kernel with a scheduler plugs in one that puts the
//! waiter to sleep. The default is `spin`'s mutex, which suits hosts and
//! early boot.
//!
//! # Security Considerations
//! - The lock is not recursive; nothing reachable while a guard is held
//!   may try to take it again
//! - Guards release on drop, so every early return unlocks

use core::sync::atomic::{AtomicUsize, Ordering};

use lock_api::{Mutex, MutexGuard, RawMutex};

/// Raw mutex used when the embedder does not supply one.
pub type DefaultRawMutex = spin::Mutex<()>;

/// Filesystem operations used by the syscall handlers.
///
/// Handles are owned by the process that opened them and are handed back
/// to `close` exactly once.
pub trait FileSystem {
    /// An open file.
    type File;

    fn create(&mut self, name: &str, initial_size: u32) -> bool;
    fn remove(&mut self, name: &str) -> bool;
    fn open(&mut self, name: &str) -> Option<Self::File>;
    fn length(&mut self, file: &Self::File) -> i32;
    /// Read at the current position; returns the byte count actually read.
    fn read(&mut self, file: &mut Self::File, buf: &mut [u8]) -> i32;
    /// Write at the current position; returns the byte count actually written.
    fn write(&mut self, file: &mut Self::File, buf: &[u8]) -> i32;
    fn seek(&mut self, file: &mut Self::File, pos: u32);
    fn tell(&mut self, file: &Self::File) -> u32;
    fn close(&mut self, file: Self::File);
}

/// Keyboard input and text output.
pub trait Console {
    /// Block until a key is available and return it.
    fn getc(&mut self) -> u8;

    /// Emit `buf` as one uninterrupted write.
    fn putbuf(&mut self, buf: &[u8]);
}

/// The devices guarded by the resource lock.
#[derive(Debug)]
pub struct Devices<F, C> {
    pub fs: F,
    pub console: C,
}

/// The global resource lock.
///
/// `R` decides how a contended caller waits. Pass a blocking raw mutex
/// to have waiters yield to the scheduler.
pub struct ResourceLock<F, C, R = DefaultRawMutex> {
    devices: Mutex<R, Devices<F, C>>,
    acquisitions: AtomicUsize,
}

impl<F: FileSystem, C: Console, R: RawMutex> ResourceLock<F, C, R> {
    pub fn new(fs: F, console: C) -> Self {
        Self {
            devices: Mutex::new(Devices { fs, console }),
            acquisitions: AtomicUsize::new(0),
        }
    }

    /// Acquire the lock, waiting as `R` waits.
    pub fn lock(&self) -> MutexGuard<'_, R, Devices<F, C>> {
        let guard = self.devices.lock();
        self.acquisitions.fetch_add(1, Ordering::Relaxed);
        guard
    }

    /// Whether some thread currently holds the lock.
    pub fn is_locked(&self) -> bool {
        self.devices.is_locked()
    }

    /// Number of times the lock has been taken since creation.
    pub fn acquisitions(&self) -> usize {
        self.acquisitions.load(Ordering::Relaxed)
    }

    /// Give back the devices.
    pub fn into_inner(self) -> Devices<F, C> {
        self.devices.into_inner()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::sync::atomic::AtomicBool;

    struct NullFs;

    impl FileSystem for NullFs {
        type File = ();
        fn create(&mut self, _name: &str, _initial_size: u32) -> bool {
            false
        }
        fn remove(&mut self, _name: &str) -> bool {
            false
        }
        fn open(&mut self, _name: &str) -> Option<()> {
            None
        }
        fn length(&mut self, _file: &()) -> i32 {
            0
        }
        fn read(&mut self, _file: &mut (), _buf: &mut [u8]) -> i32 {
            0
        }
        fn write(&mut self, _file: &mut (), _buf: &[u8]) -> i32 {
            0
        }
        fn seek(&mut self, _file: &mut (), _pos: u32) {}
        fn tell(&mut self, _file: &()) -> u32 {
            0
        }
        fn close(&mut self, _file: ()) {}
    }

    #[derive(Default)]
    struct Tty(Vec<u8>);

    impl Console for Tty {
        fn getc(&mut self) -> u8 {
            b'x'
        }
        fn putbuf(&mut self, buf: &[u8]) {
            self.0.extend_from_slice(buf);
        }
    }

    /// Raw mutex that counts how often it was waited on, standing in for
    /// a scheduler-backed lock.
    struct CountingRaw {
        locked: AtomicBool,
        waits: AtomicUsize,
    }

    unsafe impl RawMutex for CountingRaw {
        #[allow(clippy::declare_interior_mutable_const)]
        const INIT: Self = Self {
            locked: AtomicBool::new(false),
            waits: AtomicUsize::new(0),
        };

        type GuardMarker = lock_api::GuardSend;

        fn lock(&self) {
            self.waits.fetch_add(1, Ordering::Relaxed);
            while !self.try_lock() {
                core::hint::spin_loop();
            }
        }

        fn try_lock(&self) -> bool {
            self.locked
                .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
                .is_ok()
        }

        unsafe fn unlock(&self) {
            self.locked.store(false, Ordering::Release);
        }

        fn is_locked(&self) -> bool {
            self.locked.load(Ordering::Relaxed)
        }
    }

    #[test]
    fn test_guard_releases_on_drop() {
        let lock: ResourceLock<_, _> = ResourceLock::new(NullFs, Tty::default());
        {
            let mut io = lock.lock();
            io.console.putbuf(b"one");
            assert!(lock.is_locked());
        }
        assert!(!lock.is_locked());
        lock.lock().console.putbuf(b"two");
        assert_eq!(lock.acquisitions(), 2);
        assert_eq!(lock.into_inner().console.0, b"onetwo");
    }

    #[test]
    fn test_embedder_supplied_raw_mutex() {
        let lock: ResourceLock<_, _, CountingRaw> = ResourceLock::new(NullFs, Tty::default());
        {
            let mut io = lock.lock();
            assert!(lock.is_locked());
            io.console.putbuf(b"x");
        }
        assert!(!lock.is_locked());
        let _ = lock.lock();
        assert_eq!(lock.acquisitions(), 2);
        assert_eq!(unsafe { lock.devices.raw() }.waits.load(Ordering::Relaxed), 2);
    }
}

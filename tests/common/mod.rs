//! Mock collaborators for driving the syscall gate from the host.

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;
use std::sync::{Arc, Weak};

use sysgate::fs::{Console, FileSystem};
use sysgate::mm::testing::MockSpace;
use sysgate::mm::{PageFlags, PAGE_SIZE};
use sysgate::{Control, ExitSlot, Limits, Pid, Process, ProcessManager, Syscalls, TrapFrame};

/// Start of the test program's data pages (read/write).
pub const DATA: usize = 0x0804_8000;
/// Number of read/write data pages.
pub const DATA_PAGES: usize = 4;
/// A read-only page right after the data pages.
pub const RODATA: usize = DATA + DATA_PAGES * PAGE_SIZE;
/// The single stack page, just below the kernel boundary.
pub const STACK: usize = 0xBFFF_F000;
/// Where the harness places the syscall number.
pub const ESP: usize = STACK + PAGE_SIZE - 64;
/// Value preloaded into `eax` to detect untouched results.
pub const SENTINEL: u32 = 0xAAAA_AAAA;
/// First kernel address.
pub const KERNEL: usize = 0xC000_0000;

/// An open in-memory file.
#[derive(Debug)]
pub struct MemFile {
    data: Rc<RefCell<Vec<u8>>>,
    pos: usize,
}

#[derive(Debug, Default)]
pub struct MemFs {
    pub files: HashMap<String, Rc<RefCell<Vec<u8>>>>,
    pub opened: usize,
    pub closed: usize,
}

impl MemFs {
    pub fn contents(&self, name: &str) -> Option<Vec<u8>> {
        self.files.get(name).map(|data| data.borrow().clone())
    }
}

impl FileSystem for MemFs {
    type File = MemFile;

    fn create(&mut self, name: &str, initial_size: u32) -> bool {
        if name.is_empty() || self.files.contains_key(name) {
            return false;
        }
        let data = vec![0; initial_size as usize];
        self.files.insert(name.to_string(), Rc::new(RefCell::new(data)));
        true
    }

    fn remove(&mut self, name: &str) -> bool {
        self.files.remove(name).is_some()
    }

    fn open(&mut self, name: &str) -> Option<MemFile> {
        let data = self.files.get(name)?.clone();
        self.opened += 1;
        Some(MemFile { data, pos: 0 })
    }

    fn length(&mut self, file: &MemFile) -> i32 {
        file.data.borrow().len() as i32
    }

    fn read(&mut self, file: &mut MemFile, buf: &mut [u8]) -> i32 {
        let data = file.data.borrow();
        let count = buf.len().min(data.len().saturating_sub(file.pos));
        buf[..count].copy_from_slice(&data[file.pos..file.pos + count]);
        file.pos += count;
        count as i32
    }

    fn write(&mut self, file: &mut MemFile, buf: &[u8]) -> i32 {
        let mut data = file.data.borrow_mut();
        let end = file.pos + buf.len();
        if data.len() < end {
            data.resize(end, 0);
        }
        data[file.pos..end].copy_from_slice(buf);
        file.pos = end;
        buf.len() as i32
    }

    fn seek(&mut self, file: &mut MemFile, pos: u32) {
        file.pos = pos as usize;
    }

    fn tell(&mut self, file: &MemFile) -> u32 {
        file.pos as u32
    }

    fn close(&mut self, _file: MemFile) {
        self.closed += 1;
    }
}

/// Keyboard fed from a script; output captured per `putbuf` call.
#[derive(Debug, Default)]
pub struct ScriptedConsole {
    pub input: VecDeque<u8>,
    pub writes: Vec<Vec<u8>>,
}

impl ScriptedConsole {
    pub fn output(&self) -> String {
        String::from_utf8(self.writes.concat()).expect("console output is text")
    }
}

impl Console for ScriptedConsole {
    fn getc(&mut self) -> u8 {
        self.input.pop_front().expect("keyboard script exhausted")
    }

    fn putbuf(&mut self, buf: &[u8]) {
        self.writes.push(buf.to_vec());
    }
}

/// A spawned child as seen by the mock manager.
#[derive(Debug)]
pub struct Spawned {
    pub pid: Pid,
    pub cmd_line: String,
    pub link: Weak<ExitSlot>,
}

#[derive(Debug, Default)]
struct ManagerState {
    next_pid: i32,
    children: HashMap<Pid, Arc<ExitSlot>>,
    spawned: Vec<Spawned>,
}

/// Process manager that records exec requests and reaps through exit slots.
#[derive(Debug, Default)]
pub struct MockManager {
    state: RefCell<ManagerState>,
    /// Programs that fail to load.
    pub missing: Vec<String>,
}

impl MockManager {
    pub fn take_spawned(&self) -> Vec<Spawned> {
        std::mem::take(&mut self.state.borrow_mut().spawned)
    }
}

impl ProcessManager for MockManager {
    fn execute(&self, cmd_line: &str) -> Option<Pid> {
        let program = cmd_line.split_whitespace().next()?;
        if self.missing.iter().any(|m| m == program) {
            return None;
        }
        let mut state = self.state.borrow_mut();
        state.next_pid += 1;
        let pid = Pid(state.next_pid + 100);
        let (slot, link) = ExitSlot::linked();
        state.children.insert(pid, slot);
        state.spawned.push(Spawned { pid, cmd_line: cmd_line.to_string(), link });
        Some(pid)
    }

    fn wait(&self, pid: Pid) -> Option<i32> {
        // Children in these tests have always exited before the wait.
        let slot = self.state.borrow_mut().children.remove(&pid)?;
        slot.status()
    }
}

pub type Gate = Syscalls<MemFs, ScriptedConsole, MockManager>;

/// A gate plus one user process with data, read-only and stack pages.
pub struct Harness {
    pub gate: Gate,
    pub process: Process<MockSpace, MemFile>,
    cursor: usize,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_limits(Limits::DEFAULT)
    }

    pub fn with_limits(limits: Limits) -> Self {
        Self::build(limits, MockManager::default())
    }

    /// A harness whose process manager cannot load `programs`.
    pub fn with_missing(programs: &[&str]) -> Self {
        let manager = MockManager {
            missing: programs.iter().map(|p| p.to_string()).collect(),
            ..MockManager::default()
        };
        Self::build(Limits::DEFAULT, manager)
    }

    fn build(limits: Limits, manager: MockManager) -> Self {
        let gate = Syscalls::new(MemFs::default(), ScriptedConsole::default(), manager, limits);
        let process = Process::orphan("prog", Self::space(), &limits);
        Self { gate, process, cursor: DATA }
    }

    pub fn space() -> MockSpace {
        let mut space = MockSpace::default();
        space.map(DATA, DATA_PAGES, PageFlags::USER_RW);
        space.map(RODATA, 1, PageFlags::USER_RO);
        space.map(STACK, 1, PageFlags::USER_RW);
        space
    }

    /// Copy bytes into the data pages and return their address.
    pub fn put_bytes(&mut self, bytes: &[u8]) -> u32 {
        let addr = self.cursor;
        self.process.space_mut().poke(addr, bytes);
        self.cursor += bytes.len();
        addr as u32
    }

    /// Copy a NUL-terminated string into the data pages.
    pub fn put_str(&mut self, s: &str) -> u32 {
        let mut bytes = s.as_bytes().to_vec();
        bytes.push(0);
        self.put_bytes(&bytes)
    }

    /// Reserve a zeroed buffer in the data pages.
    pub fn buffer(&mut self, len: usize) -> u32 {
        self.put_bytes(&vec![0; len])
    }

    pub fn peek(&self, addr: u32, len: usize) -> Vec<u8> {
        self.process.space().peek(addr as usize, len)
    }

    /// Push `words` at the harness stack pointer and trap.
    pub fn call(&mut self, words: &[u32]) -> (Control, u32) {
        for (i, w) in words.iter().enumerate() {
            self.process.space_mut().poke(ESP + i * 4, &w.to_le_bytes());
        }
        self.trap(ESP as u32)
    }

    /// Trap with an arbitrary stack pointer.
    pub fn trap(&mut self, esp: u32) -> (Control, u32) {
        let mut frame = TrapFrame { esp, eax: SENTINEL };
        let control = self.gate.dispatch(&mut frame, &mut self.process);
        (control, frame.eax)
    }

    pub fn console_output(&self) -> String {
        self.gate.io().lock().console.output()
    }
}

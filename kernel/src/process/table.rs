//! The global process table: PID allocation and the `pid -> process*`
//! mapping a parent uses to reach its children by PID alone.

extern crate alloc;

use alloc::boxed::Box;
use alloc::collections::BTreeMap;
use alloc::string::String;

use spin::Mutex;

use super::pcb::{Pid, Process};
use crate::error::KernelError;
use crate::mm::AddressSpace;

/// Teaching-scale cap on live processes; real exhaustion of the PID space
/// (`u32`) is not a concern the workload needs to model, but implementations
/// SHOULD still detect and report exhaustion rather than overflow silently.
pub const MAX_PROCESSES: usize = 4096;

struct Inner {
    entries: BTreeMap<Pid, Box<Process>>,
    next_pid: u32,
}

/// A global lock for insert/lookup/remove, per the crate's shared-resource
/// policy.
pub struct ProcessTable {
    inner: Mutex<Inner>,
}

impl ProcessTable {
    pub const fn new() -> Self {
        Self {
            inner: Mutex::new(Inner {
                entries: BTreeMap::new(),
                next_pid: 1,
            }),
        }
    }

    /// Allocates a PID, constructs the process record, and inserts it.
    pub fn create_process(
        &self,
        name: String,
        address_space: AddressSpace,
        parent_pid: Option<Pid>,
    ) -> Result<Pid, KernelError> {
        let mut inner = self.inner.lock();

        if inner.entries.len() >= MAX_PROCESSES || inner.next_pid == 0 {
            return Err(KernelError::TableFull);
        }

        let pid = Pid(inner.next_pid);
        inner.next_pid += 1;

        let process = Box::new(Process::new(pid, name, address_space, parent_pid));
        inner.entries.insert(pid, process);
        Ok(pid)
    }

    /// Looks up a process by PID.
    ///
    /// Returns a `'static` reference by extending the lifetime past the
    /// lock guard.
    pub fn get(&self, pid: Pid) -> Option<&'static Process> {
        let inner = self.inner.lock();
        inner.entries.get(&pid).map(|boxed| {
            // SAFETY: `boxed` lives in a `Box` stored in a `BTreeMap` guarded
            // by `self.inner`; its heap address is stable (BTreeMap moves
            // nodes, never the boxed value's pointee) for as long as the
            // entry remains in the map. Processes are removed only via
            // `remove`, never relocated, so this reference stays valid for
            // the lifetime of the process.
            unsafe { &*(boxed.as_ref() as *const Process) }
        })
    }

    /// Removes and returns a process, destroying its slot in the table.
    pub fn remove(&self, pid: Pid) -> Option<Box<Process>> {
        self.inner.lock().entries.remove(&pid)
    }

    pub fn exists(&self, pid: Pid) -> bool {
        self.inner.lock().entries.contains_key(&pid)
    }

    /// Cheap pre-check used by `fork` to avoid copying an address space it
    /// would just have to tear down again. Teaching-scale only: there is a
    /// narrow window between this check and the eventual `create_process`
    /// call where a concurrent fork could still observe `TableFull` from
    /// `create_process` itself, which remains the authoritative check.
    pub fn is_full(&self) -> bool {
        self.inner.lock().entries.len() >= MAX_PROCESSES
    }

    pub fn count(&self) -> usize {
        self.inner.lock().entries.len()
    }
}

impl Default for ProcessTable {
    fn default() -> Self {
        Self::new()
    }
}

/// The global process table instance.
pub static PROCESS_TABLE: ProcessTable = ProcessTable::new();

/// Initializes the process table. Processes may not be created before this
/// runs (see the crate's boot-order design notes).
pub fn init() {
    log::info!("process table initialized");
}

pub fn get(pid: Pid) -> Option<&'static Process> {
    PROCESS_TABLE.get(pid)
}

#[cfg(feature = "alloc")]
pub fn remove(pid: Pid) -> Option<Box<Process>> {
    PROCESS_TABLE.remove(pid)
}

pub fn process_exists(pid: Pid) -> bool {
    PROCESS_TABLE.exists(pid)
}

pub fn process_count() -> usize {
    PROCESS_TABLE.count()
}

//! The process control block.

extern crate alloc;

use alloc::string::String;

use super::sync::{CondVar, Mutex};
use crate::list::IntList;
use crate::mm::AddressSpace;

/// A process identifier. PIDs are positive integers assigned from a
/// monotonic counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pid(pub u32);

/// Encodes an 8-bit exit code using the standard "exited normally"
/// encoding: low byte = code, remaining bits zero.
pub fn encode_exit_status(code: u8) -> i32 {
    code as i32
}

struct ExitState {
    zombie: bool,
    exit_status: i32,
}

/// A process: its address space, its parent/child relation, and the
/// zombie-rendezvous bookkeeping `_exit`/`waitpid` coordinate over.
///
/// `parent_pid` and `exit_state` are each guarded by their own lock (never
/// one combined lock) because a parent reparenting this process and this
/// process racing through `_exit` must be able to proceed independently;
/// see the lock-ordering discipline in `process::exit`.
pub struct Process {
    pub pid: Pid,
    pub name: String,
    pub address_space: Mutex<Option<AddressSpace>>,
    parent_pid: Mutex<Option<Pid>>,
    pub children: Mutex<IntList>,
    exit_state: Mutex<ExitState>,
    exit_cv: CondVar,
}

impl Process {
    pub fn new(
        pid: Pid,
        name: String,
        address_space: AddressSpace,
        parent_pid: Option<Pid>,
    ) -> Self {
        Self {
            pid,
            name,
            address_space: Mutex::new(Some(address_space)),
            parent_pid: Mutex::new(parent_pid),
            children: Mutex::new(IntList::new()),
            exit_state: Mutex::new(ExitState {
                zombie: false,
                exit_status: 0,
            }),
            exit_cv: CondVar::new(),
        }
    }

    pub fn parent_pid(&self) -> Option<Pid> {
        *self.parent_pid.lock()
    }

    pub fn set_parent_pid(&self, parent: Option<Pid>) {
        *self.parent_pid.lock() = parent;
    }

    pub fn is_zombie(&self) -> bool {
        self.exit_state.lock().zombie
    }

    pub fn exit_status(&self) -> i32 {
        self.exit_state.lock().exit_status
    }

    /// Marks the process a zombie with the given encoded status and wakes
    /// any parent blocked in `waitpid`.
    pub fn mark_zombie(&self, exit_status: i32) {
        let mut state = self.exit_state.lock();
        state.zombie = true;
        state.exit_status = exit_status;
        drop(state);
        self.exit_cv.signal();
    }

    /// Blocks the calling thread until this process is a zombie, then
    /// returns its encoded exit status.
    pub fn wait_for_exit(&self) -> i32 {
        let mut state = self.exit_state.lock();
        while !state.zombie {
            state = self.exit_cv.wait(state);
        }
        state.exit_status
    }

    /// `_exit`'s final decision: under this process's own parent-pid lock,
    /// self-destruct if orphaned, otherwise become a zombie and wake any
    /// parent blocked in `waitpid`. Holding `parent_pid`'s lock across the
    /// `exit_state` mutation keeps the two in lockstep with a concurrent
    /// parent that might be orphaning us at the same moment (lock order:
    /// this process's own parent_lock, then its own exit_lock).
    pub fn finish_exit(&self, exit_status: i32) -> ExitFate {
        let parent = self.parent_pid.lock();
        if parent.is_none() {
            ExitFate::SelfDestruct
        } else {
            let mut state = self.exit_state.lock();
            state.zombie = true;
            state.exit_status = exit_status;
            drop(state);
            drop(parent);
            self.exit_cv.signal();
            ExitFate::Zombie
        }
    }
}

/// The outcome of [`Process::finish_exit`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitFate {
    /// The process had no parent (already orphaned); it destroys itself.
    SelfDestruct,
    /// The process is now a zombie awaiting `waitpid`.
    Zombie,
}

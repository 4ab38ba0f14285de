//! `_exit`: tears down the calling process's address space, then runs the
//! zombie/reparenting policy from spec.md §4.E.

extern crate alloc;

use alloc::vec::Vec;

use super::pcb::{encode_exit_status, ExitFate, Pid, Process};
use super::table::PROCESS_TABLE;
use crate::hal::Platform;
use crate::mm::frame_allocator::FrameAllocator;

/// Terminates the process named by `pid` with the given 8-bit exit code.
///
/// Thread detachment (the scheduler side of `_exit`) is out of scope; the
/// caller is responsible for having already stopped running the exiting
/// thread. This function performs, in order:
/// 1. Destroy the process's address space.
/// 2. Walk its own children: destroy already-zombie ones, orphan the rest.
/// 3. Decide its own fate under its own parent-pid lock.
///
/// A no-op if `pid` does not name a live process (already exited, or never
/// existed — a kernel bug either way, but not this function's to diagnose).
pub fn exit_process<P: Platform>(pid: Pid, code: u8, fa: &FrameAllocator<P>) {
    let Some(process) = PROCESS_TABLE.get(pid) else {
        log::warn!("exit_process: {:?} is not in the process table", pid);
        return;
    };

    if let Some(mut as_) = process.address_space.lock().take() {
        as_.destroy(fa);
    }

    reap_and_orphan_children(process);

    let status = encode_exit_status(code);
    match process.finish_exit(status) {
        ExitFate::SelfDestruct => {
            PROCESS_TABLE.remove(pid);
        }
        ExitFate::Zombie => {
            log::info!("{:?} is now a zombie (status {status})", pid);
        }
    }
}

/// Implements spec.md §4.E's children-walk exactly: for each child
/// currently a zombie, destroy and unlink it; for each live child, orphan
/// it by clearing its `parent_pid`. Acquiring each child's own parent-pid
/// lock here (via `set_parent_pid`) is the "child's parent_lock" step of
/// the documented lock order (process_table → child's parent_lock → child's
/// exit_lock); this function never also holds the child's exit_lock at the
/// same time, so no ordering violation is possible.
fn reap_and_orphan_children(process: &Process) {
    let child_pids: Vec<u32> = process.children.lock().iter().collect();

    for raw_pid in child_pids {
        let child_pid = Pid(raw_pid);
        let Some(child) = PROCESS_TABLE.get(child_pid) else {
            continue;
        };

        if child.is_zombie() {
            PROCESS_TABLE.remove(child_pid);
        } else {
            child.set_parent_pid(None);
        }
    }

    // Every child we had is now either destroyed or orphaned; none still
    // names us as `parent_pid`, so our own children list is now vacuous.
    *process.children.lock() = crate::list::IntList::new();
}

//! `waitpid`: blocks a parent until a specific child becomes a zombie, then
//! reaps it.

use super::pcb::{Pid, Process};
use super::table::PROCESS_TABLE;
use crate::error::KernelError;

/// Waits for `child_pid`, a child of `parent`, to exit.
///
/// `options` must be `0` (spec.md §4.F); any other value is rejected before
/// the child lookup even happens. Waiting on a PID that is not currently a
/// live child of `parent` is undefined by the teaching workload; this
/// implementation chooses to return an error rather than block forever.
pub fn waitpid(parent: &Process, child_pid: Pid, options: u32) -> Result<(Pid, i32), KernelError> {
    if options != 0 {
        return Err(KernelError::InvalidArgument { name: "options" });
    }

    if !parent.children.lock().contains(child_pid.0) {
        return Err(KernelError::InvalidArgument { name: "pid" });
    }

    let Some(child) = PROCESS_TABLE.get(child_pid) else {
        return Err(KernelError::InvalidArgument { name: "pid" });
    };

    // Blocks on the child's exit_cv if it has not already exited; returns
    // immediately if it's already a zombie.
    let status = child.wait_for_exit();

    PROCESS_TABLE.remove(child_pid);
    parent.children.lock().remove(child_pid.0);

    Ok((child_pid, status))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hal::mock::MockPlatform;
    use crate::mm::frame_allocator::FrameAllocator;
    use crate::mm::{AddressSpace, PAGE_SIZE};
    use alloc::string::String;

    extern crate alloc;

    fn booted_fa() -> FrameAllocator<MockPlatform> {
        let fa = FrameAllocator::new(MockPlatform::new(256, 16));
        fa.vm_bootstrap();
        fa
    }

    fn spawn(name: &str, parent: Option<Pid>, fa: &FrameAllocator<MockPlatform>) -> Pid {
        let mut asp = AddressSpace::create();
        asp.define_region(0x1000, PAGE_SIZE, true, true, false).unwrap();
        asp.prepare_load(fa).unwrap();
        PROCESS_TABLE
            .create_process(String::from(name), asp, parent)
            .unwrap()
    }

    #[test]
    fn waitpid_rejects_nonzero_options() {
        let fa = booted_fa();
        let parent_pid = spawn("p", None, &fa);
        let child_pid = spawn("c", Some(parent_pid), &fa);
        let parent = PROCESS_TABLE.get(parent_pid).unwrap();
        parent.children.lock().add(child_pid.0);

        assert_eq!(
            waitpid(parent, child_pid, 1),
            Err(KernelError::InvalidArgument { name: "options" })
        );

        PROCESS_TABLE.remove(child_pid);
        PROCESS_TABLE.remove(parent_pid);
    }

    #[test]
    fn waitpid_rejects_a_pid_that_is_not_a_child() {
        let fa = booted_fa();
        let parent_pid = spawn("p2", None, &fa);
        let stranger_pid = spawn("stranger", None, &fa);
        let parent = PROCESS_TABLE.get(parent_pid).unwrap();

        assert_eq!(
            waitpid(parent, stranger_pid, 0),
            Err(KernelError::InvalidArgument { name: "pid" })
        );

        PROCESS_TABLE.remove(stranger_pid);
        PROCESS_TABLE.remove(parent_pid);
    }

    #[test]
    fn s3_waitpid_returns_the_already_exited_childs_status() {
        let fa = booted_fa();
        let parent_pid = spawn("p3", None, &fa);
        let child_pid = spawn("c3", Some(parent_pid), &fa);
        let parent = PROCESS_TABLE.get(parent_pid).unwrap();
        parent.children.lock().add(child_pid.0);

        PROCESS_TABLE.get(child_pid).unwrap().mark_zombie(42);

        let (reaped_pid, status) = waitpid(parent, child_pid, 0).unwrap();
        assert_eq!(reaped_pid, child_pid);
        assert_eq!(status & 0xff, 42);
        assert!(!PROCESS_TABLE.exists(child_pid));
        assert!(!parent.children.lock().contains(child_pid.0));

        PROCESS_TABLE.remove(parent_pid);
    }
}

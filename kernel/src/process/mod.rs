//! Process lifecycle: control blocks, the global process table, and the
//! fork/execv/_exit/waitpid/getpid syscall bodies.

pub mod exec;
pub mod exit;
pub mod fork;
pub mod pcb;
pub mod sync;
pub mod table;
pub mod wait;

pub use pcb::{encode_exit_status, Pid, Process};
pub use table::PROCESS_TABLE;

/// The PID of the very first process, created directly by the bootstrap
/// sequence rather than via `fork`. It has no parent.
pub const INIT_PID: Pid = Pid(1);

/// Returns the calling process's own PID.
///
/// In the absence of a scheduler this crate does not implement, "the calling
/// process" is threaded through explicitly wherever this would otherwise
/// read a per-CPU current-process pointer; see each syscall's doc comment.
pub fn getpid(current: Pid) -> Pid {
    current
}

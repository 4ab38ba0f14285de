//! Kernel error types.
//!
//! Every fallible operation in this crate returns a [`KernelError`] instead
//! of a string literal, so callers can match on the failure kind instead of
//! parsing messages.

use core::fmt;

/// Main kernel error type.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[must_use = "kernel errors must be handled, not silently discarded"]
pub enum KernelError {
    /// The frame allocator (or a heap built on it) has no room left.
    OutOfMemory { requested: usize },
    /// A user-supplied or faulting virtual address does not resolve to any
    /// mapped region.
    BadAddress { addr: u32 },
    /// A syscall argument violates its contract (e.g. `waitpid` options != 0).
    InvalidArgument { name: &'static str },
    /// `execv`'s program file lookup failed.
    FileNotFound,
    /// A write faulted against the text region after `complete_load`.
    ReadOnlyText,
    /// The process table has no room for a new PID.
    TableFull,
    /// A third `define_region` call, or any other operation this teaching
    /// kernel deliberately does not support.
    Unsupported,
    /// An internal invariant was violated. These are never returned to
    /// userspace; callers that observe one should panic rather than recover.
    InvalidState {
        expected: &'static str,
        actual: &'static str,
    },
}

/// Result type alias for kernel operations.
pub type KernelResult<T> = Result<T, KernelError>;

impl fmt::Display for KernelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::OutOfMemory { requested } => {
                write!(f, "out of memory: requested {requested} pages")
            }
            Self::BadAddress { addr } => write!(f, "bad address: {addr:#010x}"),
            Self::InvalidArgument { name } => write!(f, "invalid argument: {name}"),
            Self::FileNotFound => write!(f, "file not found"),
            Self::ReadOnlyText => write!(f, "read-only text segment"),
            Self::TableFull => write!(f, "table full"),
            Self::Unsupported => write!(f, "unsupported operation"),
            Self::InvalidState { expected, actual } => {
                write!(f, "invalid state: expected {expected}, got {actual}")
            }
        }
    }
}

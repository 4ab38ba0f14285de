//! dumbvm-kernel: the core kernel subsystems of a small teaching operating
//! system for a 32-bit MIPS-like machine.
//!
//! Three subsystems live here: the virtual-memory manager ([`mm`] — a
//! physical frame allocator, per-address-space page tables, and a
//! software-refilled TLB fault handler), the process lifecycle and
//! system-call surface ([`process`] — `fork`/`execv`/`_exit`/`waitpid`/
//! `getpid`), and a concurrency-control exemplar ([`intersection`] — a
//! four-way intersection coordinator). The ELF loader, VFS, trap
//! dispatcher, CPU bootstrap, lock/condvar *implementations*, kernel heap,
//! and console driver are all out of scope; [`hal::Platform`] is the seam
//! they would plug into, and [`hal::mock::MockPlatform`] is what lets every
//! algorithm in this crate run as an ordinary `#[test]`.

#![cfg_attr(target_os = "none", no_std)]
#![cfg_attr(target_os = "none", feature(alloc_error_handler))]

#[cfg(feature = "alloc")]
extern crate alloc;

// Bare-metal MIPS target: a real heap, grown by the out-of-scope kernel
// heap subsystem. Host target: the system allocator, so ordinary test code
// using `Vec`/`String`/`Box` compiles and runs without a bare-metal boot.
#[cfg(all(target_arch = "mips", target_os = "none"))]
use linked_list_allocator::LockedHeap;

#[cfg(all(target_arch = "mips", target_os = "none"))]
#[global_allocator]
static ALLOCATOR: LockedHeap = LockedHeap::empty();

#[cfg(not(target_os = "none"))]
extern crate std;

#[cfg(not(target_os = "none"))]
#[global_allocator]
static SYSTEM_ALLOCATOR: std::alloc::System = std::alloc::System;

#[macro_use]
pub mod print;

pub mod bootstrap;
pub mod error;
pub mod hal;
pub mod intersection;
pub mod list;
pub mod log_service;
pub mod mm;
pub mod process;

pub use error::{KernelError, KernelResult};
pub use list::IntList;
pub use mm::{AddressSpace, FrameAllocator, PAGE_SIZE, STACK_PAGES, USERSTACK};
pub use process::{getpid, Pid, Process, INIT_PID, PROCESS_TABLE};

/// Heap allocation failure in a `no_std` kernel is unrecoverable; the
/// `alloc_error_handler` ABI requires diverging.
#[cfg(all(target_arch = "mips", target_os = "none"))]
#[alloc_error_handler]
fn alloc_error_handler(layout: core::alloc::Layout) -> ! {
    panic!("kernel allocation failure: {layout:?}");
}

#[cfg(all(target_os = "none", not(test)))]
#[panic_handler]
fn panic(info: &core::panic::PanicInfo) -> ! {
    log::error!("kernel panic: {info}");
    loop {
        core::hint::spin_loop();
    }
}

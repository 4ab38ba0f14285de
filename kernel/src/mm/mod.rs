//! Virtual memory: the physical frame allocator, per-process address
//! spaces, and the software TLB fault handler.

pub mod address_space;
pub mod frame_allocator;
pub mod tlb;

/// Frame/page size on the target machine.
pub const PAGE_SIZE: usize = 4096;

/// Fixed user-stack size, in pages, for every address space.
pub const STACK_PAGES: usize = 12;

/// Top of the user address space; the stack grows downward from here.
pub const USERSTACK: crate::hal::VirtAddr = 0x8000_0000;

pub use address_space::AddressSpace;
pub use frame_allocator::FrameAllocator;

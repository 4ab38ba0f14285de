//! Hardware abstraction boundary.
//!
//! Everything reached through this trait is explicitly out of scope for this
//! crate: the firmware's memory probe, the MIPS coprocessor-0 TLB registers,
//! and the interrupt-priority-level machinery (`splhigh`/`splx`). A real port
//! fills in [`Platform`] for actual MIPS hardware; [`mock::MockPlatform`] is
//! the implementation this crate's own test suite drives, giving every
//! frame-allocator/address-space/TLB algorithm a host to run on.

pub mod mips;
pub mod mock;

use crate::mm::PAGE_SIZE;

/// A physical address as handed back by the firmware.
pub type PhysAddr = u64;

/// A 32-bit user virtual address (this is a 32-bit machine).
pub type VirtAddr = u32;

bitflags::bitflags! {
    /// TLB entry-lo flag bits.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct TlbFlags: u32 {
        const DIRTY = 1 << 10;
        const VALID = 1 << 9;
    }
}

/// One TLB slot: a (virtual-page, physical-frame|flags) pair, MIPS-style.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TlbEntry {
    pub entry_hi: VirtAddr,
    pub entry_lo: u32,
}

impl TlbEntry {
    pub const INVALID: TlbEntry = TlbEntry {
        entry_hi: 0,
        entry_lo: 0,
    };

    pub fn valid(&self) -> bool {
        self.entry_lo & TlbFlags::VALID.bits() != 0
    }

    pub fn frame(&self) -> u32 {
        self.entry_lo & !(TlbFlags::DIRTY.bits() | TlbFlags::VALID.bits())
    }
}

/// The firmware/hardware services this kernel consumes but does not
/// implement: RAM discovery, the TLB, and interrupt masking.
pub trait Platform: Send + Sync {
    /// Free physical range `[low, high)` available at boot.
    fn ram_getsize(&self) -> (PhysAddr, PhysAddr);

    /// Bump-allocates `npages` contiguous frames directly from firmware RAM,
    /// before the coremap exists. Returns physical address 0 on exhaustion.
    fn ram_stealmem(&self, npages: usize) -> PhysAddr;

    fn num_tlb_entries(&self) -> usize;
    fn tlb_read(&self, index: usize) -> TlbEntry;
    fn tlb_write(&self, index: usize, entry: TlbEntry);
    fn tlb_random(&self, entry: TlbEntry);

    /// Runs `f` with interrupts disabled on this CPU, matching
    /// `splhigh`/`splx`.
    fn with_interrupts_disabled(&self, f: &mut dyn FnMut());

    fn zero_frame(&self, paddr: PhysAddr);
    fn copy_frame(&self, dst: PhysAddr, src: PhysAddr);
    fn read_frame(&self, paddr: PhysAddr, out: &mut [u8; PAGE_SIZE]);
    fn write_frame(&self, paddr: PhysAddr, data: &[u8; PAGE_SIZE]);

    /// Single-byte physical access, for building the initial user stack in
    /// `execv` (arbitrary, non-page-aligned offsets within a mapped page).
    fn read_u8(&self, paddr: PhysAddr) -> u8;
    fn write_u8(&self, paddr: PhysAddr, value: u8);
}

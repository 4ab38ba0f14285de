//! Bare-metal [`Platform`](super::Platform) for the real MIPS machine.
//!
//! CPU bootstrap and the coprocessor-0 register access this would wrap are
//! out of scope for this crate (see the crate-level purpose statement); this
//! stub exists so the hardware seam type-checks end to end. A real port
//! replaces every method body with the corresponding `mfc0`/`mtc0`/`tlbwi`
//! sequence.

use super::{PhysAddr, Platform, TlbEntry};
use crate::mm::PAGE_SIZE;

pub struct MipsPlatform;

impl Platform for MipsPlatform {
    fn ram_getsize(&self) -> (PhysAddr, PhysAddr) {
        unimplemented!("MIPS firmware RAM probe is out of scope")
    }

    fn ram_stealmem(&self, _npages: usize) -> PhysAddr {
        unimplemented!("MIPS firmware bump allocator is out of scope")
    }

    fn num_tlb_entries(&self) -> usize {
        unimplemented!("MIPS coprocessor-0 access is out of scope")
    }

    fn tlb_read(&self, _index: usize) -> TlbEntry {
        unimplemented!("MIPS coprocessor-0 access is out of scope")
    }

    fn tlb_write(&self, _index: usize, _entry: TlbEntry) {
        unimplemented!("MIPS coprocessor-0 access is out of scope")
    }

    fn tlb_random(&self, _entry: TlbEntry) {
        unimplemented!("MIPS coprocessor-0 access is out of scope")
    }

    fn with_interrupts_disabled(&self, _f: &mut dyn FnMut()) {
        unimplemented!("MIPS splhigh/splx is out of scope")
    }

    fn zero_frame(&self, _paddr: PhysAddr) {
        unimplemented!("direct physical memory access is out of scope")
    }

    fn copy_frame(&self, _dst: PhysAddr, _src: PhysAddr) {
        unimplemented!("direct physical memory access is out of scope")
    }

    fn read_frame(&self, _paddr: PhysAddr, _out: &mut [u8; PAGE_SIZE]) {
        unimplemented!("direct physical memory access is out of scope")
    }

    fn write_frame(&self, _paddr: PhysAddr, _data: &[u8; PAGE_SIZE]) {
        unimplemented!("direct physical memory access is out of scope")
    }

    fn read_u8(&self, _paddr: PhysAddr) -> u8 {
        unimplemented!("direct physical memory access is out of scope")
    }

    fn write_u8(&self, _paddr: PhysAddr, _value: u8) {
        unimplemented!("direct physical memory access is out of scope")
    }
}

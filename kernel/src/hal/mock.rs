//! Host-backed [`Platform`](super::Platform) used by this crate's own test
//! suite: a simulated RAM arena plus a simulated TLB array, standing in for
//! real firmware and coprocessor-0 registers.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;
use spin::Mutex;

use super::{PhysAddr, Platform, TlbEntry};
use crate::mm::PAGE_SIZE;

/// A simulated physical address space backed by a host `Vec<u8>`, with a
/// simulated fixed-size TLB.
pub struct MockPlatform {
    ram: Mutex<Vec<u8>>,
    low: PhysAddr,
    high: PhysAddr,
    stolen: Mutex<PhysAddr>,
    tlb: Mutex<Vec<TlbEntry>>,
}

impl MockPlatform {
    /// Builds a mock platform with `num_pages` of simulated RAM and
    /// `num_tlb` TLB slots (16 is the real MIPS r3000 count).
    pub fn new(num_pages: usize, num_tlb: usize) -> Self {
        let bytes = num_pages * PAGE_SIZE;
        Self {
            ram: Mutex::new(vec![0u8; bytes]),
            low: 0,
            high: bytes as PhysAddr,
            stolen: Mutex::new(0),
            tlb: Mutex::new(vec![TlbEntry::INVALID; num_tlb]),
        }
    }

    fn offset(&self, paddr: PhysAddr) -> usize {
        (paddr - self.low) as usize
    }
}

impl Platform for MockPlatform {
    fn ram_getsize(&self) -> (PhysAddr, PhysAddr) {
        let stolen = *self.stolen.lock();
        (self.low + stolen, self.high)
    }

    fn ram_stealmem(&self, npages: usize) -> PhysAddr {
        let mut stolen = self.stolen.lock();
        let want = npages as PhysAddr * PAGE_SIZE as PhysAddr;
        if *stolen + want > self.high - self.low {
            return 0;
        }
        let addr = self.low + *stolen;
        *stolen += want;
        addr
    }

    fn num_tlb_entries(&self) -> usize {
        self.tlb.lock().len()
    }

    fn tlb_read(&self, index: usize) -> TlbEntry {
        self.tlb.lock()[index]
    }

    fn tlb_write(&self, index: usize, entry: TlbEntry) {
        self.tlb.lock()[index] = entry;
    }

    fn tlb_random(&self, entry: TlbEntry) {
        // No real randomness needed for the teaching workload: overwrite
        // slot 0, matching "some hardware-chosen slot" closely enough for
        // every property this crate tests (none depend on which slot is
        // picked once all slots are valid).
        self.tlb.lock()[0] = entry;
    }

    fn with_interrupts_disabled(&self, f: &mut dyn FnMut()) {
        f();
    }

    fn zero_frame(&self, paddr: PhysAddr) {
        let off = self.offset(paddr);
        self.ram.lock()[off..off + PAGE_SIZE].fill(0);
    }

    fn copy_frame(&self, dst: PhysAddr, src: PhysAddr) {
        let (doff, soff) = (self.offset(dst), self.offset(src));
        let mut ram = self.ram.lock();
        let mut buf = [0u8; PAGE_SIZE];
        buf.copy_from_slice(&ram[soff..soff + PAGE_SIZE]);
        ram[doff..doff + PAGE_SIZE].copy_from_slice(&buf);
    }

    fn read_frame(&self, paddr: PhysAddr, out: &mut [u8; PAGE_SIZE]) {
        let off = self.offset(paddr);
        out.copy_from_slice(&self.ram.lock()[off..off + PAGE_SIZE]);
    }

    fn write_frame(&self, paddr: PhysAddr, data: &[u8; PAGE_SIZE]) {
        let off = self.offset(paddr);
        self.ram.lock()[off..off + PAGE_SIZE].copy_from_slice(data);
    }

    fn read_u8(&self, paddr: PhysAddr) -> u8 {
        self.ram.lock()[self.offset(paddr)]
    }

    fn write_u8(&self, paddr: PhysAddr, value: u8) {
        let off = self.offset(paddr);
        self.ram.lock()[off] = value;
    }
}

//! Physical frame allocator (coremap).
//!
//! Owns every post-boot frame of RAM and hands out contiguous runs to
//! address-space construction. Scans are linear first-fit; teaching-scale
//! memory sizes make this acceptable (see the crate's design notes on
//! replacing this with a free-run skiplist or buddy allocator at larger
//! scale — the external contract would not change).

extern crate alloc;

use alloc::vec::Vec;
use spin::Mutex;

use super::PAGE_SIZE;
use crate::hal::{PhysAddr, Platform};

/// One entry per managed frame. `run_length` is meaningful only on the first
/// frame of an allocated run; it is always 1 on a free frame.
#[derive(Debug, Clone, Copy)]
struct CoremapEntry {
    free: bool,
    base: PhysAddr,
    run_length: usize,
}

struct Coremap {
    entries: Vec<CoremapEntry>,
}

impl Coremap {
    /// Linear first-fit scan for `npages` consecutive free entries.
    fn alloc(&mut self, npages: usize) -> PhysAddr {
        let mut i = 0;
        while i + npages <= self.entries.len() {
            let window_free = self.entries[i..i + npages].iter().all(|e| e.free);
            if window_free {
                for entry in &mut self.entries[i..i + npages] {
                    entry.free = false;
                }
                self.entries[i].run_length = npages;
                return self.entries[i].base;
            }
            i += 1;
        }
        0
    }

    /// Frees the run starting at physical address `base`. A no-op if `base`
    /// is not a managed run-start, or if the run is already free (guards
    /// against double-free).
    fn free(&mut self, base: PhysAddr) {
        let Some(start) = self.entries.iter().position(|e| e.base == base) else {
            return;
        };
        if self.entries[start].free {
            return;
        }
        let k = self.entries[start].run_length;
        for entry in &mut self.entries[start..start + k] {
            entry.free = true;
            entry.run_length = 1;
        }
    }

    fn entry_at(&self, base: PhysAddr) -> Option<&CoremapEntry> {
        self.entries.iter().find(|e| e.base == base)
    }
}

enum State {
    /// Before `vm_bootstrap`: every allocation falls back to the firmware's
    /// monotonic bump allocator.
    PreBoot,
    Ready(Coremap),
}

/// The global physical frame allocator. One global spinlock (the `Mutex`
/// below) covers both allocate and free, matching the teaching kernel's
/// concurrency policy.
pub struct FrameAllocator<P: Platform> {
    state: Mutex<State>,
    platform: P,
}

impl<P: Platform> FrameAllocator<P> {
    pub const fn new(platform: P) -> Self {
        Self {
            state: Mutex::new(State::PreBoot),
            platform,
        }
    }

    pub fn platform(&self) -> &P {
        &self.platform
    }

    pub fn is_ready(&self) -> bool {
        matches!(*self.state.lock(), State::Ready(_))
    }

    /// Queries the firmware for free RAM, reserves a prefix for the coremap
    /// array (shrinking the frame count until that prefix fits in a single
    /// page), and marks every remaining frame free.
    pub fn vm_bootstrap(&self) {
        let (low, high) = self.platform.ram_getsize();
        let mut n = ((high - low) / PAGE_SIZE as PhysAddr) as usize;

        let entry_size = core::mem::size_of::<CoremapEntry>();
        let mut core_size = n * entry_size;
        while core_size > PAGE_SIZE {
            n -= 1;
            core_size -= entry_size;
        }

        let frame_base = round_up(low + core_size as PhysAddr, PAGE_SIZE as PhysAddr);

        let mut entries = Vec::with_capacity(n);
        for i in 0..n {
            entries.push(CoremapEntry {
                free: true,
                base: frame_base + i as PhysAddr * PAGE_SIZE as PhysAddr,
                run_length: 1,
            });
        }

        *self.state.lock() = State::Ready(Coremap { entries });
    }

    /// Allocates `npages` contiguous frames. Returns physical address 0 on
    /// exhaustion (the caller surfaces this as out-of-memory).
    pub fn alloc(&self, npages: usize) -> PhysAddr {
        assert!(npages >= 1);
        let mut state = self.state.lock();
        match &mut *state {
            State::Ready(coremap) => coremap.alloc(npages),
            State::PreBoot => self.platform.ram_stealmem(npages),
        }
    }

    /// Frees a run previously returned by `alloc`. Addresses outside the
    /// managed range, or not at a run start, are silently ignored.
    pub fn free(&self, paddr: PhysAddr) {
        let mut state = self.state.lock();
        if let State::Ready(coremap) = &mut *state {
            coremap.free(paddr);
        }
    }

    /// Test/invariant accessor: the run length recorded at `base`, if `base`
    /// currently names a non-free run start.
    pub fn run_length_at(&self, base: PhysAddr) -> Option<usize> {
        let state = self.state.lock();
        match &*state {
            State::Ready(coremap) => coremap
                .entry_at(base)
                .filter(|e| !e.free)
                .map(|e| e.run_length),
            State::PreBoot => None,
        }
    }

    /// Test/invariant accessor: whether the frame at `base` is marked free.
    pub fn is_free(&self, base: PhysAddr) -> Option<bool> {
        let state = self.state.lock();
        match &*state {
            State::Ready(coremap) => coremap.entry_at(base).map(|e| e.free),
            State::PreBoot => None,
        }
    }
}

fn round_up(addr: PhysAddr, align: PhysAddr) -> PhysAddr {
    (addr + align - 1) & !(align - 1)
}

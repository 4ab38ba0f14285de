//! Per-process address spaces: two program regions (text/data) plus a
//! fixed-size user stack, each backed by a flat per-region page table.
//!
//! There is no demand paging, swapping, copy-on-write, or page sharing
//! between address spaces in this teaching kernel — every region is fully
//! populated by [`AddressSpace::prepare_load`] before `complete_load`, and
//! every frame is exclusively owned by the address space that allocated it.

extern crate alloc;

use alloc::vec;
use alloc::vec::Vec;

use super::frame_allocator::FrameAllocator;
use super::{PAGE_SIZE, STACK_PAGES, USERSTACK};
use crate::error::KernelError;
use crate::hal::{PhysAddr, Platform, TlbEntry, TlbFlags, VirtAddr};

/// Read/write/execute permission bits for a region.
#[derive(Debug, Clone, Copy, Default)]
pub struct Permissions {
    pub readable: bool,
    pub writable: bool,
    pub executable: bool,
}

/// A region's flat page table: one physical frame number per page offset.
/// A zero frame number means "not yet mapped".
pub struct PageTable {
    pub vbase: VirtAddr,
    pub npages: usize,
    pub perms: Permissions,
    frames: Vec<PhysAddr>,
}

impl PageTable {
    fn new(vbase: VirtAddr, npages: usize, perms: Permissions) -> Self {
        Self {
            vbase,
            npages,
            perms,
            frames: vec![0; npages],
        }
    }

    fn contains(&self, vaddr: VirtAddr) -> bool {
        let top = self.vbase as u64 + self.npages as u64 * PAGE_SIZE as u64;
        (vaddr as u64) >= self.vbase as u64 && (vaddr as u64) < top
    }

    /// Translates `vaddr` (already known to fall within this region) to its
    /// physical frame base. Panics if the page is unmapped — callers must
    /// only call this after `prepare_load` has populated every entry.
    fn frame_for(&self, vaddr: VirtAddr) -> PhysAddr {
        let index = (vaddr - self.vbase) as usize / PAGE_SIZE;
        self.frames[index]
    }
}

/// Which region of an address space a faulting address fell in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Region {
    Text,
    Data,
    Stack,
}

/// A process's virtual memory: two program regions plus a fixed-size stack.
pub struct AddressSpace {
    pub region1: Option<PageTable>,
    pub region2: Option<PageTable>,
    pub stack: PageTable,
    /// Distinguishes pre-ELF-load state (writes allowed everywhere) from
    /// post-load state (the text region is enforced read-only in the TLB).
    pub load_completed: bool,
}

impl AddressSpace {
    /// Allocates an address-space record with all fields zeroed.
    pub fn create() -> Self {
        Self {
            region1: None,
            region2: None,
            stack: PageTable::new(
                USERSTACK - (STACK_PAGES * PAGE_SIZE) as VirtAddr,
                STACK_PAGES,
                Permissions {
                    readable: true,
                    writable: true,
                    executable: false,
                },
            ),
            load_completed: false,
        }
    }

    /// Fills the first empty region slot. A third call fails with
    /// [`KernelError::Unsupported`].
    pub fn define_region(
        &mut self,
        vaddr: VirtAddr,
        size: usize,
        readable: bool,
        writable: bool,
        executable: bool,
    ) -> Result<(), KernelError> {
        let misalignment = vaddr as usize & (PAGE_SIZE - 1);
        let aligned_vaddr = vaddr - misalignment as VirtAddr;
        let aligned_size = (size + misalignment + PAGE_SIZE - 1) & !(PAGE_SIZE - 1);
        let npages = aligned_size / PAGE_SIZE;
        let perms = Permissions {
            readable,
            writable,
            executable,
        };

        if self.region1.is_none() {
            self.region1 = Some(PageTable::new(aligned_vaddr, npages, perms));
            Ok(())
        } else if self.region2.is_none() {
            self.region2 = Some(PageTable::new(aligned_vaddr, npages, perms));
            Ok(())
        } else {
            Err(KernelError::Unsupported)
        }
    }

    /// Allocates one frame at a time for every page of region1, region2,
    /// and the stack (so regions need not be physically contiguous),
    /// zeroing each as it is mapped in.
    pub fn prepare_load<P: Platform>(
        &mut self,
        fa: &FrameAllocator<P>,
    ) -> Result<(), KernelError> {
        for region in [self.region1.as_mut(), self.region2.as_mut()]
            .into_iter()
            .flatten()
        {
            populate(region, fa)?;
        }
        populate(&mut self.stack, fa)
    }

    /// Marks the address space as having completed its ELF load: the text
    /// region is enforced read-only in the TLB from this point on.
    pub fn complete_load(&mut self) {
        self.load_completed = true;
    }

    /// The initial user stack pointer.
    pub fn define_stack(&self) -> VirtAddr {
        USERSTACK
    }

    /// Invalidates every TLB entry. Interrupts are disabled for the
    /// duration of the sweep.
    pub fn activate(&self, platform: &dyn Platform) {
        platform.with_interrupts_disabled(&mut || {
            for i in 0..platform.num_tlb_entries() {
                platform.tlb_write(i, TlbEntry::INVALID);
            }
        });
    }

    /// Creates an independent copy: new page tables and frames, with every
    /// page's contents duplicated from `self`. Frames are never shared.
    pub fn copy<P: Platform>(&self, fa: &FrameAllocator<P>) -> Result<AddressSpace, KernelError> {
        let mut new = AddressSpace::create();

        if let Some(r1) = &self.region1 {
            new.region1 = Some(PageTable::new(r1.vbase, r1.npages, r1.perms));
        }
        if let Some(r2) = &self.region2 {
            new.region2 = Some(PageTable::new(r2.vbase, r2.npages, r2.perms));
        }

        if let Err(e) = new.prepare_load(fa) {
            new.destroy(fa);
            return Err(e);
        }

        let platform = fa.platform();
        if let (Some(old), Some(fresh)) = (&self.region1, &new.region1) {
            copy_region_contents(platform, old, fresh);
        }
        if let (Some(old), Some(fresh)) = (&self.region2, &new.region2) {
            copy_region_contents(platform, old, fresh);
        }
        copy_region_contents(platform, &self.stack, &new.stack);

        Ok(new)
    }

    /// Frees every frame referenced by every region. Safe to call even if
    /// `prepare_load` only partially populated frames (unset slots are 0
    /// and are skipped).
    pub fn destroy<P: Platform>(&mut self, fa: &FrameAllocator<P>) {
        for region in [self.region1.as_ref(), self.region2.as_ref()]
            .into_iter()
            .flatten()
        {
            free_region(region, fa);
        }
        free_region(&self.stack, fa);
    }

    /// Locates the region containing `vaddr` and translates to a physical
    /// address, for the TLB fault handler.
    pub fn translate(&self, vaddr: VirtAddr) -> Result<(PhysAddr, Region), KernelError> {
        let (region, kind) = if matches!(&self.region1, Some(r) if r.contains(vaddr)) {
            (self.region1.as_ref().unwrap(), Region::Text)
        } else if matches!(&self.region2, Some(r) if r.contains(vaddr)) {
            (self.region2.as_ref().unwrap(), Region::Data)
        } else if self.stack.contains(vaddr) {
            (&self.stack, Region::Stack)
        } else {
            return Err(KernelError::BadAddress { addr: vaddr });
        };

        let page_base = region.frame_for(vaddr);
        let offset = vaddr as usize & (PAGE_SIZE - 1);
        Ok((page_base + offset as PhysAddr, kind))
    }
}

fn populate<P: Platform>(table: &mut PageTable, fa: &FrameAllocator<P>) -> Result<(), KernelError> {
    for i in 0..table.npages {
        let frame = fa.alloc(1);
        if frame == 0 {
            return Err(KernelError::OutOfMemory { requested: 1 });
        }
        fa.platform().zero_frame(frame);
        table.frames[i] = frame;
    }
    Ok(())
}

fn free_region<P: Platform>(table: &PageTable, fa: &FrameAllocator<P>) {
    for &frame in &table.frames {
        if frame != 0 {
            fa.free(frame);
        }
    }
}

fn copy_region_contents(platform: &dyn Platform, old: &PageTable, new: &PageTable) {
    for i in 0..old.npages {
        platform.copy_frame(new.frames[i], old.frames[i]);
    }
}

/// Builds the entry-lo value for a freshly-refilled TLB slot, clearing the
/// dirty bit (enforcing read-only) when the page is in the text region of
/// an address space that has finished loading.
pub fn entry_lo(frame: PhysAddr, region: Region, load_completed: bool) -> u32 {
    let mut flags = TlbFlags::DIRTY | TlbFlags::VALID;
    if region == Region::Text && load_completed {
        flags.remove(TlbFlags::DIRTY);
    }
    frame as u32 | flags.bits()
}

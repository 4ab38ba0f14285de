//! Integration coverage for the virtual-memory subsystems (spec.md §8,
//! scenarios S1-S2 and invariants 1-3), driven entirely through the crate's
//! public API against [`MockPlatform`].

use dumbvm_kernel::hal::mock::MockPlatform;
use dumbvm_kernel::mm::tlb::{handle_fault, FaultType};
use dumbvm_kernel::{AddressSpace, FrameAllocator, PAGE_SIZE};

fn booted(pages: usize) -> FrameAllocator<MockPlatform> {
    let fa = FrameAllocator::new(MockPlatform::new(pages, 16));
    fa.vm_bootstrap();
    fa
}

/// S1: allocate 3 pages, free them, allocate 3 pages again; the second
/// allocation returns the same base as the first.
#[test]
fn s1_free_then_realloc_reuses_the_same_base() {
    let fa = booted(64);
    let first = fa.alloc(3);
    assert_ne!(first, 0);
    fa.free(first);
    let second = fa.alloc(3);
    assert_eq!(first, second);
}

/// S2: allocate 1 page, allocate 2 pages, free the 1-page allocation,
/// allocate 1 page; the new allocation reuses the freed slot (first-fit).
#[test]
fn s2_first_fit_prefers_the_earlier_freed_slot() {
    let fa = booted(64);
    let one = fa.alloc(1);
    let two = fa.alloc(2);
    assert_ne!(one, two);
    fa.free(one);
    let reused = fa.alloc(1);
    assert_eq!(one, reused);
}

/// A full address-space life cycle through the public API: define two
/// regions and a stack, populate them, translate every page through the TLB
/// fault handler, complete the load, and confirm the text region becomes
/// read-only-in-the-TLB at exactly that point.
#[test]
fn full_address_space_lifecycle_through_tlb_refill() {
    let fa = booted(128);
    let mut asp = AddressSpace::create();
    asp.define_region(0x0040_0000, 2 * PAGE_SIZE, true, false, true)
        .unwrap(); // text
    asp.define_region(0x0060_0000, PAGE_SIZE, true, true, false)
        .unwrap(); // data
    asp.prepare_load(&fa).unwrap();

    // Before complete_load, a write fault to text succeeds (pre-load,
    // writes are allowed everywhere).
    handle_fault(FaultType::Write, 0x0040_0000, Some(&asp), fa.platform()).unwrap();

    asp.complete_load();

    // After complete_load, the TLB entry installed for a text access must
    // have lost the dirty bit.
    handle_fault(FaultType::Read, 0x0040_1000, Some(&asp), fa.platform()).unwrap();
    let installed = (0..fa.platform().num_tlb_entries())
        .map(|i| fa.platform().tlb_read(i))
        .find(|e| e.valid() && e.entry_hi == 0x0040_1000)
        .expect("TLB refill must have installed an entry");
    assert_eq!(
        installed.entry_lo & dumbvm_kernel::hal::TlbFlags::DIRTY.bits(),
        0
    );

    // The stack region is still fully writable.
    handle_fault(FaultType::Write, 0x7fff_f000, Some(&asp), fa.platform()).unwrap();

    asp.destroy(&fa);
}

/// Invariant 3: after `copy`, contents match but physical frames differ,
/// for every user-visible page including the stack.
#[test]
fn invariant_copy_preserves_contents_across_every_region() {
    let fa = booted(128);
    let mut original = AddressSpace::create();
    original
        .define_region(0x0040_0000, PAGE_SIZE, true, true, true)
        .unwrap();
    original.prepare_load(&fa).unwrap();

    let (paddr, _) = original.translate(0x0040_0000).unwrap();
    let mut payload = [0u8; PAGE_SIZE];
    payload[0] = 0x42;
    payload[PAGE_SIZE - 1] = 0x99;
    fa.platform().write_frame(paddr, &payload);

    let copy = original.copy(&fa).unwrap();
    let (copy_paddr, _) = copy.translate(0x0040_0000).unwrap();
    assert_ne!(paddr, copy_paddr);

    let mut observed = [0u8; PAGE_SIZE];
    fa.platform().read_frame(copy_paddr, &mut observed);
    assert_eq!(observed, payload);

    original.destroy(&fa);
    let mut copy = copy;
    copy.destroy(&fa);
}

/// Invariant 2: after `destroy`, none of the address space's former frames
/// are still marked non-free.
#[test]
fn invariant_destroy_returns_every_frame_to_the_coremap() {
    let fa = booted(64);
    let mut asp = AddressSpace::create();
    asp.define_region(0x0040_0000, 2 * PAGE_SIZE, true, true, false)
        .unwrap();
    asp.prepare_load(&fa).unwrap();

    let mut frames = alloc_frames_used(&asp);
    assert!(!frames.is_empty());

    asp.destroy(&fa);

    for paddr in frames.drain(..) {
        assert_eq!(fa.is_free(paddr), Some(true));
    }
}

fn alloc_frames_used(asp: &AddressSpace) -> Vec<dumbvm_kernel::hal::PhysAddr> {
    let mut out = Vec::new();
    let mut addr = 0x0040_0000u32;
    for _ in 0..2 {
        let (paddr, _) = asp.translate(addr).unwrap();
        out.push(paddr);
        addr += PAGE_SIZE as u32;
    }
    out
}

//! Software TLB fault handler.
//!
//! On a TLB miss, translates the faulting user virtual address through the
//! current process's address space and installs a TLB entry. There is no
//! demand paging here: every page named by an address space's regions is
//! already backed by a frame (`prepare_load` populated it), so a miss can
//! only mean "not yet in the TLB", "no such address", or "write to
//! read-only text".

use super::address_space::{entry_lo, AddressSpace};
use super::PAGE_SIZE;
use crate::error::KernelError;
use crate::hal::{Platform, TlbEntry, VirtAddr};

/// The kind of trap that brought us here.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultType {
    Read,
    Write,
    ReadOnly,
}

/// Handles one TLB miss. `address_space` is `None` when there is no current
/// process or no current address space (early-boot safety).
pub fn handle_fault(
    fault_type: FaultType,
    fault_address: VirtAddr,
    address_space: Option<&AddressSpace>,
    platform: &dyn Platform,
) -> Result<(), KernelError> {
    let fault_address = fault_address & !(PAGE_SIZE as VirtAddr - 1);

    if fault_type == FaultType::ReadOnly {
        return Err(KernelError::ReadOnlyText);
    }

    let Some(as_) = address_space else {
        return Err(KernelError::BadAddress {
            addr: fault_address,
        });
    };

    assert!(
        as_.region1.is_some() && as_.region2.is_some(),
        "TLB refill with an address space whose regions were never defined"
    );

    let (paddr, region) = as_.translate(fault_address)?;
    let lo = entry_lo(paddr, region, as_.load_completed);

    platform.with_interrupts_disabled(&mut || {
        let slot = (0..platform.num_tlb_entries()).find(|&i| !platform.tlb_read(i).valid());

        let entry = TlbEntry {
            entry_hi: fault_address,
            entry_lo: lo,
        };

        match slot {
            Some(i) => platform.tlb_write(i, entry),
            None => platform.tlb_random(entry),
        }
    });

    Ok(())
}

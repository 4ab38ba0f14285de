//! Boot sequencing.
//!
//! Formalizes the hard init-order constraint from spec.md §9 ("Design
//! Notes: Global mutable state"): the logger before anything that might log,
//! the coremap before any address-space operation, the process table before
//! the first `fork`, and the intersection coordinator before the first
//! driver call. Nothing downstream of [`boot`] may run before it returns.

use crate::hal::Platform;
use crate::mm::frame_allocator::FrameAllocator;
use crate::{intersection, process};

/// Runs every subsystem's one-time initialization, in the required order.
///
/// `fa` is the frame allocator this boot sequence brings up; it is generic
/// over the platform (spec.md §6, "Hardware (consumed)") so a bare-metal
/// caller can hold it in a `static` backed by [`crate::hal::mips::MipsPlatform`]
/// while tests use [`crate::hal::mock::MockPlatform`].
pub fn boot<P: Platform>(fa: &FrameAllocator<P>) {
    crate::log_service::init();
    log::info!("booting dumbvm-kernel");

    fa.vm_bootstrap();
    process::table::init();
    intersection::init();

    log::info!("boot sequence complete");
}

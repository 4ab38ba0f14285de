//! Thin kernel entry point.
//!
//! The CPU bootstrap code that would hand control to `_start` — setting up
//! the initial stack, enabling the MMU, parsing firmware-provided boot
//! arguments — is out of scope for this crate (spec.md §1). On bare-metal
//! MIPS this file only wires [`bootstrap::boot`] up to that (absent) entry
//! point; on the host target it is an ordinary `fn main` used purely as a
//! build/smoke-test target, since the binary crate is never the thing under
//! test (`kernel/tests/*.rs` and the library's own `#[cfg(test)]` modules
//! are).

#[cfg(target_os = "none")]
use dumbvm_kernel::bootstrap;
#[cfg(target_os = "none")]
use dumbvm_kernel::hal::mips::MipsPlatform;
#[cfg(target_os = "none")]
use dumbvm_kernel::mm::FrameAllocator;

#[cfg(target_os = "none")]
static FRAME_ALLOCATOR: FrameAllocator<MipsPlatform> = FrameAllocator::new(MipsPlatform);

#[cfg(target_os = "none")]
#[no_mangle]
pub extern "C" fn kmain() -> ! {
    bootstrap::boot(&FRAME_ALLOCATOR);
    log::info!("dumbvm-kernel up; no scheduler is in scope to hand off to");
    loop {
        core::hint::spin_loop();
    }
}

#[cfg(not(target_os = "none"))]
fn main() {
    // Host build: nothing to boot against real MIPS hardware. This exists so
    // `cargo build`/`cargo run` succeed on a developer's workstation; the
    // actual subsystem behavior is exercised by `cargo test`.
    println!("dumbvm-kernel v{}", env!("CARGO_PKG_VERSION"));
    println!("this binary only boots on bare-metal MIPS; run `cargo test` instead");
}

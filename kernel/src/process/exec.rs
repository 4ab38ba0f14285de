//! `execv`: replaces the calling process's program image with a new one.
//!
//! The ELF loader and the VFS file lookup it implies are out of scope
//! (spec.md §1); [`ElfLoader`] is the seam a real loader would fill in.
//! This module owns exactly what spec.md §4.F assigns to the process/VM
//! subsystems: argv duplication, address-space switch-over, and the
//! top-down initial-stack layout algorithm (scenario S4).

extern crate alloc;

use alloc::string::String;
use alloc::vec::Vec;

use super::pcb::Process;
use crate::error::KernelError;
use crate::hal::{Platform, VirtAddr};
use crate::mm::frame_allocator::FrameAllocator;
use crate::mm::AddressSpace;

/// The ELF loader contract this crate consumes (spec.md §6): given a fresh,
/// current, activated address space, populate its regions (`define_region`
/// then `prepare_load`, per spec.md §4.C) and write the program's initial
/// segment contents, returning the entry point. The caller — `execv` —
/// invokes `complete_load` afterward.
pub trait ElfLoader {
    fn load<P: Platform>(
        &self,
        path: &str,
        as_: &mut AddressSpace,
        fa: &FrameAllocator<P>,
    ) -> Result<VirtAddr, KernelError>;
}

/// The result of a successful `execv`: where to jump, with what `argc` and
/// user-visible `argv`, and the 8-byte-aligned initial stack pointer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExecResult {
    pub entry: VirtAddr,
    pub argc: usize,
    pub argv: VirtAddr,
    pub stack_pointer: VirtAddr,
}

/// Replaces `process`'s program image with `path`, built with the given
/// `argv` (each element NUL-terminated when copied out, NULL pointer at
/// the end per the usual C calling convention).
///
/// On success the process's old address space has been destroyed and its
/// new one is current and activated; `execv` never returns to the caller
/// in that case (the caller is expected to jump to `ExecResult::entry`).
/// On failure the old address space is restored as current, per spec.md
/// §4.F's "old address space still installed" contract.
pub fn execv<P: Platform, L: ElfLoader>(
    process: &Process,
    path: &str,
    argv: &[&str],
    loader: &L,
    fa: &FrameAllocator<P>,
) -> Result<ExecResult, KernelError> {
    // Duplicate path/argv into kernel memory: the old address space (which
    // may own the user-space copies the caller passed in) is about to be
    // destroyed.
    let path_owned = String::from(path);
    let argv_owned: Vec<String> = argv.iter().map(|s| String::from(*s)).collect();

    let old_as = process.address_space.lock().replace(AddressSpace::create());

    // Installed as current; invalidate the TLB for the switch before the
    // loader starts writing through it.
    process
        .address_space
        .lock()
        .as_ref()
        .expect("execv: just installed a new address space")
        .activate(fa.platform());

    let build = || -> Result<ExecResult, KernelError> {
        let mut slot = process.address_space.lock();
        let cur = slot
            .as_mut()
            .expect("execv: current address space vanished mid-call");

        let entry = loader.load(&path_owned, cur, fa)?;
        let result = build_stack(cur, fa, &argv_owned)?;
        cur.complete_load();

        Ok(ExecResult {
            entry,
            argc: argv_owned.len(),
            argv: result.0,
            stack_pointer: result.1,
        })
    };

    match build() {
        Ok(result) => {
            if let Some(mut old) = old_as {
                old.destroy(fa);
            }
            Ok(result)
        }
        Err(e) => {
            // Tear down the half-built new address space and restore the
            // old one as current, so the caller's claim that "the old
            // address space [is] still installed" on error remains true.
            if let Some(mut failed) = process.address_space.lock().take() {
                failed.destroy(fa);
            }
            *process.address_space.lock() = old_as;
            Err(e)
        }
    }
}

/// Builds the initial user stack top-down, per spec.md §4.F steps 1-4.
/// Returns `(argv_user_address, aligned_stack_pointer)`.
fn build_stack<P: Platform>(
    as_: &AddressSpace,
    fa: &FrameAllocator<P>,
    argv: &[String],
) -> Result<(VirtAddr, VirtAddr), KernelError> {
    let mut sp = as_.define_stack();

    // Step 1: push each argument string (NUL-terminated), recording its
    // user address.
    let mut arg_addrs = Vec::with_capacity(argv.len());
    for arg in argv {
        let mut bytes: Vec<u8> = arg.as_bytes().to_vec();
        bytes.push(0);
        sp -= bytes.len() as VirtAddr;
        copy_out(as_, fa, sp, &bytes)?;
        arg_addrs.push(sp);
    }

    // Step 2: align down to a 4-byte boundary.
    sp &= !0x3;

    // Step 3: push a NULL pointer, then each recorded address in reverse
    // order. The address after all pushes is argv for the new program.
    sp -= 4;
    copy_out(as_, fa, sp, &0u32.to_le_bytes())?;
    for &addr in arg_addrs.iter().rev() {
        sp -= 4;
        copy_out(as_, fa, sp, &addr.to_le_bytes())?;
    }
    let argv_user = sp;

    // Step 4: align down to an 8-byte boundary before entry.
    sp &= !0x7;

    Ok((argv_user, sp))
}

/// Writes `bytes` starting at user virtual address `vaddr`, byte by byte,
/// through the address space's existing mappings (the stack region is
/// already populated by the loader's `prepare_load` call).
fn copy_out<P: Platform>(
    as_: &AddressSpace,
    fa: &FrameAllocator<P>,
    vaddr: VirtAddr,
    bytes: &[u8],
) -> Result<(), KernelError> {
    for (i, &byte) in bytes.iter().enumerate() {
        let (paddr, _) = as_.translate(vaddr + i as VirtAddr)?;
        fa.platform().write_u8(paddr, byte);
    }
    Ok(())
}

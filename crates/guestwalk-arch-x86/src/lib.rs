//! IA-32 architecture support.
//!
//! Implements the 32-bit page-table walks (non-PAE and PAE) over the
//! [`guestwalk_core`] trait seams, together with the control-register
//! definitions and the non-resident-entry classifier.

mod paging;
mod registers;
mod residency;
mod translation;


use guestwalk_core::{Architecture, Gfn, GuestCore, GuestDriver, GuestError, Pa, Va};

pub use self::{
    paging::{
        PageTableEntry, PageTableLevel, PagingMode, entry_base, large_page_address, page_address,
        pdpt_base, pdpt_index, pgd_index, pte_index,
    },
    registers::{Cr0, Cr2, Cr3, Cr4, Registers},
    residency::{PteDisposition, classify},
};

/// IA-32 (32-bit x86) architecture.
pub struct X86;

impl X86 {
    /// Determines the active paging mode from a register snapshot.
    ///
    /// Returns `None` when paging is disabled (CR0.PG clear). Long mode is
    /// not handled; a 64-bit guest has to be walked by a different
    /// architecture implementation.
    pub fn paging_mode(registers: &Registers) -> Option<PagingMode> {
        if !registers.cr0.paging() {
            return None;
        }

        if registers.cr4.physical_address_extension() {
            Some(PagingMode::Pae)
        } else {
            Some(PagingMode::Legacy)
        }
    }
}

impl Architecture for X86 {
    const PAGE_SIZE: u64 = 0x1000;
    const PAGE_SHIFT: u64 = 12;
    const PAGE_MASK: u64 = 0xffff_ffff_ffff_f000;

    type Registers = Registers;
    type PagingMode = PagingMode;

    fn gfn_from_pa(pa: Pa) -> Gfn {
        Gfn(u64::from(pa) >> Self::PAGE_SHIFT)
    }

    fn pa_from_gfn(gfn: Gfn) -> Pa {
        Pa(u64::from(gfn) << Self::PAGE_SHIFT)
    }

    fn pa_offset(pa: Pa) -> u64 {
        u64::from(pa) & !Self::PAGE_MASK
    }

    fn translate_address<Driver>(
        core: &GuestCore<Driver>,
        va: Va,
        root: Pa,
        mode: PagingMode,
    ) -> Result<Pa, GuestError>
    where
        Driver: GuestDriver<Architecture = Self>,
    {
        match mode {
            PagingMode::Legacy => translation::translate_legacy(core, va, root),
            PagingMode::Pae => translation::translate_pae(core, va, root),
        }
    }
}

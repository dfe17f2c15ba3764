use guestwalk_core::{GuestCore, GuestDriver, GuestError, Pa, Va};

use crate::{
    X86,
    paging::{
        PageTableEntry, PageTableLevel, PagingMode, entry_base, large_page_address, page_address,
        pdpt_base, pdpt_index, pgd_index, pte_index,
    },
    residency,
};

/// Performs a 32-bit non-PAE page-table walk.
///
/// Two levels: page directory, page table. A set PS bit on the directory
/// entry short-circuits the walk with a 4 MiB mapping.
pub(crate) fn translate_legacy<Driver>(
    core: &GuestCore<Driver>,
    va: Va,
    root: Pa,
) -> Result<Pa, GuestError>
where
    Driver: GuestDriver<Architecture = X86>,
{
    const MODE: PagingMode = PagingMode::Legacy;

    tracing::debug!(%va, %root, "32-bit (non-PAE) lookup");

    let pde_address = entry_base(MODE, u64::from(root)) + pgd_index(MODE, va);
    let pde = PageTableEntry(u64::from(core.read_u32(pde_address)?));
    tracing::debug!(%pde_address, ?pde);

    if !pde.present() {
        residency::report_nonresident(core.os_family(), pde, PageTableLevel::Pd);
        return Err(GuestError::page_fault((va, root)));
    }

    if pde.large() {
        let pa = large_page_address(MODE, pde.0, va);
        tracing::debug!(%pa, "4MB page");
        return Ok(pa);
    }

    let pte_address = entry_base(MODE, pde.0) + pte_index(MODE, va);
    let pte = PageTableEntry(u64::from(core.read_u32(pte_address)?));
    tracing::debug!(%pte_address, ?pte);

    if !pte.present() {
        residency::report_nonresident(core.os_family(), pte, PageTableLevel::Pt);
        return Err(GuestError::page_fault((va, root)));
    }

    let pa = page_address(MODE, pte.0, va);
    tracing::debug!(%pa);

    Ok(pa)
}

/// Performs a 32-bit PAE page-table walk.
///
/// Three levels: PDPT, page directory, page table. A set PS bit on the
/// directory entry short-circuits the walk with a 2 MiB mapping. A
/// non-present PDPT entry fails without classification; the software-bit
/// encodings live in the lower levels only.
pub(crate) fn translate_pae<Driver>(
    core: &GuestCore<Driver>,
    va: Va,
    root: Pa,
) -> Result<Pa, GuestError>
where
    Driver: GuestDriver<Architecture = X86>,
{
    const MODE: PagingMode = PagingMode::Pae;

    tracing::debug!(%va, %root, "32-bit PAE lookup");

    let pdpte_address = pdpt_base(root) + pdpt_index(va);
    let pdpte = PageTableEntry(core.read_u64(pdpte_address)?);
    tracing::debug!(%pdpte_address, ?pdpte);

    if !pdpte.present() {
        return Err(GuestError::page_fault((va, root)));
    }

    let pde_address = entry_base(MODE, pdpte.0) + pgd_index(MODE, va);
    let pde = PageTableEntry(core.read_u64(pde_address)?);
    tracing::debug!(%pde_address, ?pde);

    if !pde.present() {
        residency::report_nonresident(core.os_family(), pde, PageTableLevel::Pd);
        return Err(GuestError::page_fault((va, root)));
    }

    if pde.large() {
        let pa = large_page_address(MODE, pde.0, va);
        tracing::debug!(%pa, "2MB page");
        return Ok(pa);
    }

    let pte_address = entry_base(MODE, pde.0) + pte_index(MODE, va);
    let pte = PageTableEntry(core.read_u64(pte_address)?);
    tracing::debug!(%pte_address, ?pte);

    if !pte.present() {
        residency::report_nonresident(core.os_family(), pte, PageTableLevel::Pt);
        return Err(GuestError::page_fault((va, root)));
    }

    let pa = page_address(MODE, pte.0, va);
    tracing::debug!(%pa);

    Ok(pa)
}

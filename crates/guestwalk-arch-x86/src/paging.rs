//! IA-32 paging structures.

use guestwalk_core::{Pa, Va};
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

/// The paging mode of a 32-bit x86 guest.
///
/// Fixed per session; a guest does not switch between non-PAE and PAE
/// paging at runtime once the kernel is up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PagingMode {
    /// 32-bit paging without physical address extension.
    ///
    /// Two levels (page directory, page table), 4-byte entries, 1024
    /// entries per table, optional 4 MiB large pages.
    Legacy,

    /// 32-bit paging with physical address extension.
    ///
    /// Three levels (PDPT, page directory, page table), 8-byte entries,
    /// 512 entries per directory/table, optional 2 MiB large pages.
    Pae,
}

impl PagingMode {
    /// The size of a single page-table entry in bytes.
    pub fn entry_size(self) -> u64 {
        match self {
            PagingMode::Legacy => 4,
            PagingMode::Pae => 8,
        }
    }
}

/// The level of a page-table hierarchy an entry was read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageTableLevel {
    /// Page table (the innermost level).
    Pt,

    /// Page directory.
    Pd,

    /// Page-directory-pointer table (PAE only).
    Pdpt,
}

/// A page-table entry.
///
/// Non-PAE entries are 32 bits wide in the guest and are zero-extended on
/// read; the flag layout in the low 12 bits is common to both modes.
#[repr(transparent)]
#[derive(
    Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, FromBytes, IntoBytes, Immutable, KnownLayout,
)]
pub struct PageTableEntry(pub u64);

impl PageTableEntry {
    /// Present.
    pub fn present(self) -> bool {
        self.0 & 1 != 0
    }

    /// Read/write.
    pub fn write(self) -> bool {
        (self.0 >> 1) & 1 != 0
    }

    /// User/supervisor.
    pub fn supervisor(self) -> bool {
        (self.0 >> 2) & 1 == 0
    }

    /// Accessed.
    pub fn accessed(self) -> bool {
        (self.0 >> 5) & 1 != 0
    }

    /// Dirty.
    pub fn dirty(self) -> bool {
        (self.0 >> 6) & 1 != 0
    }

    /// Page size (PS); set on a directory entry mapping a large page.
    pub fn large(self) -> bool {
        (self.0 >> 7) & 1 != 0
    }

    /// Global.
    pub fn global(self) -> bool {
        (self.0 >> 8) & 1 != 0
    }

    /// Windows software bit: the entry points to a page in transition.
    ///
    /// Only meaningful when the entry is not present.
    pub fn transition(self) -> bool {
        (self.0 >> 11) & 1 != 0
    }

    /// Windows software bit: the entry is a prototype PTE pointer.
    ///
    /// Only meaningful when the entry is not present.
    pub fn prototype(self) -> bool {
        (self.0 >> 10) & 1 != 0
    }

    /// Windows software field: the paging-file index of a swapped-out page.
    ///
    /// Only meaningful when the entry is not present and neither the
    /// transition nor the prototype bit is set.
    pub fn pagefile_index(self) -> u32 {
        ((self.0 >> 1) & 0xf) as u32
    }

    /// Windows software field: the paging-file frame of a swapped-out page.
    ///
    /// Shares the bit positions of the hardware frame field.
    pub fn pagefile_frame(self) -> u32 {
        (self.0 & 0xffff_f000) as u32
    }
}

impl std::fmt::Debug for PageTableEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("PageTableEntry")
            .field("raw", &format_args!("0x{:x}", self.0))
            .field("present", &self.present())
            .field("write", &self.write())
            .field("large", &self.large())
            .finish()
    }
}

/// Returns the byte offset of the page-directory entry for `va` within the
/// page directory.
pub fn pgd_index(mode: PagingMode, va: Va) -> u64 {
    match mode {
        PagingMode::Legacy => ((u64::from(va) >> 22) & 0x3ff) * 4,
        PagingMode::Pae => ((u64::from(va) >> 21) & 0x1ff) * 8,
    }
}

/// Returns the byte offset of the page-table entry for `va` within the page
/// table.
pub fn pte_index(mode: PagingMode, va: Va) -> u64 {
    match mode {
        PagingMode::Legacy => ((u64::from(va) >> 12) & 0x3ff) * 4,
        PagingMode::Pae => ((u64::from(va) >> 12) & 0x1ff) * 8,
    }
}

/// Returns the byte offset of the page-directory-pointer entry for `va`
/// within the PDPT (PAE only).
///
/// Virtual addresses are 32-bit in this mode, so the index is 0..=3.
pub fn pdpt_index(va: Va) -> u64 {
    ((u64::from(va) >> 30) & 0x3) * 8
}

/// Extracts the PDPT base from a CR3 value (PAE only).
///
/// The PDPT is 32-byte aligned; bits 5..=31 of CR3 hold its base.
pub fn pdpt_base(root: Pa) -> Pa {
    Pa(u64::from(root) & 0xffff_ffe0)
}

/// Extracts the next-level table base from a table entry (or, in non-PAE
/// mode, the page-directory base from CR3).
pub fn entry_base(mode: PagingMode, entry: u64) -> Pa {
    match mode {
        PagingMode::Legacy => Pa(entry & 0xffff_f000),
        PagingMode::Pae => Pa(entry & 0xf_ffff_f000),
    }
}

/// Composes the physical address of a large-page mapping.
///
/// Non-PAE directories map 4 MiB pages, PAE directories map 2 MiB pages.
pub fn large_page_address(mode: PagingMode, entry: u64, va: Va) -> Pa {
    match mode {
        PagingMode::Legacy => Pa((entry & 0xffc0_0000) | (u64::from(va) & 0x3f_ffff)),
        PagingMode::Pae => Pa((entry & 0xffe0_0000) | (u64::from(va) & 0x1f_ffff)),
    }
}

/// Composes the physical address of a 4 KiB mapping.
pub fn page_address(mode: PagingMode, entry: u64, va: Va) -> Pa {
    match mode {
        PagingMode::Legacy => Pa((entry & 0xffff_f000) | (u64::from(va) & 0xfff)),
        PagingMode::Pae => Pa((entry & 0xf_ffff_f000) | (u64::from(va) & 0xfff)),
    }
}

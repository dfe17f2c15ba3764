//! IA-32 control registers.

use guestwalk_core::Pa;

use crate::X86;

/// Control register CR0.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cr0(pub u64);

impl Cr0 {
    /// Protection Enable.
    pub fn protected_mode(self) -> bool {
        self.0 & 1 != 0
    }

    /// Paging.
    pub fn paging(self) -> bool {
        (self.0 >> 31) & 1 != 0
    }
}

/// Control register CR2 (page-fault linear address).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cr2(pub u64);

/// Control register CR3 (page-directory base).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cr3(pub u64);

impl Cr3 {
    /// Page-level Write-Through.
    pub fn write_through(self) -> bool {
        (self.0 >> 3) & 1 != 0
    }

    /// Page-level Cache Disable.
    pub fn cache_disable(self) -> bool {
        (self.0 >> 4) & 1 != 0
    }
}

/// Control register CR4.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Cr4(pub u64);

impl Cr4 {
    /// Page Size Extensions.
    pub fn page_size_extensions(self) -> bool {
        (self.0 >> 4) & 1 != 0
    }

    /// Physical Address Extension.
    pub fn physical_address_extension(self) -> bool {
        (self.0 >> 5) & 1 != 0
    }
}

/// Complete set of IA-32 control registers relevant to translation.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Registers {
    /// Control register CR0.
    pub cr0: Cr0,

    /// Control register CR2.
    pub cr2: Cr2,

    /// Control register CR3.
    pub cr3: Cr3,

    /// Control register CR4.
    pub cr4: Cr4,
}

impl guestwalk_core::Registers for Registers {
    type Architecture = X86;

    fn translation_root(&self) -> Pa {
        // PWT/PCD and the ignored low bits are not part of the base in
        // either paging mode; the walkers apply their mode-specific masks
        // on top.
        Pa(self.cr3.0 & !0x1f)
    }
}

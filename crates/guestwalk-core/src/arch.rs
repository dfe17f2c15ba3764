use std::fmt::Debug;

use crate::{Gfn, GuestCore, GuestDriver, GuestError, Pa, Va};

/// Defines an interface for CPU architecture-specific operations and
/// constants.
///
/// The trait encapsulates the characteristics that vary across guest CPU
/// architectures, so that the translation facade and the OS layers can be
/// written architecture-agnostically.
pub trait Architecture {
    /// The size of a memory page in bytes.
    ///
    /// # Architecture-specific
    ///
    /// - **x86**: `0x1000` (4096 bytes)
    const PAGE_SIZE: u64;

    /// The number of bits to shift when converting between frame numbers and
    /// physical addresses.
    ///
    /// # Architecture-specific
    ///
    /// - **x86**: `12` (2^12 = 4096)
    const PAGE_SHIFT: u64;

    /// A bitmask used to isolate the frame base from a full address.
    ///
    /// # Architecture-specific
    ///
    /// - **x86**: `0xFFFFFFFFFFFFF000`
    const PAGE_MASK: u64;

    /// The complete set of CPU registers for the architecture.
    type Registers: Registers;

    /// The paging modes the architecture can run in.
    ///
    /// The active mode is immutable per session; it is supplied when the
    /// [`GuestCore`] is constructed, not inferred per call.
    ///
    /// # Architecture-specific
    ///
    /// - **x86**: 32-bit non-PAE and PAE
    type PagingMode: Debug + Clone + Copy + PartialEq + Eq;

    /// Converts a guest physical address to a guest frame number.
    fn gfn_from_pa(pa: Pa) -> Gfn;

    /// Converts a guest frame number to a guest physical address.
    fn pa_from_gfn(gfn: Gfn) -> Pa;

    /// Extracts the offset within a page from a physical address.
    fn pa_offset(pa: Pa) -> u64;

    /// Performs a full page-table walk to translate a virtual address to a
    /// physical address.
    ///
    /// Page-table entries are read fresh from guest memory on every step;
    /// nothing is cached at this layer. A non-present entry terminates the
    /// walk with [`GuestError::PageFault`].
    fn translate_address<Driver>(
        core: &GuestCore<Driver>,
        va: Va,
        root: Pa,
        mode: Self::PagingMode,
    ) -> Result<Pa, GuestError>
    where
        Driver: GuestDriver<Architecture = Self>;
}

/// Complete set of CPU registers for a specific architecture.
pub trait Registers
where
    Self: Debug + Default + Clone + Copy,
{
    /// The specific CPU architecture implementation.
    type Architecture: Architecture + ?Sized;

    /// Returns the physical address of the root of the current page-table
    /// hierarchy.
    ///
    /// # Architecture-specific
    ///
    /// - **x86**: the CR3 register with its flag bits masked off
    fn translation_root(&self) -> Pa;
}

use crate::{Pa, Va};

/// An error that can occur while translating addresses or resolving kernel
/// objects.
///
/// Structural absence (a non-present page-table entry, an exhausted process
/// list, a missing export), I/O failure in the underlying driver, and
/// misconfiguration are distinct variants. No sentinel addresses: physical
/// address 0 remains a valid translation result.
#[derive(thiserror::Error, Debug)]
pub enum GuestError {
    /// An error occurred in the memory-read driver.
    #[error(transparent)]
    Driver(Box<dyn std::error::Error>),

    /// An OS-specific error occurred.
    #[error(transparent)]
    Os(Box<dyn std::error::Error>),

    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A page-table walk hit a non-present entry.
    #[error("Page not present ({:?}, len: {})", .0[0], .0.len())]
    PageFault(PageFaults),

    /// The translation root (CR3 or a resolved page-directory base) is zero.
    #[error("Root not present")]
    RootNotPresent,

    /// The given address has invalid width.
    #[error("Invalid address width")]
    InvalidAddressWidth,

    /// Other error.
    #[error("{0}")]
    Other(&'static str),
}

/// A page fault.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PageFault {
    /// The virtual address that caused the page fault.
    pub address: Va,

    /// The root of the page table hierarchy.
    pub root: Pa,
}

/// A collection of page faults.
pub type PageFaults = smallvec::SmallVec<[PageFault; 1]>;

impl From<(Va, Pa)> for PageFault {
    fn from((address, root): (Va, Pa)) -> Self {
        Self { address, root }
    }
}

impl GuestError {
    /// Creates a new page fault error.
    pub fn page_fault(pf: impl Into<PageFault>) -> Self {
        Self::PageFault(smallvec::smallvec![pf.into()])
    }

    /// Creates a new page fault error with multiple page faults.
    pub fn page_faults(pfs: impl IntoIterator<Item = PageFault>) -> Self {
        Self::PageFault(pfs.into_iter().collect())
    }
}

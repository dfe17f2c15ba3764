use serde::{Deserialize, Serialize};

use super::macros::impl_ops;

impl_ops!(Gfn, u64, "Guest Frame Number");
impl_ops!(Pa, u64, "Guest Physical Address");
impl_ops!(Va, u64, "Guest Virtual Address");

impl Va {
    /// Checks if the virtual address is NULL.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

impl Pa {
    /// Checks if the physical address is NULL.
    ///
    /// A NULL translation root means the address space has no page tables
    /// and any translation through it must fail fast.
    pub fn is_null(self) -> bool {
        self.0 == 0
    }
}

/// The mechanism used for translating addresses during a memory access.
///
/// Page-table entries are read from the physical address space directly,
/// while kernel structures (process lists, PE headers) are dereferenced
/// through the guest's own paging structures. This enum selects between
/// the two per access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TranslationMechanism {
    /// Direct mapping (no translation).
    ///
    /// The provided address is treated as a physical address.
    Direct,

    /// Paging-based translation.
    Paging {
        /// Optionally specifies the root of the paging structure (the CR3
        /// value on x86). If `None`, the active root of vCPU 0 is resolved
        /// at access time.
        root: Option<Pa>,
    },
}

/// The context for a single memory access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AccessContext {
    /// The address to access.
    ///
    /// Interpreted as a virtual or physical address depending on
    /// [`mechanism`].
    ///
    /// [`mechanism`]: Self::mechanism
    pub address: u64,

    /// The mechanism used for address translation.
    pub mechanism: TranslationMechanism,
}

impl AccessContext {
    /// Creates a new `AccessContext` with direct mapping.
    pub fn direct(address: impl Into<Pa>) -> Self {
        Self {
            address: u64::from(address.into()),
            mechanism: TranslationMechanism::Direct,
        }
    }

    /// Creates a new `AccessContext` with paging-based translation.
    pub fn paging(address: impl Into<Va>, root: impl Into<Pa>) -> Self {
        Self {
            address: address.into().0,
            mechanism: TranslationMechanism::Paging {
                root: Some(root.into()),
            },
        }
    }
}

impl From<Pa> for AccessContext {
    fn from(value: Pa) -> Self {
        Self::direct(value)
    }
}

impl From<(Va, Pa)> for AccessContext {
    fn from(value: (Va, Pa)) -> Self {
        Self::paging(value.0, value.1)
    }
}

impl ::std::ops::Add<u64> for AccessContext {
    type Output = AccessContext;

    fn add(self, rhs: u64) -> Self::Output {
        Self {
            address: self.address + rhs,
            ..self
        }
    }
}

impl ::std::ops::AddAssign<u64> for AccessContext {
    fn add_assign(&mut self, rhs: u64) {
        self.address += rhs;
    }
}

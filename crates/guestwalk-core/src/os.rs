//! Operating-system trait seam.
//!
//! Symbol and process resolution are polymorphic over a closed variant set
//! of operating systems. Each variant carries its own profile data and
//! implements [`GuestOs`]; the variant is selected once per session and
//! threaded through explicitly, never stored globally.

use serde::{Deserialize, Serialize};

use crate::{GuestCore, GuestDriver, GuestError, Pa, Va};

/// The family of the introspected operating system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OsFamily {
    /// Microsoft Windows.
    Windows,

    /// Linux.
    Linux,

    /// Any other (or unknown) operating system.
    Other,
}

/// An identifier of a process within the guest.
#[derive(
    Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ProcessId(pub u32);

impl From<u32> for ProcessId {
    fn from(value: u32) -> Self {
        Self(value)
    }
}

impl From<ProcessId> for u32 {
    fn from(value: ProcessId) -> u32 {
        value.0
    }
}

impl std::fmt::Display for ProcessId {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A resolved kernel symbol.
///
/// The kernel image base is reported alongside the address because callers
/// routinely need it independently, e.g. for follow-up export-table lookups
/// against the same image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KernelSymbol {
    /// The virtual address of the symbol.
    pub address: Va,

    /// The base virtual address of the kernel image the symbol belongs to.
    pub kernel_base: Va,
}

/// Operating system trait.
///
/// Implementations walk live kernel structures through the core's read
/// helpers; they keep no state of their own beyond the configured profile.
pub trait GuestOs<Driver>
where
    Driver: GuestDriver,
{
    /// Resolves a kernel symbol name to a virtual address.
    fn kernel_symbol(
        &self,
        core: &GuestCore<Driver>,
        name: &str,
    ) -> Result<KernelSymbol, GuestError>;

    /// Retrieves the translation root (page-directory base) for a given
    /// process.
    fn process_translation_root(
        &self,
        core: &GuestCore<Driver>,
        pid: ProcessId,
    ) -> Result<Pa, GuestError>;

    /// Finds the process owning a given translation root.
    fn process_by_translation_root(
        &self,
        core: &GuestCore<Driver>,
        root: Pa,
    ) -> Result<ProcessId, GuestError>;
}

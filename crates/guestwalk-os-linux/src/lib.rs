//! Linux kernel-object resolution.
//!
//! Unlike the Windows variant, the Linux variant does not walk live kernel
//! structures itself: symbol addresses come from a `System.map`-style
//! listing and pid lookups are delegated to a pluggable task source. Both
//! collaborators sit behind traits so embedders can substitute their own
//! (a kallsyms snapshot, an agent inside the guest, a fixed table).

mod error;
mod system_map;

use std::marker::PhantomData;

use guestwalk_core::{
    GuestCore, GuestDriver, GuestError, KernelSymbol, Pa, ProcessId, Va, os::GuestOs,
};

pub use self::{error::LinuxError, system_map::SystemMap};

/// A source of kernel symbol addresses.
pub trait LinuxSymbolSource {
    /// Returns the virtual address of a kernel symbol, if known.
    fn symbol_address(&self, name: &str) -> Option<Va>;
}

/// A source of per-process translation roots.
pub trait LinuxTaskSource {
    /// Returns the translation root (page-directory base) of a process.
    fn translation_root(&self, pid: ProcessId) -> Option<Pa>;

    /// Returns the process owning a translation root.
    fn pid_by_translation_root(&self, root: Pa) -> Option<ProcessId>;
}

/// Linux OS variant.
pub struct LinuxOs<Driver>
where
    Driver: GuestDriver,
{
    kernel_base: Va,
    symbols: Box<dyn LinuxSymbolSource>,
    tasks: Box<dyn LinuxTaskSource>,
    _marker: PhantomData<Driver>,
}

impl<Driver> LinuxOs<Driver>
where
    Driver: GuestDriver,
{
    /// Creates a new Linux OS variant.
    ///
    /// `kernel_base` is reported alongside every resolved symbol; it has to
    /// match the base the symbol source's addresses were produced against.
    pub fn new(
        kernel_base: Va,
        symbols: Box<dyn LinuxSymbolSource>,
        tasks: Box<dyn LinuxTaskSource>,
    ) -> Self {
        Self {
            kernel_base,
            symbols,
            tasks,
            _marker: PhantomData,
        }
    }

    /// Returns the configured kernel base.
    pub fn kernel_base(&self) -> Va {
        self.kernel_base
    }
}

impl<Driver> GuestOs<Driver> for LinuxOs<Driver>
where
    Driver: GuestDriver,
{
    fn kernel_symbol(
        &self,
        _core: &GuestCore<Driver>,
        name: &str,
    ) -> Result<KernelSymbol, GuestError> {
        let address = self
            .symbols
            .symbol_address(name)
            .ok_or_else(|| LinuxError::SymbolNotFound(name.into()))?;

        tracing::debug!(name, %address, "symbol resolved");

        Ok(KernelSymbol {
            address,
            kernel_base: self.kernel_base,
        })
    }

    fn process_translation_root(
        &self,
        _core: &GuestCore<Driver>,
        pid: ProcessId,
    ) -> Result<Pa, GuestError> {
        self.tasks
            .translation_root(pid)
            .ok_or_else(|| LinuxError::ProcessNotFound(pid).into())
    }

    fn process_by_translation_root(
        &self,
        _core: &GuestCore<Driver>,
        root: Pa,
    ) -> Result<ProcessId, GuestError> {
        self.tasks
            .pid_by_translation_root(root)
            .ok_or_else(|| LinuxError::TranslationRootNotFound(root).into())
    }
}

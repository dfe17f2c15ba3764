use crate::{
    Architecture, GuestCore, GuestDriver, GuestError, Pa, Registers as _, Va, VcpuId,
    os::{GuestOs, KernelSymbol, ProcessId},
};

/// A translation session coupling a [`GuestCore`] with an OS variant.
///
/// The session is the public entry point for virtual-to-physical translation
/// and for symbol/pid resolution. It borrows the core and the OS for the
/// duration of the calls only; multiple sessions over the same core are
/// legal, and no mutable state is shared between them beyond the core's
/// pid cache.
pub struct GuestSession<'a, Driver, Os>
where
    Driver: GuestDriver,
    Os: GuestOs<Driver>,
{
    core: &'a GuestCore<Driver>,
    os: &'a Os,
}

impl<'a, Driver, Os> GuestSession<'a, Driver, Os>
where
    Driver: GuestDriver,
    Os: GuestOs<Driver>,
{
    /// Creates a new session over a core and an OS variant.
    pub fn new(core: &'a GuestCore<Driver>, os: &'a Os) -> Self {
        Self { core, os }
    }

    /// Returns the underlying core.
    pub fn core(&self) -> &'a GuestCore<Driver> {
        self.core
    }

    /// Returns the underlying OS variant.
    pub fn os(&self) -> &'a Os {
        self.os
    }

    /// Translates a kernel-space virtual address to a physical address.
    ///
    /// The translation root is read from vCPU 0. A zero root fails fast with
    /// [`GuestError::RootNotPresent`] without invoking the paging engine.
    pub fn translate_kernel(&self, va: Va) -> Result<Pa, GuestError> {
        let registers = self.core.registers(VcpuId(0))?;
        let root = registers.translation_root();

        if root.is_null() {
            tracing::debug!(%va, "early bail on kernel translation, CR3 is zero");
            return Err(GuestError::RootNotPresent);
        }

        Driver::Architecture::translate_address(self.core, va, root, self.core.paging_mode())
    }

    /// Translates a user-space virtual address to a physical address.
    ///
    /// The translation root is resolved through the process resolver for the
    /// given pid. A zero root fails fast, identically to kernel translation.
    pub fn translate_user(&self, va: Va, pid: ProcessId) -> Result<Pa, GuestError> {
        let root = self.pid_translation_root(pid)?;

        if root.is_null() {
            tracing::debug!(%va, %pid, "early bail on user translation, page-directory base is zero");
            return Err(GuestError::RootNotPresent);
        }

        Driver::Architecture::translate_address(self.core, va, root, self.core.paging_mode())
    }

    /// Resolves the translation root for a process.
    ///
    /// The pid cache is consulted first; a hit short-circuits the kernel
    /// structure walk. On a miss the OS variant resolves the root and the
    /// result is inserted into the cache.
    pub fn pid_translation_root(&self, pid: ProcessId) -> Result<Pa, GuestError> {
        if let Some(root) = self.core.pid_cache_lookup(pid) {
            tracing::debug!(%pid, %root, "pid cache hit");
            return Ok(root);
        }

        let root = self.os.process_translation_root(self.core, pid)?;
        self.core.pid_cache_insert(pid, root);

        Ok(root)
    }

    /// Finds the process owning a translation root.
    pub fn pid_by_translation_root(&self, root: Pa) -> Result<ProcessId, GuestError> {
        self.os.process_by_translation_root(self.core, root)
    }

    /// Resolves a kernel symbol name to a virtual address.
    pub fn kernel_symbol(&self, name: &str) -> Result<KernelSymbol, GuestError> {
        self.os.kernel_symbol(self.core, name)
    }
}

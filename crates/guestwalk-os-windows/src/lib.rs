//! Windows kernel-object resolution.
//!
//! Resolves kernel symbols and process page-directory bases by walking live
//! kernel structures of a 32-bit Windows guest: the `PsActiveProcessHead`
//! process list for pid lookups and the KPCR/export-table pair for symbols.

mod error;
mod iter;
mod pe;
mod profile;

#[cfg(test)]
mod tests;

use guestwalk_arch_x86::X86;
use guestwalk_core::{
    Architecture as _, GuestCore, GuestDriver, GuestError, KernelSymbol, Pa, ProcessId,
    Registers as _, Va, VcpuId,
    os::GuestOs,
};
use object::{endian::LittleEndian as LE, read::pe::ExportTarget};
use once_cell::unsync::OnceCell;

pub use self::{
    error::WindowsError,
    iter::ListEntryIterator,
    pe::{Pe, PeError},
    profile::{EprocessOffsets, KpcrProfile, WindowsProfile},
};

/// Windows OS variant.
///
/// Walks are performed on demand through the core's read helpers; the only
/// state kept between calls is the parsed kernel PE header, which cannot
/// change while the guest is running.
pub struct WindowsOs<Driver>
where
    Driver: GuestDriver<Architecture = X86>,
{
    profile: WindowsProfile,
    kernel_pe: OnceCell<Pe>,
    _marker: std::marker::PhantomData<Driver>,
}

impl<Driver> WindowsOs<Driver>
where
    Driver: GuestDriver<Architecture = X86>,
{
    /// Creates a new Windows OS variant from a build profile.
    pub fn new(profile: WindowsProfile) -> Self {
        Self {
            profile,
            kernel_pe: OnceCell::new(),
            _marker: std::marker::PhantomData,
        }
    }

    /// Returns the profile this variant was constructed with.
    pub fn profile(&self) -> &WindowsProfile {
        &self.profile
    }

    /// Returns an iterator over the `_EPROCESS` structures of the guest.
    pub fn processes<'a>(
        &self,
        core: &'a GuestCore<Driver>,
        root: Pa,
    ) -> ListEntryIterator<'a, Driver> {
        ListEntryIterator::new(
            core,
            root,
            self.profile.process_head,
            self.profile.offsets.tasks,
        )
    }

    /// Resolves the active kernel translation root from vCPU 0.
    fn kernel_root(&self, core: &GuestCore<Driver>) -> Result<Pa, GuestError> {
        let root = core.registers(VcpuId(0))?.translation_root();

        if root.is_null() {
            return Err(GuestError::RootNotPresent);
        }

        Ok(root)
    }

    /// Looks a symbol up in the debugger data block reachable from the KPCR.
    ///
    /// Returns `Ok(None)` when the profile has no KPCR, the symbol is not
    /// among the named debugger-data fields, or the version-block pointer
    /// is null (the block is only populated once the kernel debugger
    /// subsystem initializes).
    fn debugger_data_symbol(
        &self,
        core: &GuestCore<Driver>,
        root: Pa,
        name: &str,
    ) -> Result<Option<Va>, GuestError> {
        let kpcr = match &self.profile.kpcr {
            Some(kpcr) => kpcr,
            None => return Ok(None),
        };

        let offset = match kpcr.debugger_data.get(name) {
            Some(offset) => *offset,
            None => return Ok(None),
        };

        let version_block = core.read_va32((kpcr.base + kpcr.version_block, root))?;
        if version_block.is_null() {
            return Ok(None);
        }

        let address = core.read_va32((version_block + offset, root))?;
        Ok((!address.is_null()).then_some(address))
    }

    /// Looks a symbol up in the kernel image's export table.
    ///
    /// Returns the export's RVA; forwarded exports carry no address and are
    /// skipped.
    fn export_rva(
        &self,
        core: &GuestCore<Driver>,
        root: Pa,
        name: &str,
    ) -> Result<Option<u32>, GuestError> {
        let entry = match self.kernel_pe(core, root)?.export_directory_entry() {
            Some(entry) => entry,
            None => return Ok(None),
        };

        let mut data = vec![0u8; entry.size.get(LE) as usize];
        core.read(
            (
                self.profile.kernel_base + u64::from(entry.virtual_address.get(LE)),
                root,
            ),
            &mut data,
        )?;

        for export in pe::parse_exports(&data, &entry)? {
            if export.name != Some(name.as_bytes()) {
                continue;
            }

            if let ExportTarget::Address(rva) = export.target {
                return Ok(Some(rva));
            }
        }

        Ok(None)
    }

    /// Parses (and caches) the kernel image's PE headers.
    fn kernel_pe(&self, core: &GuestCore<Driver>, root: Pa) -> Result<&Pe, GuestError> {
        self.kernel_pe.get_or_try_init(|| {
            let mut data = vec![0u8; X86::PAGE_SIZE as usize];
            core.read((self.profile.kernel_base, root), &mut data)?;
            Pe::new(&data).map_err(GuestError::from)
        })
    }
}

impl<Driver> GuestOs<Driver> for WindowsOs<Driver>
where
    Driver: GuestDriver<Architecture = X86>,
{
    fn kernel_symbol(
        &self,
        core: &GuestCore<Driver>,
        name: &str,
    ) -> Result<KernelSymbol, GuestError> {
        let root = self.kernel_root(core)?;
        let kernel_base = self.profile.kernel_base;

        match self.debugger_data_symbol(core, root, name) {
            Ok(Some(address)) => {
                tracing::debug!(name, %address, "symbol resolved from debugger data");
                return Ok(KernelSymbol {
                    address,
                    kernel_base,
                });
            }
            Ok(None) => {}
            Err(err) => {
                tracing::debug!(name, ?err, "debugger-data lookup failed, trying export table");
            }
        }

        let rva = self
            .export_rva(core, root, name)?
            .ok_or_else(|| WindowsError::SymbolNotFound(name.into()))?;

        let address = kernel_base + u64::from(rva);
        tracing::debug!(name, %address, "symbol resolved from export table");

        Ok(KernelSymbol {
            address,
            kernel_base,
        })
    }

    fn process_translation_root(
        &self,
        core: &GuestCore<Driver>,
        pid: ProcessId,
    ) -> Result<Pa, GuestError> {
        let root = self.kernel_root(core)?;

        for process in self.processes(core, root) {
            let process = process?;

            let found = ProcessId(core.read_u32((process + self.profile.offsets.pid, root))?);
            if found != pid {
                continue;
            }

            let pdbase = core.read_u32((process + self.profile.offsets.pdbase, root))?;
            tracing::debug!(%pid, %process, pdbase = %Pa(u64::from(pdbase)), "process found");

            return Ok(Pa(u64::from(pdbase)));
        }

        tracing::warn!(%pid, "process not found");
        Err(WindowsError::ProcessNotFound(pid).into())
    }

    fn process_by_translation_root(
        &self,
        core: &GuestCore<Driver>,
        root: Pa,
    ) -> Result<ProcessId, GuestError> {
        let kernel_root = self.kernel_root(core)?;

        for process in self.processes(core, kernel_root) {
            let process = process?;

            let pdbase = core.read_u32((process + self.profile.offsets.pdbase, kernel_root))?;
            if Pa(u64::from(pdbase)) != root {
                continue;
            }

            let pid = ProcessId(core.read_u32((process + self.profile.offsets.pid, kernel_root))?);
            return Ok(pid);
        }

        tracing::warn!(%root, "no process owns the translation root");
        Err(WindowsError::TranslationRootNotFound(root).into())
    }
}

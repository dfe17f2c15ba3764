use crate::{Architecture, Gfn, GuestError, VcpuId};

/// A trait for implementing a guest memory-read driver.
///
/// A driver is the boundary to the hypervisor, a live VM's physical memory,
/// or a dump file. Reads are opaque synchronous calls; the core performs no
/// retries and attaches no timeouts, so cancellation has to be implemented
/// at this boundary if a caller needs it.
pub trait GuestDriver {
    /// The architecture supported by the driver.
    type Architecture: Architecture + ?Sized;

    /// Retrieves the registers of a specific virtual CPU.
    fn registers(
        &self,
        vcpu: VcpuId,
    ) -> Result<<Self::Architecture as Architecture>::Registers, GuestError>;

    /// Reads a page of memory from the guest.
    fn read_page(&self, gfn: Gfn) -> Result<MappedPage, GuestError>;
}

/// A page of guest memory returned by a driver.
#[derive(Debug, Clone)]
pub struct MappedPage(Vec<u8>);

impl MappedPage {
    /// Creates a new mapped page from its content.
    pub fn new(content: Vec<u8>) -> Self {
        Self(content)
    }
}

impl std::ops::Deref for MappedPage {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for MappedPage {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

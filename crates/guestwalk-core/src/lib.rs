//! Core guest-introspection functionality.
//!
//! This crate holds the trait seams between the translation core and its
//! collaborators (the memory-read driver, the CPU architecture, the OS
//! variant), the address types, the memory-read helpers, and the
//! translation facade ([`GuestSession`]).

pub mod arch;
mod core;
mod driver;
mod error;
pub mod os;
mod session;

use std::{cell::RefCell, num::NonZeroUsize};

use lru::LruCache;
use zerocopy::FromBytes;

pub use self::{
    arch::{Architecture, Registers},
    core::{AccessContext, Gfn, Pa, TranslationMechanism, Va, VcpuId},
    driver::{GuestDriver, MappedPage},
    error::{GuestError, PageFault, PageFaults},
    os::{GuestOs, KernelSymbol, OsFamily, ProcessId},
    session::GuestSession,
};

/// The core of the introspection session.
///
/// `GuestCore` owns the driver and the immutable per-session configuration
/// (paging mode and OS family), and provides the memory-read helpers that
/// the paging engine and the OS layers are built on. It keeps no state
/// between calls other than the pid-to-translation-root cache, so it is
/// reentrant; serializing access to a shared driver is the caller's
/// responsibility.
pub struct GuestCore<Driver>
where
    Driver: GuestDriver,
{
    driver: Driver,
    paging_mode: <Driver::Architecture as Architecture>::PagingMode,
    os_family: OsFamily,
    pid_cache: RefCell<LruCache<ProcessId, Pa>>,
}

impl<Driver> GuestCore<Driver>
where
    Driver: GuestDriver,
{
    const DEFAULT_PID_CACHE_SIZE: usize = 256;

    /// Creates a new `GuestCore` over a driver.
    ///
    /// The paging mode and the OS family are fixed for the lifetime of the
    /// core; they correspond to the per-session configuration of the
    /// embedding caller.
    pub fn new(
        driver: Driver,
        paging_mode: <Driver::Architecture as Architecture>::PagingMode,
        os_family: OsFamily,
    ) -> Self {
        Self {
            driver,
            paging_mode,
            os_family,
            pid_cache: RefCell::new(LruCache::new(
                NonZeroUsize::new(Self::DEFAULT_PID_CACHE_SIZE).unwrap(),
            )),
        }
    }

    /// Resizes the pid cache.
    ///
    /// # Panics
    ///
    /// Panics if `size` is zero.
    pub fn with_pid_cache(self, size: usize) -> Self {
        Self {
            pid_cache: RefCell::new(LruCache::new(NonZeroUsize::new(size).unwrap())),
            ..self
        }
    }

    /// Returns the driver used by this core.
    pub fn driver(&self) -> &Driver {
        &self.driver
    }

    /// Returns the configured paging mode.
    pub fn paging_mode(&self) -> <Driver::Architecture as Architecture>::PagingMode {
        self.paging_mode
    }

    /// Returns the configured OS family.
    pub fn os_family(&self) -> OsFamily {
        self.os_family
    }

    /// Retrieves the registers of a virtual CPU.
    pub fn registers(
        &self,
        vcpu: VcpuId,
    ) -> Result<<Driver::Architecture as Architecture>::Registers, GuestError> {
        self.driver.registers(vcpu)
    }

    /// Reads a page of memory from the guest.
    pub fn read_page(&self, gfn: Gfn) -> Result<MappedPage, GuestError> {
        self.driver.read_page(gfn)
    }

    /// Looks up a process in the pid cache.
    pub fn pid_cache_lookup(&self, pid: ProcessId) -> Option<Pa> {
        self.pid_cache.borrow_mut().get(&pid).copied()
    }

    /// Inserts a process into the pid cache.
    pub fn pid_cache_insert(&self, pid: ProcessId, root: Pa) {
        self.pid_cache.borrow_mut().put(pid, root);
    }

    /// Removes a specific entry from the pid cache.
    ///
    /// Returns the removed entry if it was present.
    pub fn flush_pid_cache_entry(&self, pid: ProcessId) -> Option<Pa> {
        self.pid_cache.borrow_mut().pop(&pid)
    }

    /// Clears the entire pid cache.
    ///
    /// The guest can terminate processes and recycle pids between calls;
    /// flushing keeps long-running embedders from acting on stale roots.
    pub fn flush_pid_cache(&self) {
        self.pid_cache.borrow_mut().clear();
    }

    /// Translates an access context to a physical address.
    ///
    /// Direct contexts pass through unchanged. Paging contexts are walked by
    /// the architecture in the configured paging mode; a context without an
    /// explicit root resolves the active root of vCPU 0 first and fails fast
    /// if that root is zero.
    pub fn translate_access_context(&self, ctx: impl Into<AccessContext>) -> Result<Pa, GuestError> {
        let ctx = ctx.into();

        match ctx.mechanism {
            TranslationMechanism::Direct => Ok(Pa(ctx.address)),
            TranslationMechanism::Paging { root } => {
                let root = match root {
                    Some(root) => root,
                    None => self.registers(VcpuId(0))?.translation_root(),
                };

                if root.is_null() {
                    return Err(GuestError::RootNotPresent);
                }

                Driver::Architecture::translate_address(
                    self,
                    Va(ctx.address),
                    root,
                    self.paging_mode,
                )
            }
        }
    }

    /// Reads memory from the guest.
    ///
    /// Reads spanning a page boundary are split per page; every chunk is
    /// translated independently, so a fault anywhere in the range aborts
    /// the whole read.
    pub fn read(&self, ctx: impl Into<AccessContext>, buffer: &mut [u8]) -> Result<(), GuestError> {
        let ctx = ctx.into();
        let mut position = 0usize;
        let mut remaining = buffer.len();

        while remaining > 0 {
            let address = self.translate_access_context(ctx + position as u64)?;
            let gfn = Driver::Architecture::gfn_from_pa(address);
            let offset = Driver::Architecture::pa_offset(address) as usize;

            let page = self.read_page(gfn)?;
            let page = &page[offset..];

            let size = std::cmp::min(remaining, page.len());
            buffer[position..position + size].copy_from_slice(&page[..size]);

            position += size;
            remaining -= size;
        }

        Ok(())
    }

    /// Reads a single byte from the guest.
    pub fn read_u8(&self, ctx: impl Into<AccessContext>) -> Result<u8, GuestError> {
        let mut buffer = [0u8; 1];
        self.read(ctx, &mut buffer)?;
        Ok(buffer[0])
    }

    /// Reads a 16-bit unsigned integer from the guest.
    pub fn read_u16(&self, ctx: impl Into<AccessContext>) -> Result<u16, GuestError> {
        let mut buffer = [0u8; 2];
        self.read(ctx, &mut buffer)?;
        Ok(u16::from_le_bytes(buffer))
    }

    /// Reads a 32-bit unsigned integer from the guest.
    pub fn read_u32(&self, ctx: impl Into<AccessContext>) -> Result<u32, GuestError> {
        let mut buffer = [0u8; 4];
        self.read(ctx, &mut buffer)?;
        Ok(u32::from_le_bytes(buffer))
    }

    /// Reads a 64-bit unsigned integer from the guest.
    pub fn read_u64(&self, ctx: impl Into<AccessContext>) -> Result<u64, GuestError> {
        let mut buffer = [0u8; 8];
        self.read(ctx, &mut buffer)?;
        Ok(u64::from_le_bytes(buffer))
    }

    /// Reads an unsigned integer of the specified size from the guest.
    ///
    /// The size must be 1, 2, 4, or 8 bytes. The result is widened to
    /// [`u64`].
    pub fn read_uint(&self, ctx: impl Into<AccessContext>, size: usize) -> Result<u64, GuestError> {
        match size {
            1 => self.read_u8(ctx).map(u64::from),
            2 => self.read_u16(ctx).map(u64::from),
            4 => self.read_u32(ctx).map(u64::from),
            8 => self.read_u64(ctx),
            _ => Err(GuestError::InvalidAddressWidth),
        }
    }

    /// Reads a 32-bit address from the guest.
    pub fn read_address32(&self, ctx: impl Into<AccessContext>) -> Result<u64, GuestError> {
        Ok(self.read_u32(ctx)? as u64)
    }

    /// Reads a 32-bit virtual address from the guest.
    pub fn read_va32(&self, ctx: impl Into<AccessContext>) -> Result<Va, GuestError> {
        Ok(Va(self.read_address32(ctx)?))
    }

    /// Reads a structure from the guest.
    ///
    /// The structure is reconstructed from its little-endian in-guest byte
    /// representation via [`zerocopy::FromBytes`].
    pub fn read_struct<T>(&self, ctx: impl Into<AccessContext>) -> Result<T, GuestError>
    where
        T: FromBytes,
    {
        let mut buffer = vec![0u8; size_of::<T>()];
        self.read(ctx, &mut buffer)?;

        T::read_from_bytes(&buffer).map_err(|_| GuestError::Other("invalid struct layout"))
    }
}

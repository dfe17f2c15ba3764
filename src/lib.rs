//! Guest virtual-address translation and kernel-object resolution for
//! virtual machine introspection.
//!
//! This crate re-exports the `guestwalk-*` member crates:
//!
//! - [`guestwalk_core`] (re-exported at the root): the driver, architecture
//!   and OS trait seams, address types, memory-read helpers and the
//!   translation facade.
//! - [`arch_x86`]: IA-32 paging (non-PAE and PAE) and the non-resident
//!   page-table-entry classifier.
//! - [`os_windows`]: EPROCESS list traversal and two-stage kernel symbol
//!   resolution.
//! - [`os_linux`]: delegation to external symbol and task lookups, with a
//!   `System.map` parser.

pub use guestwalk_core::*;

#[cfg(feature = "arch-x86")]
pub use guestwalk_arch_x86 as arch_x86;

#[cfg(feature = "os-linux")]
pub use guestwalk_os_linux as os_linux;

#[cfg(feature = "os-windows")]
pub use guestwalk_os_windows as os_windows;

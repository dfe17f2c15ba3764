use std::collections::HashMap;

use guestwalk_core::Va;
use serde::{Deserialize, Serialize};

/// Field offsets within `_EPROCESS`.
///
/// The offsets vary between Windows builds and are supplied by the
/// embedding caller, typically out of a profile file keyed by the guest's
/// kernel version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EprocessOffsets {
    /// Offset of `ActiveProcessLinks` (the `LIST_ENTRY` threading the
    /// process list).
    pub tasks: u64,

    /// Offset of `UniqueProcessId`.
    pub pid: u64,

    /// Offset of `Pcb.DirectoryTableBase` (the page-directory base within
    /// the embedded `_KPROCESS`).
    pub pdbase: u64,
}

/// Location of the KPCR and the debugger data block reachable from it.
///
/// The KPCR sits at a fixed virtual address on 32-bit Windows and holds a
/// pointer to the `KdVersionBlock`; a handful of well-known kernel globals
/// are reachable as fields of that block without touching the export table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct KpcrProfile {
    /// The virtual address of the KPCR (`0xffdff000` on 32-bit Windows).
    pub base: Va,

    /// Offset of the `KdVersionBlock` pointer within the KPCR.
    pub version_block: u64,

    /// Offsets of named kernel globals within the debugger data block.
    pub debugger_data: HashMap<String, u64>,
}

/// Everything the resolver needs to know about a concrete Windows build.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WindowsProfile {
    /// The virtual base address of the kernel image (`ntoskrnl.exe`).
    pub kernel_base: Va,

    /// The virtual address of `PsActiveProcessHead`.
    pub process_head: Va,

    /// Field offsets within `_EPROCESS`.
    pub offsets: EprocessOffsets,

    /// KPCR location, when known for this build.
    ///
    /// Without it, symbol resolution goes straight to the export table.
    pub kpcr: Option<KpcrProfile>,
}

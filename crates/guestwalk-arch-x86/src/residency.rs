//! Classification of non-present page-table entries.
//!
//! Windows encodes the whereabouts of a paged-out page in the software bits
//! of the non-present entry. The classification is diagnostic only: it never
//! changes the outcome of a walk (the walk has already failed), it merely
//! explains where the page went. The heuristic follows Jesse Kornblum's
//! "Using every part of the buffalo in Windows memory analysis".

use guestwalk_core::OsFamily;

use crate::paging::{PageTableEntry, PageTableLevel};

/// The disposition of a page behind a non-present page-table entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PteDisposition {
    /// The page is swapped out to a paging file.
    PagedOut {
        /// The index of the paging file holding the page.
        pagefile: u32,

        /// The frame within the paging file.
        frame: u32,
    },

    /// The page is allocated but has never been written (demand zero).
    DemandZero,

    /// The page is in transition: still in memory, on its way in or out.
    Transition,

    /// The entry defers to a prototype PTE in the owning section object.
    Prototype,

    /// The entry is entirely zero; the address is simply unmapped.
    Zero,

    /// The bit pattern matches no known encoding.
    Unknown,
}

/// Classifies a non-present page-table entry.
///
/// The prototype encoding is only recognized at the page-directory level;
/// at other levels the same bit pattern is reported as unknown.
pub fn classify(entry: PageTableEntry, level: PageTableLevel) -> PteDisposition {
    if entry.0 == 0 {
        return PteDisposition::Zero;
    }

    if !entry.transition() && !entry.prototype() {
        let pagefile = entry.pagefile_index();
        let frame = entry.pagefile_frame();

        return match (pagefile, frame) {
            (0, 0) => PteDisposition::DemandZero,
            (pagefile, frame) if pagefile != 0 && frame != 0 => {
                PteDisposition::PagedOut { pagefile, frame }
            }
            _ => PteDisposition::Unknown,
        };
    }

    if entry.transition() && !entry.prototype() {
        return PteDisposition::Transition;
    }

    if level == PageTableLevel::Pd && entry.prototype() {
        return PteDisposition::Prototype;
    }

    PteDisposition::Unknown
}

/// Logs the disposition of a non-present entry encountered during a walk.
///
/// The software-bit encoding is Windows-specific; for other OS families the
/// bits carry no portable meaning and nothing is reported.
pub(crate) fn report_nonresident(os: OsFamily, entry: PageTableEntry, level: PageTableLevel) {
    if os != OsFamily::Windows {
        return;
    }

    let disposition = classify(entry, level);
    tracing::debug!(?disposition, ?level, raw = %format_args!("0x{:x}", entry.0), "non-resident page-table entry");
}

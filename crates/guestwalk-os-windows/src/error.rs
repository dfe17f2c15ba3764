use guestwalk_core::{GuestError, Pa, ProcessId};

use crate::pe::PeError;

/// Error types for Windows kernel-object resolution.
#[derive(thiserror::Error, Debug)]
pub enum WindowsError {
    /// The process list was exhausted without finding the pid.
    #[error("Process {0} not found")]
    ProcessNotFound(ProcessId),

    /// No process in the list owns the given translation root.
    #[error("No process owns translation root {0}")]
    TranslationRootNotFound(Pa),

    /// The symbol is in neither the debugger data nor the export table.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// PE parsing error.
    #[error(transparent)]
    Pe(#[from] PeError),
}

impl From<WindowsError> for GuestError {
    fn from(value: WindowsError) -> Self {
        GuestError::Os(value.into())
    }
}

impl From<PeError> for GuestError {
    fn from(value: PeError) -> Self {
        GuestError::Os(WindowsError::from(value).into())
    }
}

use guestwalk_core::{GuestError, Pa, ProcessId};

/// Error types for Linux kernel-object resolution.
#[derive(thiserror::Error, Debug)]
pub enum LinuxError {
    /// The symbol source does not know the symbol.
    #[error("Symbol not found: {0}")]
    SymbolNotFound(String),

    /// The task source does not know the process.
    #[error("Process {0} not found")]
    ProcessNotFound(ProcessId),

    /// No process owns the given translation root.
    #[error("No process owns translation root {0}")]
    TranslationRootNotFound(Pa),
}

impl From<LinuxError> for GuestError {
    fn from(value: LinuxError) -> Self {
        GuestError::Os(value.into())
    }
}

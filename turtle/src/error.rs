use core::fmt;

/// A raw error code reported by the host platform (a Win32 error code).
#[derive(Copy, Clone, Eq, PartialEq, Hash)]
pub struct HostError(pub u32);

impl HostError {
    pub const NOT_ENOUGH_MEMORY: HostError = HostError(8);
    pub const INVALID_WINDOW_HANDLE: HostError = HostError(1400);
    pub const CANNOT_FIND_WND_CLASS: HostError = HostError(1407);
    pub const CLASS_ALREADY_EXISTS: HostError = HostError(1410);

    pub fn code(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HostError({})", self.0)
    }
}

impl fmt::Display for HostError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "platform error {} (0x{:x})", self.0, self.0)
    }
}

impl std::error::Error for HostError {}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The platform refused to create a window handle.
    #[error("failed to create window: {0}")]
    Creation(#[source] HostError),

    /// Setup after creation failed. The half-built window was destroyed
    /// before this was returned.
    #[error("failed to initialize window: {0}")]
    Initialization(#[source] HostError),

    /// The back-reference could not be repointed. Neither wrapper changed.
    #[error("failed to move window: {0}")]
    Move(#[source] HostError),

    #[error("failed to register window class {class:?}: {source}")]
    Registration { class: String, source: HostError },

    #[error("failed to retrieve message: {0}")]
    Retrieval(#[source] HostError),
}

pub type Result<T> = core::result::Result<T, Error>;

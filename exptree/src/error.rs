//! Error types for the exponential tree core.

/// Errors that can surface from tree operations.
///
/// `get` never allocates and is therefore total; only `put` can fail, and only
/// with `OutOfMemory`.
#[derive(Debug)]
pub enum Error {
    /// The arena could not satisfy a raw allocation request.
    OutOfMemory,
    /// A computed node layout overflowed `isize::MAX` or violated alignment
    /// requirements. Surfaced separately from `OutOfMemory` since it signals
    /// a `K`/`V` type that is unusable for this tree, not a transient
    /// resource exhaustion.
    InvalidLayout,
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::OutOfMemory => write!(f, "exponential tree: allocation failed"),
            Error::InvalidLayout => write!(f, "exponential tree: invalid node layout for K/V"),
        }
    }
}

impl std::error::Error for Error {}

impl From<std::alloc::LayoutError> for Error {
    fn from(_: std::alloc::LayoutError) -> Self {
        Error::InvalidLayout
    }
}

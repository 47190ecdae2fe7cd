//! Error types for the diff crate.

/// Errors that can occur during diff operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DiffError {
    /// A pending comparison had neither an original nor a current side.
    /// This indicates a defect in the caller, not bad input.
    #[error("unreachable diff state at path {path:?}")]
    UnreachableState { path: String },

    /// A mutation targeted a path whose parent does not exist.
    #[error("path not found: {0}")]
    PathNotFound(String),

    /// A mutation targeted a path that runs through a leaf value.
    #[error("cannot descend into leaf at {0}")]
    NotABranch(String),
}

/// Convenience alias for diff results.
pub type DiffResult<T> = Result<T, DiffError>;

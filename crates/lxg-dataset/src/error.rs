//! Error types for the dataset crate.

use lxg_types::RowKey;

/// Errors that can occur during dataset operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DataSetError {
    /// A positional operation referenced a row that does not exist.
    #[error("row index {index} out of range (len {len})")]
    IndexOutOfRange { index: usize, len: usize },

    /// No row carries the given key.
    #[error("row not found: {0}")]
    RowNotFound(RowKey),

    /// A row with this key is already present.
    #[error("duplicate row key: {0}")]
    DuplicateKey(RowKey),

    /// The diff engine reported a defect while computing mutations.
    #[error("diff error: {0}")]
    Diff(#[from] lxg_diff::DiffError),
}

/// Convenience alias for dataset results.
pub type DataSetResult<T> = Result<T, DataSetError>;

//! Error types for the catalog crate.

use lxg_types::RowKey;

/// Errors that can occur while building or exporting a catalog.
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// The document is not valid JSON.
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// A translation document must have an object at its root.
    #[error("document for {language} is a {found}, expected an object")]
    NotAnObject {
        language: String,
        found: &'static str,
    },

    /// A key is used both as a leaf and as the parent of other keys.
    #[error("key conflict at {key}: used both as a value and as a group")]
    Conflict { key: String },

    /// A language column would overwrite the key column.
    #[error("language {language} has the same name as the key column")]
    ReservedLanguage { language: String },

    /// A row has no usable translation key.
    #[error("row {0} has no translation key")]
    MissingKey(RowKey),

    /// Building the dataset failed.
    #[error("dataset error: {0}")]
    DataSet(#[from] lxg_dataset::DataSetError),
}

/// Convenience alias for catalog results.
pub type CatalogResult<T> = Result<T, CatalogError>;

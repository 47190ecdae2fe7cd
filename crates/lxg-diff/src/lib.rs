//! Diff engine for Lexigrid.
//!
//! Compares an original nested value against its current version and
//! produces one [`Mutation`] per path where they disagree. Paths are dotted
//! (`menu.file.open`), matching the convention for nested translation keys.
//!
//! # Key Types
//!
//! - [`DiffIter`] -- Lazy iterator over mutations, paired by key identity
//! - [`Mutation`] / [`MutationKind`] -- One added/updated/removed change
//! - [`ChangeSet`] -- A collected list of mutations with per-kind counts
//! - [`MutationRecord`] -- Serializable boundary shape of a mutation

pub mod apply;
pub mod error;
pub mod mutation;
pub mod value_diff;

pub use apply::{apply_all, apply_mutation};
pub use error::{DiffError, DiffResult};
pub use mutation::{ChangeSet, Mutation, MutationKind, MutationRecord};
pub use value_diff::{diff_branches, diff_values, DiffIter, ValueRef};

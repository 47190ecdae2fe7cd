//! Tabular data engine for Lexigrid.
//!
//! A [`DataSet`] owns the live rows of a translation grid together with the
//! snapshot they were loaded from. It derives two memoized views: the
//! presentation tree ([`DataSet::value`], sorted then grouped) and the change
//! set against the snapshot ([`DataSet::mutations`]).
//!
//! # Key Types
//!
//! - [`DataSet`] -- Rows, snapshot, sort/group criteria, derived views
//! - [`Node`] / [`GroupNode`] -- Presentation tree of rows and groups
//! - [`SortSpec`] / [`GroupSpec`] -- View criteria
//! - [`CellEditor`] -- Per-cell trailing debounce in front of [`DataSet::mutate_key`]

pub mod dataset;
pub mod edit;
pub mod error;
pub mod group;
pub mod node;
pub mod sort;

pub use dataset::{DataSet, DataSetEvent, ViewStats};
pub use edit::{CellAddress, CellEditor};
pub use error::{DataSetError, DataSetResult};
pub use group::{group_by_path, group_by_value, GroupFn, GroupSpec};
pub use node::{flatten_keys, GroupNode, Node};
pub use sort::{compare_values, Comparator, SortSpec};

//! Translation catalogs for Lexigrid.
//!
//! The grid engine consumes a flat mapping of dotted keys to per-language
//! values and hands the same shape back. This crate converts between that
//! mapping, nested per-language JSON documents, and [`DataSet`] rows.
//!
//! [`DataSet`]: lxg_dataset::DataSet

pub mod catalog;
pub mod error;
pub mod flatten;

pub use catalog::Catalog;
pub use error::{CatalogError, CatalogResult};
pub use flatten::{flatten, unflatten, Outline, Shape};

//! Foundation types for Lexigrid, the translation-grid engine.
//!
//! This crate provides the value model and the small reactive building
//! blocks shared by every other Lexigrid crate.
//!
//! # Key Types
//!
//! - [`Value`] -- Recursive cell value (`Null`, scalars, or a nested [`Branch`])
//! - [`Row`] / [`RowKey`] -- A keyed record of column cells
//! - [`DottedPath`] -- Path segments joined with `.` (e.g. `menu.file.open`)
//! - [`GridConfig`] -- Editor configuration (debounce, multi-select, key column)
//! - [`Subscribers`] / [`Memo`] -- Observer registry and version-checked memo cell

pub mod config;
pub mod error;
pub mod observe;
pub mod path;
pub mod row;
pub mod value;

pub use config::GridConfig;
pub use error::{TypeError, TypeResult};
pub use observe::{Memo, SubscriptionId, Subscribers, Version};
pub use path::DottedPath;
pub use row::{Row, RowKey};
pub use value::{Branch, Value};

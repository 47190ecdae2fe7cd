//! Selection model for Lexigrid.
//!
//! Tracks which row keys are selected and how pointer clicks combined with
//! held modifier keys change that set. Range selection (shift-click) is
//! computed over the rendered order the host supplies through
//! [`SelectionModel::set_visible`], which reflects the current sort and
//! grouping rather than the underlying row order.
//!
//! # Key Types
//!
//! - [`SelectionModel`] -- Selected keys, visible order, anchor, modifiers
//! - [`SelectMode`] -- Normal (replace), Append (union), Toggle (symmetric difference)
//! - [`Modifiers`] / [`ModifierKey`] -- Held-key bitmask consulted at click time

pub mod model;
pub mod modifiers;

pub use model::{SelectMode, SelectionEvent, SelectionModel};
pub use modifiers::{ModifierKey, Modifiers};

//! Apply mutations back onto an original branch.
//!
//! `apply_all(&mut original, &diff_branches(&original, &current)?)` leaves
//! `original` equal to `current`, up to the null/absent equivalence the diff
//! itself uses.

use lxg_types::{Branch, DottedPath, Value};

use crate::error::{DiffError, DiffResult};
use crate::mutation::{ChangeSet, Mutation};

/// Apply a single mutation to `target`.
///
/// `Added` and `Updated` write the new value at the path, creating nothing
/// but the final segment. `Removed` deletes the final segment; removing a
/// path that is already absent is not an error.
pub fn apply_mutation(target: &mut Branch, mutation: &Mutation) -> DiffResult<()> {
    let path = mutation.path();
    let (last, parent_path) = path
        .segments()
        .split_last()
        .ok_or_else(|| DiffError::PathNotFound(path.to_string()))?;
    let parent = descend(target, parent_path, path)?;

    match mutation {
        Mutation::Added { value, .. } | Mutation::Updated { value, .. } => {
            parent.insert(last.clone(), value.clone());
        }
        Mutation::Removed { .. } => {
            parent.shift_remove(last);
        }
    }
    Ok(())
}

/// Apply every mutation in order.
pub fn apply_all(target: &mut Branch, changes: &ChangeSet) -> DiffResult<()> {
    for mutation in changes {
        apply_mutation(target, mutation)?;
    }
    Ok(())
}

fn descend<'a>(
    mut branch: &'a mut Branch,
    segments: &[String],
    full: &DottedPath,
) -> DiffResult<&'a mut Branch> {
    for (depth, segment) in segments.iter().enumerate() {
        let here = || segments[..=depth].iter().cloned().collect::<DottedPath>();
        branch = match branch.get_mut(segment) {
            Some(Value::Branch(child)) => child,
            Some(_) => return Err(DiffError::NotABranch(here().to_string())),
            None => return Err(DiffError::PathNotFound(full.to_string())),
        };
    }
    Ok(branch)
}

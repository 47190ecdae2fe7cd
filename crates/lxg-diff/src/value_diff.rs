//! Value-level diff: walk an original and a current value in parallel.
//!
//! At each branch level, entries are paired by key identity: every key of the
//! original is visited in the original's order alongside the current entry of
//! the same name, then keys present only in the current value follow in the
//! current value's order. Reordering the entries of a branch therefore never
//! produces a mutation.
//!
//! Classification of a pair:
//!
//! | original      | current       | result                       |
//! |---------------|---------------|------------------------------|
//! | absent        | non-null      | `Added` (whole subtree)      |
//! | non-null      | absent        | `Removed` (whole subtree)    |
//! | absent/null   | absent/null   | nothing                      |
//! | branch        | branch        | recurse                      |
//! | null          | non-null      | `Added`                      |
//! | non-null      | null          | `Removed`                    |
//! | equal leaves  |               | nothing                      |
//! | otherwise     |               | `Updated`                    |

use std::collections::VecDeque;

use lxg_types::{Branch, DottedPath, Value};

use crate::error::{DiffError, DiffResult};
use crate::mutation::{ChangeSet, Mutation};

/// A borrowed side of a comparison.
///
/// Rows store their cells as a bare [`Branch`], so a comparison side may be
/// either a full [`Value`] or a branch that is not wrapped in one.
#[derive(Clone, Copy, Debug)]
pub enum ValueRef<'a> {
    Value(&'a Value),
    Branch(&'a Branch),
}

impl<'a> ValueRef<'a> {
    fn as_branch(self) -> Option<&'a Branch> {
        match self {
            ValueRef::Value(Value::Branch(b)) | ValueRef::Branch(b) => Some(b),
            ValueRef::Value(_) => None,
        }
    }

    fn is_null(self) -> bool {
        matches!(self, ValueRef::Value(Value::Null))
    }

    fn leaf_eq(self, other: ValueRef<'_>) -> bool {
        match (self, other) {
            (ValueRef::Value(a), ValueRef::Value(b)) => a == b,
            _ => false,
        }
    }

    /// Clone into an owned value.
    pub fn to_value(self) -> Value {
        match self {
            ValueRef::Value(v) => v.clone(),
            ValueRef::Branch(b) => Value::Branch(b.clone()),
        }
    }
}

impl<'a> From<&'a Value> for ValueRef<'a> {
    fn from(v: &'a Value) -> Self {
        ValueRef::Value(v)
    }
}

impl<'a> From<&'a Branch> for ValueRef<'a> {
    fn from(b: &'a Branch) -> Self {
        ValueRef::Branch(b)
    }
}

struct Pending<'a> {
    path: DottedPath,
    original: Option<ValueRef<'a>>,
    current: Option<ValueRef<'a>>,
}

/// Lazy iterator over the mutations between seeded pairs of values.
///
/// Work is kept on an explicit queue, so deep nesting does not recurse.
/// Children of a branch pair are expanded only when the pair is reached,
/// and their mutations are yielded before the next sibling pair.
///
/// If a seeded pair has neither side the iterator yields
/// [`DiffError::UnreachableState`] once and then ends.
pub struct DiffIter<'a> {
    queue: VecDeque<Pending<'a>>,
    failed: bool,
}

impl<'a> Default for DiffIter<'a> {
    fn default() -> Self {
        Self {
            queue: VecDeque::new(),
            failed: false,
        }
    }
}

impl<'a> DiffIter<'a> {
    /// An iterator with nothing queued.
    pub fn new() -> Self {
        Self::default()
    }

    /// Diff two values from the root path.
    pub fn between(original: &'a Value, current: &'a Value) -> Self {
        let mut iter = Self::new();
        iter.push(DottedPath::root(), Some(original.into()), Some(current.into()));
        iter
    }

    /// Diff two branches from the root path.
    pub fn between_branches(original: &'a Branch, current: &'a Branch) -> Self {
        let mut iter = Self::new();
        iter.push(DottedPath::root(), Some(original.into()), Some(current.into()));
        iter
    }

    /// Queue a pair to compare at `path`, after everything already queued.
    pub fn push(
        &mut self,
        path: DottedPath,
        original: Option<ValueRef<'a>>,
        current: Option<ValueRef<'a>>,
    ) {
        self.queue.push_back(Pending {
            path,
            original,
            current,
        });
    }

    /// Queue the children of a branch pair ahead of the remaining work.
    fn expand(&mut self, path: &DottedPath, original: &'a Branch, current: &'a Branch) {
        let mut children = Vec::with_capacity(original.len().max(current.len()));

        for (name, old) in original {
            children.push(Pending {
                path: path.child(name.as_str()),
                original: Some(old.into()),
                current: current.get(name).map(ValueRef::from),
            });
        }
        for (name, new) in current {
            if !original.contains_key(name) {
                children.push(Pending {
                    path: path.child(name.as_str()),
                    original: None,
                    current: Some(new.into()),
                });
            }
        }

        for child in children.into_iter().rev() {
            self.queue.push_front(child);
        }
    }
}

impl<'a> Iterator for DiffIter<'a> {
    type Item = DiffResult<Mutation>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed {
            return None;
        }

        while let Some(Pending {
            path,
            original,
            current,
        }) = self.queue.pop_front()
        {
            let (old, new) = match (original, current) {
                (None, None) => {
                    self.failed = true;
                    tracing::error!(path = %path, "diff pair with no sides");
                    return Some(Err(DiffError::UnreachableState {
                        path: path.to_string(),
                    }));
                }
                (None, Some(new)) if new.is_null() => continue,
                (Some(old), None) if old.is_null() => continue,
                (None, Some(new)) => {
                    return Some(Ok(Mutation::Added {
                        path,
                        value: new.to_value(),
                    }));
                }
                (Some(old), None) => {
                    return Some(Ok(Mutation::Removed {
                        path,
                        original: old.to_value(),
                    }));
                }
                (Some(old), Some(new)) => (old, new),
            };

            if let (Some(old_branch), Some(new_branch)) = (old.as_branch(), new.as_branch()) {
                self.expand(&path, old_branch, new_branch);
                continue;
            }

            let mutation = match (old.is_null(), new.is_null()) {
                (true, true) => continue,
                (true, false) => Mutation::Added {
                    path,
                    value: new.to_value(),
                },
                (false, true) => Mutation::Removed {
                    path,
                    original: old.to_value(),
                },
                (false, false) if old.leaf_eq(new) => continue,
                (false, false) => Mutation::Updated {
                    path,
                    original: old.to_value(),
                    value: new.to_value(),
                },
            };
            return Some(Ok(mutation));
        }

        None
    }
}

/// Compute the full change set between two values.
pub fn diff_values(original: &Value, current: &Value) -> DiffResult<ChangeSet> {
    DiffIter::between(original, current).collect()
}

/// Compute the full change set between two branches.
pub fn diff_branches(original: &Branch, current: &Branch) -> DiffResult<ChangeSet> {
    DiffIter::between_branches(original, current).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mutation::MutationKind;
    use serde_json::json;

    fn v(json: serde_json::Value) -> Value {
        Value::from(json)
    }

    #[test]
    fn identical_values_no_diff() {
        let value = v(json!({"menu": {"open": "Open", "close": "Close"}, "n": 1}));
        assert!(diff_values(&value, &value).unwrap().is_empty());
    }

    #[test]
    fn nested_leaf_update_uses_dotted_key() {
        let old = v(json!({"menu": {"file": {"open": "Open"}}}));
        let new = v(json!({"menu": {"file": {"open": "Open file"}}}));

        let diff = diff_values(&old, &new).unwrap();
        assert_eq!(diff.len(), 1);
        match &diff.mutations[0] {
            Mutation::Updated {
                path,
                original,
                value,
            } => {
                assert_eq!(path.to_string(), "menu.file.open");
                assert_eq!(*original, Value::from("Open"));
                assert_eq!(*value, Value::from("Open file"));
            }
            other => panic!("expected Updated, got {:?}", other),
        }
    }

    #[test]
    fn null_transitions_are_added_and_removed() {
        let old = v(json!({"a": null, "b": "x"}));
        let new = v(json!({"a": "y", "b": null}));

        let diff = diff_values(&old, &new).unwrap();
        assert_eq!(diff.get("a").map(Mutation::kind), Some(MutationKind::Added));
        assert_eq!(diff.get("b").map(Mutation::kind), Some(MutationKind::Removed));
    }

    #[test]
    fn absent_and_null_are_equivalent() {
        let old = v(json!({"a": null}));
        let new = v(json!({"b": null}));
        assert!(diff_values(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn missing_keys_emit_whole_subtrees() {
        let old = v(json!({"keep": 1, "gone": {"x": 1, "y": 2}}));
        let new = v(json!({"keep": 1, "fresh": {"z": 3}}));

        let diff = diff_values(&old, &new).unwrap();
        assert_eq!(diff.len(), 2);
        assert_eq!(
            diff.get("gone").and_then(Mutation::original),
            Some(&v(json!({"x": 1, "y": 2})))
        );
        assert_eq!(
            diff.get("fresh").and_then(Mutation::value),
            Some(&v(json!({"z": 3})))
        );
    }

    #[test]
    fn reordered_keys_are_not_a_change() {
        let old = v(json!({"a": 1, "b": 2, "c": 3}));
        let new = v(json!({"c": 3, "a": 1, "b": 2}));
        assert!(diff_values(&old, &new).unwrap().is_empty());
    }

    #[test]
    fn leaf_to_branch_is_an_update() {
        let old = v(json!({"title": "Menu"}));
        let new = v(json!({"title": {"short": "Menu"}}));

        let diff = diff_values(&old, &new).unwrap();
        assert_eq!(diff.updates(), 1);
        assert_eq!(diff.mutations[0].key(), "title");
    }

    #[test]
    fn mutations_follow_depth_first_order() {
        let old = v(json!({"a": {"x": 1, "y": 1}, "b": 1}));
        let new = v(json!({"a": {"x": 2, "y": 2}, "b": 2, "c": 1}));

        let keys: Vec<String> = diff_values(&old, &new)
            .unwrap()
            .iter()
            .map(Mutation::key)
            .collect();
        assert_eq!(keys, ["a.x", "a.y", "b", "c"]);
    }

    #[test]
    fn iterator_is_lazy() {
        let old = v(json!({"a": 1, "b": 1, "c": 1}));
        let new = v(json!({"a": 2, "b": 2, "c": 2}));

        let mut iter = DiffIter::between(&old, &new);
        let first = iter.next().unwrap().unwrap();
        assert_eq!(first.key(), "a");
        assert_eq!(iter.count(), 2);
    }

    #[test]
    fn empty_pair_is_unreachable() {
        let old = Value::from(1);
        let new = Value::from(1);
        let mut iter = DiffIter::new();
        iter.push(DottedPath::parse("ok"), Some((&old).into()), Some((&new).into()));
        iter.push(DottedPath::parse("broken"), None, None);
        iter.push(DottedPath::parse("after"), None, Some((&new).into()));

        let err = iter.next().unwrap().unwrap_err();
        assert_eq!(
            err,
            DiffError::UnreachableState {
                path: "broken".into()
            }
        );
        assert!(iter.next().is_none());
    }

    #[test]
    fn branch_refs_compare_like_values() {
        let old: Branch = [("en".to_string(), Value::from("Save"))].into_iter().collect();
        let new: Branch = [("en".to_string(), Value::from("Store"))].into_iter().collect();

        let diff = diff_branches(&old, &new).unwrap();
        assert_eq!(diff.len(), 1);
        assert_eq!(diff.mutations[0].key(), "en");
    }

    mod properties {
        use super::*;
        use crate::apply::apply_all;
        use proptest::prelude::*;

        fn leaf() -> impl Strategy<Value = Value> {
            prop_oneof![
                Just(Value::Null),
                any::<bool>().prop_map(Value::Bool),
                any::<i32>().prop_map(Value::from),
                "[a-z]{0,6}".prop_map(Value::Text),
            ]
        }

        fn tree() -> impl Strategy<Value = Value> {
            leaf().prop_recursive(3, 24, 4, |inner| {
                prop::collection::vec(("[a-d]", inner), 0..4)
                    .prop_map(|entries| Value::branch(entries))
            })
        }

        fn branch() -> impl Strategy<Value = Branch> {
            prop::collection::vec(("[a-e]", tree()), 0..5)
                .prop_map(|entries| entries.into_iter().collect())
        }

        proptest! {
            #[test]
            fn diff_with_self_is_empty(x in tree()) {
                prop_assert!(diff_values(&x, &x).unwrap().is_empty());
            }

            #[test]
            fn applying_diff_reproduces_current(a in branch(), b in branch()) {
                let diff = diff_branches(&a, &b).unwrap();
                let mut rebuilt = a.clone();
                apply_all(&mut rebuilt, &diff).unwrap();
                prop_assert_eq!(strip_nulls(rebuilt), strip_nulls(b));
            }
        }

        /// Null and absent are the same state for the diff, so compare
        /// with both collapsed to absent.
        fn strip_nulls(branch: Branch) -> Branch {
            branch
                .into_iter()
                .filter(|(_, v)| !v.is_null())
                .map(|(k, v)| match v {
                    Value::Branch(inner) => (k, Value::Branch(strip_nulls(inner))),
                    other => (k, other),
                })
                .collect()
        }
    }
}

//! Mutation records and collected change sets.

use serde::{Deserialize, Serialize};

use lxg_types::{DottedPath, Value};

/// The kind of a single change.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MutationKind {
    Added,
    Updated,
    Removed,
}

/// A single change between an original value and its current version.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Mutation {
    /// The path exists only in the current value (or was null originally).
    Added { path: DottedPath, value: Value },
    /// Both sides hold a value at the path and they differ.
    Updated {
        path: DottedPath,
        original: Value,
        value: Value,
    },
    /// The path exists only in the original (or is null now).
    Removed { path: DottedPath, original: Value },
}

impl Mutation {
    pub fn path(&self) -> &DottedPath {
        match self {
            Mutation::Added { path, .. }
            | Mutation::Updated { path, .. }
            | Mutation::Removed { path, .. } => path,
        }
    }

    /// The dotted-path key, e.g. `3.en` or `menu.file.open.de`.
    pub fn key(&self) -> String {
        self.path().to_string()
    }

    pub fn kind(&self) -> MutationKind {
        match self {
            Mutation::Added { .. } => MutationKind::Added,
            Mutation::Updated { .. } => MutationKind::Updated,
            Mutation::Removed { .. } => MutationKind::Removed,
        }
    }

    /// The current value, absent for removals.
    pub fn value(&self) -> Option<&Value> {
        match self {
            Mutation::Added { value, .. } | Mutation::Updated { value, .. } => Some(value),
            Mutation::Removed { .. } => None,
        }
    }

    /// The original value, absent for additions.
    pub fn original(&self) -> Option<&Value> {
        match self {
            Mutation::Updated { original, .. } | Mutation::Removed { original, .. } => {
                Some(original)
            }
            Mutation::Added { .. } => None,
        }
    }

    /// The serializable boundary form of this mutation.
    pub fn to_record(&self) -> MutationRecord {
        MutationRecord {
            key: self.key(),
            kind: self.kind(),
            value: self.value().cloned(),
            original: self.original().cloned(),
        }
    }
}

/// `{ key, kind, value?, original? }` as handed to the presentation layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MutationRecord {
    pub key: String,
    pub kind: MutationKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original: Option<Value>,
}

/// A collected list of mutations.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ChangeSet {
    pub mutations: Vec<Mutation>,
}

impl ChangeSet {
    /// Create an empty change set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `true` if there are no changes.
    pub fn is_empty(&self) -> bool {
        self.mutations.is_empty()
    }

    /// Number of changes.
    pub fn len(&self) -> usize {
        self.mutations.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Mutation> {
        self.mutations.iter()
    }

    /// Find the mutation at a dotted key.
    pub fn get(&self, key: &str) -> Option<&Mutation> {
        self.mutations.iter().find(|m| m.key() == key)
    }

    /// Number of added paths.
    pub fn additions(&self) -> usize {
        self.count(MutationKind::Added)
    }

    /// Number of removed paths.
    pub fn removals(&self) -> usize {
        self.count(MutationKind::Removed)
    }

    /// Number of updated paths.
    pub fn updates(&self) -> usize {
        self.count(MutationKind::Updated)
    }

    pub fn records(&self) -> Vec<MutationRecord> {
        self.mutations.iter().map(Mutation::to_record).collect()
    }

    fn count(&self, kind: MutationKind) -> usize {
        self.mutations.iter().filter(|m| m.kind() == kind).count()
    }
}

impl FromIterator<Mutation> for ChangeSet {
    fn from_iter<I: IntoIterator<Item = Mutation>>(iter: I) -> Self {
        Self {
            mutations: iter.into_iter().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a ChangeSet {
    type Item = &'a Mutation;
    type IntoIter = std::slice::Iter<'a, Mutation>;

    fn into_iter(self) -> Self::IntoIter {
        self.mutations.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn record_omits_missing_sides() {
        let added = Mutation::Added {
            path: DottedPath::parse("0.amount"),
            value: Value::from(5),
        };
        let json = serde_json::to_value(added.to_record()).unwrap();
        assert_eq!(json, json!({"key": "0.amount", "kind": "added", "value": 5}));
    }

    #[test]
    fn updated_record_carries_both_values() {
        let updated = Mutation::Updated {
            path: DottedPath::parse("menu.open.en"),
            original: Value::from("Open"),
            value: Value::from("Open…"),
        };
        let record = updated.to_record();
        assert_eq!(record.kind, MutationKind::Updated);
        assert_eq!(record.original, Some(Value::from("Open")));
        assert_eq!(record.value, Some(Value::from("Open…")));
    }

    #[test]
    fn change_set_counts_by_kind() {
        let set: ChangeSet = vec![
            Mutation::Added {
                path: DottedPath::parse("a"),
                value: Value::from(1),
            },
            Mutation::Removed {
                path: DottedPath::parse("b"),
                original: Value::from(2),
            },
            Mutation::Removed {
                path: DottedPath::parse("c"),
                original: Value::from(3),
            },
        ]
        .into_iter()
        .collect();

        assert_eq!(set.len(), 3);
        assert_eq!(set.additions(), 1);
        assert_eq!(set.removals(), 2);
        assert_eq!(set.updates(), 0);
        assert!(set.get("c").is_some());
        assert!(set.get("d").is_none());
    }
}

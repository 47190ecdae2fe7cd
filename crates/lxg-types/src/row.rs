use std::fmt;

use serde::{Deserialize, Serialize};

use crate::value::{Branch, Value};

/// Stable identity of a row.
///
/// Survives sorting, grouping and cell mutation. Rows loaded positionally
/// are keyed by their insertion index; rows loaded from a catalog are keyed
/// by their translation key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RowKey {
    Index(u64),
    Name(String),
}

impl RowKey {
    pub fn as_index(&self) -> Option<u64> {
        match self {
            RowKey::Index(i) => Some(*i),
            RowKey::Name(_) => None,
        }
    }
}

impl fmt::Display for RowKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RowKey::Index(i) => write!(f, "{i}"),
            RowKey::Name(n) => f.write_str(n),
        }
    }
}

impl From<u64> for RowKey {
    fn from(i: u64) -> Self {
        RowKey::Index(i)
    }
}

impl From<&str> for RowKey {
    fn from(name: &str) -> Self {
        RowKey::Name(name.to_string())
    }
}

impl From<String> for RowKey {
    fn from(name: String) -> Self {
        RowKey::Name(name)
    }
}

/// A keyed record: column name to cell value.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Row {
    pub key: RowKey,
    pub cells: Branch,
}

impl Row {
    pub fn new(key: impl Into<RowKey>, cells: Branch) -> Self {
        Self {
            key: key.into(),
            cells,
        }
    }

    /// The cell in `column`, if present.
    pub fn get(&self, column: &str) -> Option<&Value> {
        self.cells.get(column)
    }

    /// Write a cell, returning the previous value.
    pub fn set(&mut self, column: impl Into<String>, value: Value) -> Option<Value> {
        self.cells.insert(column.into(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_display_as_index_or_name() {
        assert_eq!(RowKey::Index(7).to_string(), "7");
        assert_eq!(RowKey::from("menu.file").to_string(), "menu.file");
    }

    #[test]
    fn set_replaces_existing_cell() {
        let mut row = Row::new(0u64, Branch::new());
        assert_eq!(row.set("en", Value::from("Open")), None);
        assert_eq!(row.set("en", Value::from("Open…")), Some(Value::from("Open")));
        assert_eq!(row.get("en"), Some(&Value::from("Open…")));
    }

    #[test]
    fn untagged_key_serialization() {
        assert_eq!(serde_json::to_string(&RowKey::Index(3)).unwrap(), "3");
        assert_eq!(
            serde_json::to_string(&RowKey::from("a.b")).unwrap(),
            r#""a.b""#
        );
    }
}

//! Group criteria and the built-in grouping functions.
//!
//! Grouping runs after sorting: rows arrive in their sorted order, and each
//! grouping function preserves that order inside its buckets while emitting
//! buckets in first-seen order.

use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;
use lxg_types::{Row, Value};

use crate::node::{GroupNode, Node};

/// Turns the (already sorted) rows into a forest of nodes.
///
/// Receives the grouped column's name and the rows in order.
pub type GroupFn = Rc<dyn Fn(&str, &[Rc<Row>]) -> Vec<Node>>;

/// Which column to group by and, optionally, how.
#[derive(Clone)]
pub struct GroupSpec {
    pub by: String,
    /// Overrides any per-column grouping function and the default
    /// exact-value partition.
    pub grouping: Option<GroupFn>,
}

impl GroupSpec {
    /// Group rows by the exact value of `column`, unless the dataset has a
    /// grouping function registered for that column.
    pub fn by(column: impl Into<String>) -> Self {
        Self {
            by: column.into(),
            grouping: None,
        }
    }

    /// Group with a custom function.
    pub fn with_fn(
        column: impl Into<String>,
        grouping: impl Fn(&str, &[Rc<Row>]) -> Vec<Node> + 'static,
    ) -> Self {
        Self {
            by: column.into(),
            grouping: Some(Rc::new(grouping)),
        }
    }

    /// Group dotted keys in `column` into a nested hierarchy, one segment per
    /// level.
    pub fn by_path(column: impl Into<String>, separator: impl Into<String>) -> Self {
        let separator = separator.into();
        Self::with_fn(column, move |column, rows| {
            group_by_path(column, rows, &separator)
        })
    }
}

impl fmt::Debug for GroupSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupSpec")
            .field("by", &self.by)
            .field("custom_grouping", &self.grouping.is_some())
            .finish()
    }
}

/// Partition rows by exact equality of `column`.
///
/// Rows missing the column fall into a `Null` group.
pub fn group_by_value(column: &str, rows: &[Rc<Row>]) -> Vec<Node> {
    let mut buckets: Vec<(Value, Vec<Node>)> = Vec::new();
    for row in rows {
        let key = row.get(column).cloned().unwrap_or_default();
        let node = Node::Row(Rc::clone(row));
        match buckets.iter_mut().find(|(existing, _)| *existing == key) {
            Some((_, children)) => children.push(node),
            None => buckets.push((key, vec![node])),
        }
    }

    buckets
        .into_iter()
        .map(|(key, children)| {
            Node::Group(GroupNode {
                key,
                column: column.to_string(),
                children,
            })
        })
        .collect()
}

/// Build a nested hierarchy from dotted keys.
///
/// At each level, a row whose remaining key still contains `separator` is
/// placed in the group named by its first segment; a row whose remaining key
/// has no separator stays at this level as a row. Groups and rows keep
/// first-seen order, interleaved.
///
/// `menu.file.open`, `menu.file.close`, `menu.quit`, `title` becomes:
///
/// ```text
/// menu
/// ├── file
/// │   ├── menu.file.open
/// │   └── menu.file.close
/// └── menu.quit
/// title
/// ```
pub fn group_by_path(column: &str, rows: &[Rc<Row>], separator: &str) -> Vec<Node> {
    let entries = rows
        .iter()
        .map(|row| {
            let key = row.get(column).map(Value::to_string).unwrap_or_default();
            (Rc::clone(row), key)
        })
        .collect();
    path_level(column, entries, separator)
}

enum Slot {
    Row(Rc<Row>),
    Group(String),
}

fn path_level(column: &str, entries: Vec<(Rc<Row>, String)>, separator: &str) -> Vec<Node> {
    if separator.is_empty() {
        return entries.into_iter().map(|(row, _)| Node::Row(row)).collect();
    }

    let mut slots = Vec::new();
    let mut members: IndexMap<String, Vec<(Rc<Row>, String)>> = IndexMap::new();

    for (row, rest) in entries {
        match rest.split_once(separator) {
            Some((head, tail)) => {
                if !members.contains_key(head) {
                    slots.push(Slot::Group(head.to_string()));
                }
                members
                    .entry(head.to_string())
                    .or_default()
                    .push((row, tail.to_string()));
            }
            None => slots.push(Slot::Row(row)),
        }
    }

    slots
        .into_iter()
        .map(|slot| match slot {
            Slot::Row(row) => Node::Row(row),
            Slot::Group(head) => {
                let children = members
                    .swap_remove(&head)
                    .map(|group| path_level(column, group, separator))
                    .unwrap_or_default();
                Node::Group(GroupNode {
                    key: Value::Text(head),
                    column: column.to_string(),
                    children,
                })
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::flatten_keys;
    use lxg_types::{Branch, RowKey};

    fn row(key: u64, column: &str, value: Value) -> Rc<Row> {
        let mut cells = Branch::new();
        cells.insert(column.to_string(), value);
        Rc::new(Row::new(key, cells))
    }

    fn group_label(node: &Node) -> String {
        node.as_group().map(|g| g.key.to_string()).unwrap_or_default()
    }

    #[test]
    fn value_groups_keep_first_seen_order() {
        let rows = vec![
            row(0, "lang", Value::from("de")),
            row(1, "lang", Value::from("en")),
            row(2, "lang", Value::from("de")),
        ];
        let nodes = group_by_value("lang", &rows);

        assert_eq!(nodes.len(), 2);
        assert_eq!(group_label(&nodes[0]), "de");
        assert_eq!(group_label(&nodes[1]), "en");
        assert_eq!(
            flatten_keys(&nodes),
            [0u64, 2, 1].map(RowKey::Index)
        );
    }

    #[test]
    fn missing_column_groups_under_null() {
        let rows = vec![row(0, "other", Value::from(1))];
        let nodes = group_by_value("lang", &rows);
        assert_eq!(nodes[0].as_group().map(|g| &g.key), Some(&Value::Null));
    }

    #[test]
    fn dotted_keys_nest_one_segment_per_level() {
        let rows = vec![
            row(0, "key", Value::from("menu.file.open")),
            row(1, "key", Value::from("title")),
            row(2, "key", Value::from("menu.quit")),
            row(3, "key", Value::from("menu.file.close")),
        ];
        let nodes = group_by_path("key", &rows, ".");

        assert_eq!(nodes.len(), 2);
        let menu = nodes[0].as_group().unwrap();
        assert_eq!(menu.key, Value::from("menu"));
        assert_eq!(menu.children.len(), 2);

        let file = menu.children[0].as_group().unwrap();
        assert_eq!(file.key, Value::from("file"));
        assert_eq!(file.children.len(), 2);
        assert!(file.children.iter().all(|n| n.as_row().is_some()));

        assert!(menu.children[1].as_row().is_some());
        assert!(nodes[1].as_row().is_some());
        assert_eq!(flatten_keys(&nodes), [0u64, 3, 2, 1].map(RowKey::Index));
    }

    #[test]
    fn empty_separator_yields_flat_rows() {
        let rows = vec![row(0, "key", Value::from("a.b"))];
        let nodes = group_by_path("key", &rows, "");
        assert!(nodes[0].as_row().is_some());
    }
}

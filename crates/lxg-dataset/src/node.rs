//! The presentation tree produced by [`DataSet::value`](crate::DataSet::value).

use std::rc::Rc;

use lxg_types::{Row, RowKey, Value};

/// A row or a group of child nodes.
///
/// Trees are rebuilt from scratch whenever data or view criteria change and
/// are never mutated in place; rows are shared with the dataset via `Rc`.
#[derive(Clone, Debug, PartialEq)]
pub enum Node {
    Row(Rc<Row>),
    Group(GroupNode),
}

/// A bucket of nodes sharing a grouping key.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupNode {
    /// The value (or path segment) the children were grouped under.
    pub key: Value,
    /// The column the grouping was performed on.
    pub column: String,
    pub children: Vec<Node>,
}

impl Node {
    pub fn as_row(&self) -> Option<&Rc<Row>> {
        match self {
            Node::Row(row) => Some(row),
            Node::Group(_) => None,
        }
    }

    pub fn as_group(&self) -> Option<&GroupNode> {
        match self {
            Node::Group(group) => Some(group),
            Node::Row(_) => None,
        }
    }

    /// Number of rows at or below this node.
    pub fn row_count(&self) -> usize {
        match self {
            Node::Row(_) => 1,
            Node::Group(group) => group.children.iter().map(Node::row_count).sum(),
        }
    }
}

/// Row keys of a forest in depth-first (rendered) order.
pub fn flatten_keys(nodes: &[Node]) -> Vec<RowKey> {
    let mut keys = Vec::new();
    let mut stack: Vec<&Node> = nodes.iter().rev().collect();
    while let Some(node) = stack.pop() {
        match node {
            Node::Row(row) => keys.push(row.key.clone()),
            Node::Group(group) => stack.extend(group.children.iter().rev()),
        }
    }
    keys
}

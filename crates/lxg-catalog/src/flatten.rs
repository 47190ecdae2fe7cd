//! Conversion between nested values and dotted-key maps.
//!
//! Flattening loses two facts about a document: which branches were JSON
//! arrays, and how a key was split into segments (`{"a.b": 1}` and
//! `{"a": {"b": 1}}` both flatten to `a.b`). An [`Outline`] keeps both so a
//! document can be exported in the shape it was loaded in.

use std::collections::{HashMap, HashSet};

use indexmap::IndexMap;

use lxg_types::{Branch, Value};

use crate::error::{CatalogError, CatalogResult};

/// Flatten a nested value into `dotted.key -> leaf` pairs, in document
/// order. Empty branches contribute nothing.
///
/// Fails with [`CatalogError::Conflict`] when two entries flatten to the
/// same key, e.g. a literal `"a.b"` next to `"a": {"b": ..}`.
pub fn flatten(value: &Value, separator: &str) -> CatalogResult<IndexMap<String, Value>> {
    let mut out = IndexMap::new();
    let mut stack: Vec<(String, &Value)> = vec![(String::new(), value)];

    while let Some((prefix, value)) = stack.pop() {
        match value {
            Value::Branch(children) => {
                for (name, child) in children.iter().rev() {
                    let key = if prefix.is_empty() {
                        name.clone()
                    } else {
                        format!("{prefix}{separator}{name}")
                    };
                    stack.push((key, child));
                }
            }
            leaf => {
                if out.contains_key(&prefix) {
                    return Err(CatalogError::Conflict { key: prefix });
                }
                out.insert(prefix, leaf.clone());
            }
        }
    }
    Ok(out)
}

/// Rebuild a nested branch from `dotted.key -> value` pairs.
///
/// Fails with [`CatalogError::Conflict`] when one key is a prefix of another
/// (`a` and `a.b`), since `a` cannot be both a value and a group.
pub fn unflatten<'a, I>(entries: I, separator: &str) -> CatalogResult<Value>
where
    I: IntoIterator<Item = (&'a str, &'a Value)>,
{
    let mut root = Branch::new();
    for (key, value) in entries {
        let segments: Vec<&str> = key.split(separator).collect();
        insert_path(&mut root, &segments, value.clone(), separator)?;
    }
    Ok(Value::Branch(root))
}

/// What a node of a loaded document was.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    Leaf,
    Object,
    Array,
}

/// Every node of one JSON document below the root, in document order, with
/// its exact segments.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Outline {
    nodes: Vec<(Vec<String>, Shape)>,
}

impl Outline {
    pub fn of(document: &serde_json::Value) -> Self {
        let mut nodes = Vec::new();
        let mut stack: Vec<(Vec<String>, &serde_json::Value)> = Vec::new();
        push_children(&mut stack, &[], document);

        while let Some((segments, node)) = stack.pop() {
            let shape = match node {
                serde_json::Value::Object(_) => Shape::Object,
                serde_json::Value::Array(_) => Shape::Array,
                _ => Shape::Leaf,
            };
            push_children(&mut stack, &segments, node);
            nodes.push((segments, shape));
        }
        Self { nodes }
    }

    pub fn nodes(&self) -> impl Iterator<Item = (&[String], Shape)> {
        self.nodes.iter().map(|(s, shape)| (s.as_slice(), *shape))
    }

    /// Leaf segments by the dotted key they flatten to.
    pub fn leaves(&self, separator: &str) -> HashMap<String, &[String]> {
        self.nodes
            .iter()
            .filter(|(_, shape)| *shape == Shape::Leaf)
            .map(|(segments, _)| (segments.join(separator), segments.as_slice()))
            .collect()
    }

    /// Add the nodes of `other` that this outline does not have yet.
    pub fn merge(&mut self, other: Outline) {
        let known: HashSet<Vec<String>> = self.nodes.iter().map(|(s, _)| s.clone()).collect();
        self.nodes
            .extend(other.nodes.into_iter().filter(|(s, _)| !known.contains(s)));
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn arrays(&self) -> HashSet<&[String]> {
        self.nodes
            .iter()
            .filter(|(_, shape)| *shape == Shape::Array)
            .map(|(segments, _)| segments.as_slice())
            .collect()
    }
}

fn push_children<'a>(
    stack: &mut Vec<(Vec<String>, &'a serde_json::Value)>,
    prefix: &[String],
    node: &'a serde_json::Value,
) {
    let child = |name: String| {
        let mut segments = prefix.to_vec();
        segments.push(name);
        segments
    };
    match node {
        serde_json::Value::Object(map) => {
            for (name, value) in map.iter().rev() {
                stack.push((child(name.clone()), value));
            }
        }
        serde_json::Value::Array(items) => {
            for (i, value) in items.iter().enumerate().rev() {
                stack.push((child(i.to_string()), value));
            }
        }
        _ => {}
    }
}

/// Rebuild a JSON document from flat entries, following `outline`.
///
/// Containers of the outline are recreated even when empty, arrays come
/// back as arrays, and leaves keep their original segments and position.
/// Keys the outline does not know are split on `separator` and appended.
/// Null values are left out.
pub(crate) fn rebuild<'a, I>(
    outline: &Outline,
    entries: I,
    separator: &str,
) -> CatalogResult<serde_json::Value>
where
    I: IntoIterator<Item = (Vec<String>, &'a Value)>,
{
    let mut root = Branch::new();
    for (segments, shape) in outline.nodes() {
        let placeholder = match shape {
            Shape::Leaf => Value::Null,
            Shape::Object | Shape::Array => Value::Branch(Branch::new()),
        };
        insert_path(&mut root, segments, placeholder, separator)?;
    }
    for (segments, value) in entries {
        if !value.is_null() {
            insert_path(&mut root, &segments, value.clone(), separator)?;
        }
    }
    prune_nulls(&mut root);

    let arrays = outline.arrays();
    let mut path = Vec::new();
    Ok(to_json(Value::Branch(root), &mut path, &arrays))
}

/// Write `value` at `segments`, creating branches on the way.
///
/// A null leaf on the way is a placeholder and becomes a branch; any other
/// leaf is a conflict, as is overwriting a non-empty branch.
fn insert_path<S: AsRef<str>>(
    root: &mut Branch,
    segments: &[S],
    value: Value,
    separator: &str,
) -> CatalogResult<()> {
    let conflict = |depth: usize| CatalogError::Conflict {
        key: segments[..=depth]
            .iter()
            .map(|s| s.as_ref())
            .collect::<Vec<&str>>()
            .join(separator),
    };
    let Some((last, parents)) = segments.split_last() else {
        return Ok(());
    };

    let mut branch = root;
    for (depth, segment) in parents.iter().enumerate() {
        let slot = branch
            .entry(segment.as_ref().to_string())
            .or_insert_with(|| Value::Branch(Branch::new()));
        if slot.is_null() {
            *slot = Value::Branch(Branch::new());
        }
        branch = match slot {
            Value::Branch(child) => child,
            _ => return Err(conflict(depth)),
        };
    }

    if let Some(Value::Branch(existing)) = branch.get(last.as_ref()) {
        if !existing.is_empty() {
            if value.is_branch() {
                return Ok(());
            }
            return Err(conflict(parents.len()));
        }
    }
    // An existing key keeps its position.
    branch.insert(last.as_ref().to_string(), value);
    Ok(())
}

fn prune_nulls(branch: &mut Branch) {
    branch.retain(|_, value| !value.is_null());
    for value in branch.values_mut() {
        if let Value::Branch(child) = value {
            prune_nulls(child);
        }
    }
}

/// Convert to JSON, turning branches recorded as arrays back into arrays.
/// Missing indices become `null`; a non-index key keeps the branch an
/// object.
fn to_json(value: Value, path: &mut Vec<String>, arrays: &HashSet<&[String]>) -> serde_json::Value {
    let Value::Branch(branch) = value else {
        return serde_json::Value::from(value);
    };

    let as_array = arrays.contains(path.as_slice())
        && branch.keys().all(|k| k.parse::<usize>().is_ok());
    if as_array {
        let mut items: Vec<(usize, Value)> = branch
            .into_iter()
            .filter_map(|(k, v)| Some((k.parse::<usize>().ok()?, v)))
            .collect();
        items.sort_by_key(|(i, _)| *i);
        let len = items.last().map_or(0, |(i, _)| i + 1);
        let mut out = vec![serde_json::Value::Null; len];
        for (i, v) in items {
            path.push(i.to_string());
            out[i] = to_json(v, path, arrays);
            path.pop();
        }
        return serde_json::Value::Array(out);
    }

    let mut out = serde_json::Map::with_capacity(branch.len());
    for (k, v) in branch {
        path.push(k.clone());
        out.insert(k, to_json(v, path, arrays));
        path.pop();
    }
    serde_json::Value::Object(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn export(document: serde_json::Value) -> serde_json::Value {
        let outline = Outline::of(&document);
        let flat = flatten(&Value::from(document), ".").unwrap();
        let leaves = outline.leaves(".");
        let entries = flat
            .iter()
            .map(|(k, v)| (leaves[k.as_str()].to_vec(), v))
            .collect::<Vec<_>>();
        rebuild(&outline, entries, ".").unwrap()
    }

    #[test]
    fn flattens_in_document_order() {
        let doc = Value::from(json!({
            "menu": {"file": {"open": "Open", "close": "Close"}, "quit": "Quit"},
            "title": "App"
        }));
        let flat = flatten(&doc, ".").unwrap();
        let keys: Vec<&str> = flat.keys().map(String::as_str).collect();
        assert_eq!(keys, ["menu.file.open", "menu.file.close", "menu.quit", "title"]);
        assert_eq!(flat["menu.quit"], Value::from("Quit"));
    }

    #[test]
    fn arrays_flatten_by_index() {
        let doc = Value::from(json!({"days": ["Mon", "Tue"]}));
        let flat = flatten(&doc, ".").unwrap();
        assert_eq!(flat["days.1"], Value::from("Tue"));
    }

    #[test]
    fn colliding_keys_are_a_conflict() {
        let doc = Value::from(json!({"a.b": "x", "a": {"b": "y"}}));
        let err = flatten(&doc, ".").unwrap_err();
        assert!(matches!(err, CatalogError::Conflict { ref key } if key == "a.b"));
    }

    #[test]
    fn unflatten_inverts_flatten() {
        let doc = Value::from(json!({"a": {"b": "x", "c": {"d": 1}}, "e": true}));
        let flat = flatten(&doc, ".").unwrap();
        let rebuilt = unflatten(flat.iter().map(|(k, v)| (k.as_str(), v)), ".").unwrap();
        assert_eq!(rebuilt, doc);
    }

    #[test]
    fn custom_separator() {
        let doc = Value::from(json!({"a": {"b": "x"}}));
        let flat = flatten(&doc, "/").unwrap();
        assert!(flat.contains_key("a/b"));
    }

    #[test]
    fn leaf_and_group_with_same_key_conflict() {
        let a = Value::from("x");
        let ab = Value::from("y");

        let err = unflatten([("a", &a), ("a.b", &ab)], ".").unwrap_err();
        assert!(matches!(err, CatalogError::Conflict { ref key } if key == "a"));

        let err = unflatten([("a.b", &ab), ("a", &a)], ".").unwrap_err();
        assert!(matches!(err, CatalogError::Conflict { ref key } if key == "a"));
    }

    #[test]
    fn outline_keeps_arrays_and_empty_containers() {
        let doc = json!({"a": "x", "section": {}, "days": ["Mon", "Tue"], "none": []});
        let exported = export(doc.clone());
        assert_eq!(exported, doc);
        assert_eq!(exported.to_string(), doc.to_string());
    }

    #[test]
    fn outline_keeps_literal_dotted_keys() {
        let doc = json!({"menu.open": "Open", "menu": {"close": "Close"}});
        assert_eq!(export(doc.clone()).to_string(), doc.to_string());
    }

    #[test]
    fn nested_arrays_of_objects() {
        let doc = json!({"steps": [{"title": "One"}, {"title": "Two", "tags": ["a"]}]});
        assert_eq!(export(doc.clone()), doc);
    }

    #[test]
    fn array_gaps_become_null_and_unknown_keys_append() {
        let outline = Outline::of(&json!({"days": ["Mon", "Tue", "Wed"], "title": "T"}));
        let wed = Value::from("Mi");
        let mon = Value::from("Mo");
        let extra = Value::from("E");
        let entries = vec![
            (vec!["days".to_string(), "2".to_string()], &wed),
            (vec!["days".to_string(), "0".to_string()], &mon),
            (vec!["extra".to_string()], &extra),
        ];
        let exported = rebuild(&outline, entries, ".").unwrap();
        assert_eq!(exported, json!({"days": ["Mo", null, "Mi"], "extra": "E"}));
    }
}

//! Hierarchical column projection over JSON payloads.
//!
//! A column list is a set of dot-separated paths (`"vitals.bpm"`). Paths are
//! merged into a tree; when one requested path is a prefix of another, the
//! shorter one wins and the whole subtree is kept. Arrays are projected
//! element by element.

use std::collections::BTreeMap;

use serde_json::{Map, Value};

use crate::error::CoreError;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Column {
    /// Keep the whole value.
    All,
    /// Keep only the listed children.
    Children(BTreeMap<String, Column>),
}

/// A parsed set of columns. Empty means "no projection".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ColumnList {
    root: BTreeMap<String, Column>,
}

impl ColumnList {
    /// Parse column specifications. Each entry may itself hold several
    /// comma-separated paths.
    pub fn parse<I, S>(specs: I) -> Result<Self, CoreError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list = Self::default();
        for spec in specs {
            for path in spec.as_ref().split(',') {
                let path = path.trim();
                if path.is_empty() {
                    continue;
                }
                let segments: Vec<&str> = path.split('.').map(str::trim).collect();
                if segments.iter().any(|s| s.is_empty()) {
                    return Err(CoreError::Validation(format!(
                        "Invalid column path '{path}'"
                    )));
                }
                insert(&mut list.root, &segments);
            }
        }
        Ok(list)
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Project `value`, returning a new value with only the selected columns.
    pub fn project(&self, value: &Value) -> Value {
        if self.is_empty() {
            return value.clone();
        }
        project_children(&self.root, value).unwrap_or(Value::Null)
    }
}

fn insert(node: &mut BTreeMap<String, Column>, segments: &[&str]) {
    let Some((head, rest)) = segments.split_first() else {
        return;
    };
    if rest.is_empty() {
        node.insert((*head).to_string(), Column::All);
        return;
    }
    let child = node
        .entry((*head).to_string())
        .or_insert_with(|| Column::Children(BTreeMap::new()));
    if let Column::Children(children) = child {
        insert(children, rest);
    }
}

/// `None` when `value` has no structure to select from.
fn project_children(columns: &BTreeMap<String, Column>, value: &Value) -> Option<Value> {
    match value {
        Value::Object(object) => {
            let mut out = Map::new();
            for (key, column) in columns {
                let Some(child) = object.get(key) else {
                    continue;
                };
                let projected = match column {
                    Column::All => Some(child.clone()),
                    Column::Children(grand) => project_children(grand, child),
                };
                if let Some(projected) = projected {
                    out.insert(key.clone(), projected);
                }
            }
            Some(Value::Object(out))
        }
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .filter_map(|item| project_children(columns, item))
                .collect(),
        )),
        _ => None,
    }
}

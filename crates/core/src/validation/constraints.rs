//! Custom constraint extensions for schema definitions.
//!
//! An extension owns one keyword. At definition time the engine hands it the
//! enclosing schema node for a shape check; the extension then lowers the
//! keyword into the core JSON Schema vocabulary so the structural validator
//! enforces it at data-validation time, wherever the node sits in the tree.

use serde_json::{json, Map, Value};

/// A keyword the structural validator does not know natively.
pub trait ConstraintExtension: Send + Sync {
    /// The keyword this extension handles inside a schema node.
    fn keyword(&self) -> &'static str;

    /// Check that `value` is a well-formed use of the keyword on `node`.
    ///
    /// `node` is the enclosing schema object with the keyword already removed.
    fn check_definition(&self, node: &Map<String, Value>, value: &Value) -> Result<(), String>;

    /// Express the constraint as a plain JSON Schema fragment.
    ///
    /// The fragment is conjoined (`allOf`) with the enclosing node.
    fn lower(&self, value: &Value) -> Value;
}

/// `"allowed_values": ["a", "b"]` -- restricts a string field to a fixed list.
///
/// Only valid on string-typed nodes. Any string candidate must appear in the
/// list; values of other types (including `null` on nullable fields) are not
/// restricted.
#[derive(Debug, Default, Clone, Copy)]
pub struct AllowedValues;

impl AllowedValues {
    pub const KEYWORD: &'static str = "allowed_values";
}

impl ConstraintExtension for AllowedValues {
    fn keyword(&self) -> &'static str {
        Self::KEYWORD
    }

    fn check_definition(&self, node: &Map<String, Value>, value: &Value) -> Result<(), String> {
        if !is_string_typed(node) {
            return Err(format!(
                "'{}' is only valid on string-typed fields",
                Self::KEYWORD
            ));
        }
        let Some(values) = value.as_array() else {
            return Err(format!("'{}' must be a list of strings", Self::KEYWORD));
        };
        if let Some(bad) = values.iter().find(|v| !v.is_string()) {
            return Err(format!(
                "'{}' must be a list of strings, found {bad}",
                Self::KEYWORD
            ));
        }
        Ok(())
    }

    fn lower(&self, value: &Value) -> Value {
        json!({
            "if": { "type": "string" },
            "then": { "enum": value },
        })
    }
}

/// Whether a schema node declares `"type": "string"` (alone or in a type list).
fn is_string_typed(node: &Map<String, Value>) -> bool {
    match node.get("type") {
        Some(Value::String(kind)) => kind == "string",
        Some(Value::Array(kinds)) => kinds.iter().any(|k| k.as_str() == Some("string")),
        _ => false,
    }
}

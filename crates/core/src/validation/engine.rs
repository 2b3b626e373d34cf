//! Compiles schema definitions into validators.
//!
//! Structural validation is delegated to JSON Schema (draft 2020-12). Before
//! compilation the definition is walked once; every registered
//! [`ConstraintExtension`] keyword found in a schema position is shape-checked
//! and lowered into the core vocabulary.

use jsonschema::{Draft, Validator};
use serde_json::{Map, Value};

use crate::error::CoreError;
use crate::validation::constraints::{AllowedValues, ConstraintExtension};

/// Keywords whose value is a single subschema (or, for `items`, possibly an
/// array of subschemas in older drafts).
const SUBSCHEMA_KEYWORDS: &[&str] = &[
    "additionalProperties",
    "additionalItems",
    "items",
    "contains",
    "not",
    "if",
    "then",
    "else",
    "propertyNames",
    "unevaluatedItems",
    "unevaluatedProperties",
];

/// Keywords whose value is an array of subschemas.
const SUBSCHEMA_LIST_KEYWORDS: &[&str] = &["allOf", "anyOf", "oneOf", "prefixItems"];

/// Keywords whose value is a map of name -> subschema.
const SUBSCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "dependentSchemas",
    "$defs",
    "definitions",
];

/// Compiles schema definitions, applying registered constraint extensions.
pub struct ValidationEngine {
    extensions: Vec<Box<dyn ConstraintExtension>>,
}

impl Default for ValidationEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for ValidationEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let keywords: Vec<_> = self.extensions.iter().map(|e| e.keyword()).collect();
        f.debug_struct("ValidationEngine")
            .field("extensions", &keywords)
            .finish()
    }
}

impl ValidationEngine {
    /// Engine with the standard extensions (`allowed_values`) registered.
    pub fn new() -> Self {
        Self::bare().with_extension(AllowedValues)
    }

    /// Engine with no extensions: plain JSON Schema.
    pub fn bare() -> Self {
        Self {
            extensions: Vec::new(),
        }
    }

    /// Register an additional constraint extension.
    pub fn with_extension(mut self, extension: impl ConstraintExtension + 'static) -> Self {
        self.extensions.push(Box::new(extension));
        self
    }

    /// Compile a schema definition.
    ///
    /// Fails with [`CoreError::Validation`] when an extension keyword is
    /// malformed or the lowered definition is not a valid JSON Schema.
    pub fn compile(&self, definition: &Value) -> Result<CompiledDefinition, CoreError> {
        let mut lowered = definition.clone();
        self.lower_node(&mut lowered, "#")?;

        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&lowered)
            .map_err(|err| CoreError::Validation(format!("Invalid schema definition: {err}")))?;

        Ok(CompiledDefinition { validator })
    }

    fn lower_node(&self, node: &mut Value, path: &str) -> Result<(), CoreError> {
        let Value::Object(map) = node else {
            return Ok(());
        };

        for extension in &self.extensions {
            if let Some(value) = map.remove(extension.keyword()) {
                extension.check_definition(map, &value).map_err(|reason| {
                    CoreError::Validation(format!("Invalid schema definition at {path}: {reason}"))
                })?;
                push_all_of(map, extension.lower(&value), path)?;
            }
        }

        for keyword in SUBSCHEMA_KEYWORDS {
            match map.get_mut(*keyword) {
                Some(Value::Array(items)) => {
                    for (i, item) in items.iter_mut().enumerate() {
                        self.lower_node(item, &format!("{path}/{keyword}/{i}"))?;
                    }
                }
                Some(child) => self.lower_node(child, &format!("{path}/{keyword}"))?,
                None => {}
            }
        }

        for keyword in SUBSCHEMA_LIST_KEYWORDS {
            if let Some(Value::Array(items)) = map.get_mut(*keyword) {
                for (i, item) in items.iter_mut().enumerate() {
                    self.lower_node(item, &format!("{path}/{keyword}/{i}"))?;
                }
            }
        }

        for keyword in SUBSCHEMA_MAP_KEYWORDS {
            if let Some(Value::Object(children)) = map.get_mut(*keyword) {
                for (name, child) in children.iter_mut() {
                    self.lower_node(child, &format!("{path}/{keyword}/{name}"))?;
                }
            }
        }

        Ok(())
    }
}

/// Append a fragment to the node's `allOf`, creating it when absent.
fn push_all_of(map: &mut Map<String, Value>, fragment: Value, path: &str) -> Result<(), CoreError> {
    match map
        .entry("allOf")
        .or_insert_with(|| Value::Array(Vec::new()))
    {
        Value::Array(items) => {
            items.push(fragment);
            Ok(())
        }
        _ => Err(CoreError::Validation(format!(
            "Invalid schema definition at {path}: 'allOf' must be an array"
        ))),
    }
}

/// A compiled definition, ready to check candidate data.
pub struct CompiledDefinition {
    validator: Validator,
}

impl std::fmt::Debug for CompiledDefinition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CompiledDefinition").finish_non_exhaustive()
    }
}

impl CompiledDefinition {
    /// Check `instance`, collecting every violation into one error message.
    pub fn check(&self, instance: &Value) -> Result<(), CoreError> {
        let violations: Vec<String> = self
            .validator
            .iter_errors(instance)
            .map(|err| err.to_string())
            .collect();
        if violations.is_empty() {
            Ok(())
        } else {
            Err(CoreError::Validation(format!(
                "Data does not match schema: {}",
                violations.join("; ")
            )))
        }
    }
}

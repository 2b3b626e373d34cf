//! Schema validation engine and standalone field validators.
//!
//! - [`fields`] -- pure validators for ids, versions, chunk sizes, usernames
//!   and scope sets. Request handlers call these directly for early rejection.
//! - [`constraints`] -- custom constraint extensions layered on top of JSON
//!   Schema (currently `allowed_values`).
//! - [`engine`] -- compiles schema definitions into validators.

pub mod constraints;
pub mod engine;
pub mod fields;

pub use constraints::{AllowedValues, ConstraintExtension};
pub use engine::{CompiledDefinition, ValidationEngine};
pub use fields::{
    validate_chunk_size, validate_meta_data, validate_schema_id, validate_scopes,
    validate_username, validate_version,
};

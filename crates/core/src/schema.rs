//! Schema registry entries and compiled schemas.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::{Data, MetaData};
use crate::error::CoreError;
use crate::types::Timestamp;
use crate::validation::fields::{
    validate_chunk_size, validate_meta_data, validate_schema_id, validate_version,
};
use crate::validation::{CompiledDefinition, ValidationEngine};

/// A registry entry as persisted.
///
/// `(id, version)` is unique. Entries are append-only: a change to a schema
/// is a new version, never an edit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaRecord {
    pub id: String,
    pub version: i64,
    pub chunk_size: i64,
    #[serde(default)]
    pub time_authoritative: bool,
    #[serde(default)]
    pub time_zone_authoritative: bool,
    pub definition: Value,
}

impl SchemaRecord {
    /// Check the record's scalar fields, normalising the id.
    pub fn validated(mut self) -> Result<Self, CoreError> {
        self.id = validate_schema_id(&self.id)?;
        validate_version(self.version)?;
        validate_chunk_size(self.chunk_size)?;
        Ok(self)
    }
}

/// A registry entry with its compiled validator.
#[derive(Debug)]
pub struct Schema {
    record: SchemaRecord,
    definition: CompiledDefinition,
}

impl Schema {
    /// Validate a record and compile its definition with `engine`.
    pub fn compile(record: SchemaRecord, engine: &ValidationEngine) -> Result<Self, CoreError> {
        let record = record.validated()?;
        let definition = engine.compile(&record.definition)?;
        Ok(Self { record, definition })
    }

    pub fn id(&self) -> &str {
        &self.record.id
    }

    pub fn version(&self) -> i64 {
        self.record.version
    }

    pub fn record(&self) -> &SchemaRecord {
        &self.record
    }

    /// Validate one data point and produce the record to store.
    ///
    /// A `null` payload is rejected before the definition is consulted.
    pub fn validate_data(
        &self,
        owner: &str,
        meta_data: Option<MetaData>,
        payload: Value,
        now: Timestamp,
    ) -> Result<Data, CoreError> {
        if payload.is_null() {
            return Err(CoreError::Validation("Data must not be null".into()));
        }
        if let Some(meta) = &meta_data {
            validate_meta_data(meta, now)?;
        }
        self.definition.check(&payload)?;

        Ok(Data {
            owner: owner.to_string(),
            schema_id: self.record.id.clone(),
            schema_version: self.record.version,
            meta_data: meta_data.filter(|m| !m.is_empty()),
            data: payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use serde_json::json;

    fn record(definition: Value) -> SchemaRecord {
        SchemaRecord {
            id: " weight ".into(),
            version: 1,
            chunk_size: 10,
            time_authoritative: true,
            time_zone_authoritative: false,
            definition,
        }
    }

    #[test]
    fn compile_normalises_id() {
        let schema = Schema::compile(record(json!({})), &ValidationEngine::new()).unwrap();
        assert_eq!(schema.id(), "weight");
        assert_eq!(schema.version(), 1);
    }

    #[test]
    fn compile_rejects_bad_version_and_chunk_size() {
        let engine = ValidationEngine::new();
        let mut bad = record(json!({}));
        bad.version = 0;
        assert_matches!(Schema::compile(bad, &engine), Err(CoreError::Validation(_)));

        let mut bad = record(json!({}));
        bad.chunk_size = -1;
        assert_matches!(Schema::compile(bad, &engine), Err(CoreError::Validation(_)));
    }

    #[test]
    fn validate_data_produces_owned_record() {
        let schema = Schema::compile(
            record(json!({"type": "object", "required": ["kg"]})),
            &ValidationEngine::new(),
        )
        .unwrap();
        let now = chrono::Utc::now();
        let data = schema
            .validate_data("alice", None, json!({"kg": 70}), now)
            .unwrap();
        assert_eq!(data.owner, "alice");
        assert_eq!(data.schema_id, "weight");
        assert_eq!(data.schema_version, 1);
        assert_eq!(data.data, json!({"kg": 70}));

        assert_matches!(
            schema.validate_data("alice", None, json!({}), now),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn null_payload_rejected_even_for_permissive_schema() {
        let schema = Schema::compile(record(json!(true)), &ValidationEngine::new()).unwrap();
        assert_matches!(
            schema.validate_data("alice", None, Value::Null, chrono::Utc::now()),
            Err(CoreError::Validation(msg)) if msg.contains("null")
        );
    }

    #[test]
    fn future_meta_data_rejected() {
        let schema = Schema::compile(record(json!({})), &ValidationEngine::new()).unwrap();
        let now = chrono::Utc::now();
        let meta = MetaData {
            id: Some("x".into()),
            timestamp: Some(now + chrono::Duration::hours(1)),
        };
        assert_matches!(
            schema.validate_data("alice", Some(meta), json!({}), now),
            Err(CoreError::Validation(_))
        );
    }

    #[test]
    fn record_deserializes_with_default_flags() {
        let parsed: SchemaRecord = serde_json::from_value(json!({
            "id": "steps", "version": 2, "chunk_size": 5, "definition": {}
        }))
        .unwrap();
        assert!(!parsed.time_authoritative);
        assert!(!parsed.time_zone_authoritative);
    }
}

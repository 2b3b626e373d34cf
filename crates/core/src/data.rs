//! Data points and the upload payload format.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::CoreError;
use crate::types::Timestamp;

/// Optional descriptive meta-data attached to a data point.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetaData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<Timestamp>,
}

impl MetaData {
    pub fn is_empty(&self) -> bool {
        self.id.is_none() && self.timestamp.is_none()
    }
}

/// A stored data point.
///
/// Created only through [`crate::schema::Schema::validate_data`]; never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Data {
    pub owner: String,
    pub schema_id: String,
    pub schema_version: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta_data: Option<MetaData>,
    pub data: Value,
}

impl Data {
    /// Meta-data timestamp, if any. Query results are ordered by this.
    pub fn timestamp(&self) -> Option<Timestamp> {
        self.meta_data.as_ref().and_then(|m| m.timestamp)
    }
}

/// One element of an upload before validation.
#[derive(Debug, Clone, PartialEq)]
pub struct DataElement {
    pub meta_data: Option<MetaData>,
    pub data: Value,
}

/// Split an upload payload into its elements.
///
/// The payload must be a JSON array of objects. Each object carries a
/// mandatory `data` member and an optional `meta_data` object; empty
/// meta-data collapses to `None`.
pub fn parse_upload(payload: &Value) -> Result<Vec<DataElement>, CoreError> {
    let items = payload
        .as_array()
        .ok_or_else(|| CoreError::Validation("Upload must be a JSON array".into()))?;

    items
        .iter()
        .enumerate()
        .map(|(index, item)| parse_element(index, item))
        .collect()
}

fn parse_element(index: usize, item: &Value) -> Result<DataElement, CoreError> {
    let object = item.as_object().ok_or_else(|| {
        CoreError::Validation(format!("Upload element {index} is not a JSON object"))
    })?;

    let meta_data = match object.get("meta_data") {
        None | Some(Value::Null) => None,
        Some(raw @ Value::Object(_)) => {
            let meta: MetaData = serde_json::from_value(raw.clone()).map_err(|e| {
                CoreError::Validation(format!("Upload element {index} has invalid meta-data: {e}"))
            })?;
            Some(meta).filter(|m| !m.is_empty())
        }
        Some(_) => {
            return Err(CoreError::Validation(format!(
                "Upload element {index} has meta-data that is not an object"
            )))
        }
    };

    let data = object
        .get("data")
        .cloned()
        .ok_or_else(|| CoreError::Validation(format!("Upload element {index} is missing data")))?;

    Ok(DataElement { meta_data, data })
}

use chrono::{DateTime, Utc};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::error::DocStoreError;

/// Field set of a document.
pub type Fields = serde_json::Map<String, Value>;

/// A stored document together with the metadata the store assigns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
    /// Assigned by the store when the document is first written.
    pub create_time: DateTime<Utc>,
    pub update_time: DateTime<Utc>,
}

impl Document {
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Deserialize the field set into a typed record.
    pub fn decode<T: DeserializeOwned>(&self) -> Result<T, DocStoreError> {
        serde_json::from_value(Value::Object(self.fields.clone())).map_err(|e| {
            DocStoreError::Serialization(format!("document '{}': {e}", self.id))
        })
    }
}

/// Serialize a typed record into a field set. The record must serialize to a JSON object.
pub fn to_fields<T: Serialize>(value: &T) -> Result<Fields, DocStoreError> {
    match serde_json::to_value(value)? {
        Value::Object(fields) => Ok(fields),
        other => Err(DocStoreError::Serialization(format!(
            "expected an object, got {other}"
        ))),
    }
}

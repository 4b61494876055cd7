//! Raw metadata rows returned by the platform's record query.
//!
//! Rows are loosely typed attribute bags. Mapping into the strongly typed
//! model (parameters, actions, solutions) happens in the `from_metadata`
//! constructors of those types.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// One row of a query result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MetadataRecord {
    /// Primary key of the row.
    #[serde(default)]
    pub id: String,
    /// Attribute values. Columns of aliased links appear as `<alias>.<column>`.
    #[serde(default)]
    pub attributes: IndexMap<String, Value>,
}

impl MetadataRecord {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Whether the attribute is present with a non-null value.
    pub fn contains(&self, key: &str) -> bool {
        self.attributes.get(key).is_some_and(|value| !value.is_null())
    }

    /// Reads a string attribute. Non-string scalars are returned in their
    /// JSON text form so that numeric codes stored as numbers still read back.
    pub fn get_str(&self, key: &str) -> Option<String> {
        match self.attributes.get(key)? {
            Value::Null => None,
            Value::String(text) => Some(text.clone()),
            Value::Number(number) => Some(number.to_string()),
            Value::Bool(flag) => Some(flag.to_string()),
            _ => None,
        }
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        match self.attributes.get(key)? {
            Value::Bool(flag) => Some(*flag),
            Value::String(text) => text.trim().parse().ok(),
            Value::Number(number) => number.as_i64().map(|n| n != 0),
            _ => None,
        }
    }

    pub fn get_i64(&self, key: &str) -> Option<i64> {
        match self.attributes.get(key)? {
            Value::Number(number) => number.as_i64(),
            Value::String(text) => text.trim().parse().ok(),
            _ => None,
        }
    }
}

/// Rows returned for one query.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct RecordSet {
    /// Root entity the query targeted.
    #[serde(default)]
    pub entity_name: String,
    #[serde(default)]
    pub records: Vec<MetadataRecord>,
}

impl RecordSet {
    pub fn new(entity_name: impl Into<String>, records: Vec<MetadataRecord>) -> Self {
        Self {
            entity_name: entity_name.into(),
            records,
        }
    }
}

/// A metadata row could not be mapped into the typed model.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecordError {
    #[error("{entity} row '{id}' has no '{attribute}' attribute")]
    MissingAttribute { entity: String, id: String, attribute: String },
}

impl RecordError {
    pub fn missing(entity: impl Into<String>, id: impl Into<String>, attribute: impl Into<String>) -> Self {
        Self::MissingAttribute {
            entity: entity.into(),
            id: id.into(),
            attribute: attribute.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn getters_tolerate_loose_typing() {
        let record = MetadataRecord::new("r1")
            .with("optional", json!("false"))
            .with("position", json!("3"))
            .with("binding", json!(null))
            .with("code", json!(42));

        assert_eq!(record.get_bool("optional"), Some(false));
        assert_eq!(record.get_i64("position"), Some(3));
        assert!(!record.contains("binding"));
        assert_eq!(record.get_str("binding"), None);
        assert_eq!(record.get_str("code").as_deref(), Some("42"));
    }
}

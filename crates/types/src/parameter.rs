//! Parameter metadata for custom actions.
//!
//! A [`ParameterSet`] is created from query rows each time an action is
//! selected. Its records are decorated in two passes (type resolution, then
//! binding reconciliation) and later receive values from the operator or from
//! an execution response.

use serde::{Deserialize, Serialize};

use crate::{
    record::{MetadataRecord, RecordError},
    value::PlatformValue,
};

/// Which side of an action a parameter belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ParameterDirection {
    /// Input argument, described by `sdkmessagerequestfield` rows.
    Request,
    /// Output value, described by `sdkmessageresponsefield` rows.
    Response,
}

impl ParameterDirection {
    /// Entity name of the metadata rows for this direction.
    pub fn field_entity(self) -> &'static str {
        match self {
            Self::Request => "sdkmessagerequestfield",
            Self::Response => "sdkmessageresponsefield",
        }
    }
}

/// Cached entity-type metadata used to decorate bound parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityTypeDescriptor {
    /// Integer entity type identifier (OTC).
    pub object_type_code: i32,
    pub logical_name: String,
    /// Localized display label, when the platform provides one.
    #[serde(default)]
    pub display_label: Option<String>,
}

impl EntityTypeDescriptor {
    pub fn new(object_type_code: i32, logical_name: impl Into<String>) -> Self {
        Self {
            object_type_code,
            logical_name: logical_name.into(),
            display_label: None,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.display_label = Some(label.into());
        self
    }

    /// The localized label, falling back to the logical name.
    pub fn label(&self) -> &str {
        self.display_label
            .as_deref()
            .filter(|label| !label.is_empty())
            .unwrap_or(&self.logical_name)
    }
}

/// One metadata row describing a request or response parameter.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ParameterRecord {
    /// Parameter name, unique within its set once reconciled.
    pub name: String,
    #[serde(default)]
    pub position: i64,
    /// Request-side only. `None` means the platform did not say.
    #[serde(default)]
    pub optional: Option<bool>,
    /// Fully-qualified parser type (request side).
    #[serde(default)]
    pub parser: Option<String>,
    /// Fully-qualified formatter type (response side).
    #[serde(default)]
    pub formatter: Option<String>,
    /// Entity binding of the form `OTC:<code>`.
    #[serde(default)]
    pub binding_info: Option<String>,
    /// Response-side public name.
    #[serde(default)]
    pub public_name: Option<String>,
    /// Request-side field mask.
    #[serde(default)]
    pub field_mask: Option<i64>,
    /// Short type label derived from the parser or formatter.
    #[serde(default)]
    pub resolved_type: Option<String>,
    /// Entity type the parameter is bound to, once reconciled.
    #[serde(default)]
    pub bound_entity: Option<EntityTypeDescriptor>,
    #[serde(default)]
    pub raw_value: Option<PlatformValue>,
    #[serde(default)]
    pub display_value: Option<String>,
}

impl ParameterRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_optional(mut self, optional: bool) -> Self {
        self.optional = Some(optional);
        self
    }

    pub fn with_parser(mut self, parser: impl Into<String>) -> Self {
        self.parser = Some(parser.into());
        self
    }

    pub fn with_formatter(mut self, formatter: impl Into<String>) -> Self {
        self.formatter = Some(formatter.into());
        self
    }

    pub fn with_binding(mut self, binding_info: impl Into<String>) -> Self {
        self.binding_info = Some(binding_info.into());
        self
    }

    pub fn with_value(mut self, value: PlatformValue) -> Self {
        self.raw_value = Some(value);
        self
    }

    /// Maps a `sdkmessagerequestfield` or `sdkmessageresponsefield` row.
    pub fn from_metadata(direction: ParameterDirection, record: &MetadataRecord) -> Result<Self, RecordError> {
        let name = record
            .get_str("name")
            .ok_or_else(|| RecordError::missing(direction.field_entity(), &record.id, "name"))?;
        Ok(Self {
            name,
            position: record.get_i64("position").unwrap_or_default(),
            optional: record.get_bool("optional"),
            parser: record.get_str("parser"),
            formatter: record.get_str("formatter"),
            binding_info: record.get_str("parameterbindinginformation"),
            public_name: record.get_str("publicname"),
            field_mask: record.get_i64("fieldmask"),
            ..Self::default()
        })
    }

    /// The identifier the type label is derived from: the parser when the
    /// record has one, otherwise the formatter.
    pub fn type_identifier(&self) -> Option<&str> {
        match &self.parser {
            Some(parser) => Some(parser),
            None => self.formatter.as_deref(),
        }
    }

    /// Whether the record carries non-empty binding information.
    pub fn is_bound(&self) -> bool {
        self.binding_info.as_deref().is_some_and(|binding| !binding.trim().is_empty())
    }

    /// Only an explicit `optional == false` makes a parameter required.
    pub fn is_required(&self) -> bool {
        self.optional == Some(false)
    }

    pub fn has_value(&self) -> bool {
        self.raw_value.is_some()
    }

    pub fn set_value(&mut self, raw_value: PlatformValue, display_value: impl Into<String>) {
        self.raw_value = Some(raw_value);
        self.display_value = Some(display_value.into());
    }

    pub fn clear_value(&mut self) {
        self.raw_value = None;
        self.display_value = None;
    }
}

/// Ordered parameters of one direction for the selected action.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSet {
    pub direction: ParameterDirection,
    pub records: Vec<ParameterRecord>,
}

impl ParameterSet {
    pub fn new(direction: ParameterDirection, records: Vec<ParameterRecord>) -> Self {
        Self { direction, records }
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ParameterRecord> {
        self.records.iter()
    }

    pub fn find(&self, name: &str) -> Option<&ParameterRecord> {
        self.records.iter().find(|record| record.name == name)
    }

    pub fn find_mut(&mut self, name: &str) -> Option<&mut ParameterRecord> {
        self.records.iter_mut().find(|record| record.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn request_row_maps_all_columns() {
        let row = MetadataRecord::new("f1")
            .with("name", json!("Target"))
            .with("position", json!(0))
            .with("optional", json!(false))
            .with("parser", json!("Microsoft.Xrm.Sdk.EntityReference, Microsoft.Xrm.Sdk"))
            .with("parameterbindinginformation", json!("OTC:1"))
            .with("fieldmask", json!(4));

        let record = ParameterRecord::from_metadata(ParameterDirection::Request, &row).expect("map row");
        assert_eq!(record.name, "Target");
        assert!(record.is_required());
        assert!(record.is_bound());
        assert_eq!(record.field_mask, Some(4));
        assert_eq!(record.type_identifier(), Some("Microsoft.Xrm.Sdk.EntityReference, Microsoft.Xrm.Sdk"));
    }

    #[test]
    fn row_without_name_is_rejected() {
        let row = MetadataRecord::new("f2").with("position", json!(1));
        let error = ParameterRecord::from_metadata(ParameterDirection::Response, &row).expect_err("missing name");
        assert_eq!(error, RecordError::missing("sdkmessageresponsefield", "f2", "name"));
    }

    #[test]
    fn missing_optional_flag_is_not_required() {
        let record = ParameterRecord::new("A");
        assert!(!record.is_required());
        assert!(!ParameterRecord::new("B").with_optional(true).is_required());
    }

    #[test]
    fn blank_binding_is_not_bound() {
        assert!(!ParameterRecord::new("A").with_binding("   ").is_bound());
    }

    #[test]
    fn descriptor_label_falls_back_to_logical_name() {
        assert_eq!(EntityTypeDescriptor::new(1, "account").label(), "account");
        assert_eq!(EntityTypeDescriptor::new(1, "account").with_label("Account").label(), "Account");
        assert_eq!(EntityTypeDescriptor::new(1, "account").with_label("").label(), "account");
    }
}

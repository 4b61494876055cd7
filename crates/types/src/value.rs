//! Values exchanged with the remote platform.
//!
//! A [`PlatformValue`] is the closed set of shapes a request argument or a
//! response result can take. Renderers and display helpers match on it
//! exhaustively; scalar kinds that need no special projection are grouped
//! under [`PlatformValue::Other`].

use std::fmt;

use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Any value a custom action can accept or return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum PlatformValue {
    /// Explicit absence of a value.
    Null,
    /// A homogeneous collection of records with paging hints.
    Collection(EntityCollection),
    /// A single record with its attribute bag.
    Record(EntityRecord),
    /// A list of column (attribute) names.
    ColumnSet(ColumnSet),
    /// A query expressed as text.
    Query(FetchQuery),
    /// A pointer to a record.
    Reference(EntityReference),
    /// A choice value.
    OptionSet(OptionSetValue),
    /// A currency amount.
    Money(Money),
    /// Any other scalar value.
    Other(Primitive),
}

/// Discriminant of [`PlatformValue`], used where the payload is irrelevant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    Null,
    Collection,
    Record,
    ColumnSet,
    Query,
    Reference,
    OptionSet,
    Money,
    Other,
}

impl ValueKind {
    /// Every kind, in declaration order.
    pub const ALL: [ValueKind; 9] = [
        ValueKind::Null,
        ValueKind::Collection,
        ValueKind::Record,
        ValueKind::ColumnSet,
        ValueKind::Query,
        ValueKind::Reference,
        ValueKind::OptionSet,
        ValueKind::Money,
        ValueKind::Other,
    ];
}

impl PlatformValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            Self::Null => ValueKind::Null,
            Self::Collection(_) => ValueKind::Collection,
            Self::Record(_) => ValueKind::Record,
            Self::ColumnSet(_) => ValueKind::ColumnSet,
            Self::Query(_) => ValueKind::Query,
            Self::Reference(_) => ValueKind::Reference,
            Self::OptionSet(_) => ValueKind::OptionSet,
            Self::Money(_) => ValueKind::Money,
            Self::Other(_) => ValueKind::Other,
        }
    }

    /// Name of the dynamic type carried by this value, as shown in type
    /// annotations.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "Null",
            Self::Collection(_) => "EntityCollection",
            Self::Record(_) => "Entity",
            Self::ColumnSet(_) => "ColumnSet",
            Self::Query(_) => "FetchExpression",
            Self::Reference(_) => "EntityReference",
            Self::OptionSet(_) => "OptionSetValue",
            Self::Money(_) => "Money",
            Self::Other(primitive) => primitive.type_name(),
        }
    }

    /// Convenience constructor for text values.
    pub fn text(value: impl Into<String>) -> Self {
        Self::Other(Primitive::Text(value.into()))
    }

    /// Returns the inner string when this is a text value.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Other(Primitive::Text(text)) => Some(text),
            _ => None,
        }
    }
}

impl From<Primitive> for PlatformValue {
    fn from(value: Primitive) -> Self {
        Self::Other(value)
    }
}

/// Scalars that render through their default string form.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Primitive {
    Text(String),
    Integer(i64),
    Decimal(f64),
    Boolean(bool),
    DateTime(DateTime<Utc>),
    Guid(String),
}

impl Primitive {
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "String",
            Self::Integer(_) => "Int64",
            Self::Decimal(_) => "Decimal",
            Self::Boolean(_) => "Boolean",
            Self::DateTime(_) => "DateTime",
            Self::Guid(_) => "Guid",
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text(text) => f.write_str(text),
            Self::Integer(value) => write!(f, "{value}"),
            Self::Decimal(value) => write!(f, "{value}"),
            Self::Boolean(value) => write!(f, "{value}"),
            Self::DateTime(value) => write!(f, "{}", value.to_rfc3339()),
            Self::Guid(value) => f.write_str(value),
        }
    }
}

/// A single platform record.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityRecord {
    /// Logical name of the record's entity type (e.g. "account").
    pub logical_name: String,
    /// Record identifier.
    #[serde(default)]
    pub id: String,
    /// Attribute values keyed by attribute logical name.
    #[serde(default)]
    pub attributes: IndexMap<String, PlatformValue>,
}

impl EntityRecord {
    pub fn new(logical_name: impl Into<String>, id: impl Into<String>) -> Self {
        Self {
            logical_name: logical_name.into(),
            id: id.into(),
            attributes: IndexMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: PlatformValue) -> Self {
        self.attributes.insert(key.into(), value);
        self
    }
}

/// A page of records of one entity type.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityCollection {
    #[serde(default)]
    pub entity_name: String,
    #[serde(default)]
    pub entities: Vec<EntityRecord>,
    /// Server-side total, `-1` when the server did not count.
    #[serde(default = "unknown_total")]
    pub total_record_count: i64,
    #[serde(default)]
    pub more_records: bool,
    #[serde(default)]
    pub paging_cookie: Option<String>,
}

fn unknown_total() -> i64 {
    -1
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EntityReference {
    pub logical_name: String,
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSetValue {
    pub value: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Money {
    pub value: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ColumnSet {
    #[serde(default)]
    pub all_columns: bool,
    #[serde(default)]
    pub columns: Vec<String>,
}

/// A query carried as FetchXML text.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct FetchQuery {
    pub query: String,
}

//! Shared type definitions for the action tester.
//!
//! - [`parameter`]: parameter metadata and entity-type descriptors
//! - [`value`]: values exchanged with the platform
//! - [`query`]: structured relational queries
//! - [`record`]: raw query rows

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

pub mod parameter;
pub mod query;
pub mod record;
pub mod value;

pub use parameter::{EntityTypeDescriptor, ParameterDirection, ParameterRecord, ParameterSet};
pub use query::{ConditionOperator, JoinOperator, LinkEntity, OrderType, QueryExpression};
pub use record::{MetadataRecord, RecordError, RecordSet};
pub use value::{
    ColumnSet, EntityCollection, EntityRecord, EntityReference, FetchQuery, Money, OptionSetValue, PlatformValue, Primitive, ValueKind,
};

/// Name of the companion panel that receives trace links.
pub const TRACE_VIEWER_TARGET: &str = "Plugin Trace Viewer";

/// A platform-registered custom action, as listed from `workflow` rows.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionSummary {
    /// Workflow identifier; parameter queries filter on it.
    pub id: String,
    /// Display name of the action.
    pub name: String,
    #[serde(default)]
    pub unique_name: Option<String>,
    /// Name of the message the action is invoked through.
    #[serde(default)]
    pub message_name: Option<String>,
    #[serde(default)]
    pub created_by: Option<String>,
    #[serde(default)]
    pub primary_entity: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_managed: bool,
}

impl ActionSummary {
    /// Maps a `workflow` row joined to its `sdkmessage` under alias `M`.
    pub fn from_metadata(record: &MetadataRecord) -> Result<Self, RecordError> {
        let name = record
            .get_str("name")
            .ok_or_else(|| RecordError::missing("workflow", &record.id, "name"))?;
        Ok(Self {
            id: record.id.clone(),
            name,
            unique_name: record.get_str("uniquename"),
            message_name: record.get_str("M.name"),
            created_by: record.get_str("createdby"),
            primary_entity: record.get_str("primaryentity"),
            description: record.get_str("description"),
            is_managed: record.get_bool("ismanaged").unwrap_or(false),
        })
    }

    /// The request name used for execution: the message name, else the
    /// unique name, else the display name.
    pub fn request_name(&self) -> &str {
        self.message_name
            .as_deref()
            .or(self.unique_name.as_deref())
            .unwrap_or(&self.name)
    }
}

/// A solution that contains at least one custom action.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct SolutionSummary {
    pub id: String,
    pub unique_name: String,
    #[serde(default)]
    pub friendly_name: Option<String>,
    #[serde(default)]
    pub version: Option<String>,
}

impl SolutionSummary {
    pub fn from_metadata(record: &MetadataRecord) -> Result<Self, RecordError> {
        let unique_name = record
            .get_str("uniquename")
            .ok_or_else(|| RecordError::missing("solution", &record.id, "uniquename"))?;
        Ok(Self {
            id: record.get_str("solutionid").unwrap_or_else(|| record.id.clone()),
            unique_name,
            friendly_name: record.get_str("friendlyname"),
            version: record.get_str("version"),
        })
    }
}

/// A keyed request ready for invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ActionRequest {
    pub request_name: String,
    pub parameters: IndexMap<String, PlatformValue>,
}

/// Outcome of one invocation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ExecutionResponse {
    pub results: IndexMap<String, PlatformValue>,
    /// Wall time of the remote call in milliseconds.
    pub elapsed_ms: u64,
}

/// Outbound cross-panel event used for deep-linking into the trace viewer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TraceLink {
    pub target: String,
    pub argument: String,
}

impl TraceLink {
    pub fn for_message(message_name: &str) -> Self {
        Self {
            target: TRACE_VIEWER_TARGET.to_string(),
            argument: format!("Message={message_name}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn action_row_reads_aliased_message_name() {
        let row = MetadataRecord::new("wf-1")
            .with("name", json!("Approve Order"))
            .with("uniquename", json!("new_ApproveOrder"))
            .with("M.name", json!("new_ApproveOrder"))
            .with("ismanaged", json!(true));

        let action = ActionSummary::from_metadata(&row).expect("map action");
        assert_eq!(action.id, "wf-1");
        assert_eq!(action.request_name(), "new_ApproveOrder");
        assert!(action.is_managed);
    }

    #[test]
    fn request_name_falls_back_to_display_name() {
        let action = ActionSummary {
            id: "x".into(),
            name: "Plain".into(),
            ..ActionSummary::default()
        };
        assert_eq!(action.request_name(), "Plain");
    }

    #[test]
    fn trace_link_carries_message_argument() {
        let link = TraceLink::for_message("new_ApproveOrder");
        assert_eq!(link.target, "Plugin Trace Viewer");
        assert_eq!(link.argument, "Message=new_ApproveOrder");
    }
}

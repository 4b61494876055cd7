//! File-backed platform service.
//!
//! A fixture is a JSON document describing entity types, solutions and custom
//! actions together with the field rows and canned response of each action.
//! [`FixtureService`] answers the metadata queries from
//! [`crate::metadata::queries`] by their root entity and the `workflowid`,
//! `solutionid`, `ismanaged` and `isvisible` conditions they carry.

use std::path::Path;

use action_tester_types::{ActionRequest, ActionSummary, MetadataRecord, PlatformValue, QueryExpression, RecordSet};
use anyhow::{Context, Result, anyhow, bail};
use async_trait::async_trait;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::PlatformService;

/// One custom action in a fixture.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FixtureAction {
    /// The `workflow` row, including the aliased `M.name` message column.
    pub workflow: MetadataRecord,
    #[serde(default)]
    pub request_fields: Vec<MetadataRecord>,
    #[serde(default)]
    pub response_fields: Vec<MetadataRecord>,
    /// Identifiers of the solutions that contain the action.
    #[serde(default)]
    pub solutions: Vec<String>,
    /// Results returned by a successful execution.
    #[serde(default)]
    pub response: IndexMap<String, PlatformValue>,
    /// When set, execution fails with this message.
    #[serde(default)]
    pub fault: Option<String>,
}

impl FixtureAction {
    fn request_name(&self) -> Option<String> {
        ActionSummary::from_metadata(&self.workflow)
            .ok()
            .map(|summary| summary.request_name().to_string())
    }
}

/// Contents of a fixture file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlatformFixture {
    /// `entity` rows.
    #[serde(default)]
    pub entity_types: Vec<MetadataRecord>,
    /// `solution` rows, carrying `ismanaged` and `isvisible`.
    #[serde(default)]
    pub solutions: Vec<MetadataRecord>,
    #[serde(default)]
    pub actions: Vec<FixtureAction>,
}

/// Serves queries and executions from a [`PlatformFixture`].
#[derive(Debug, Clone, Default)]
pub struct FixtureService {
    fixture: PlatformFixture,
}

impl FixtureService {
    pub fn from_fixture(fixture: PlatformFixture) -> Self {
        Self { fixture }
    }

    /// Loads a fixture from a JSON file.
    pub fn from_path(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).with_context(|| format!("failed to read fixture {}", path.display()))?;
        let fixture: PlatformFixture =
            serde_json::from_str(&content).with_context(|| format!("failed to parse fixture {}", path.display()))?;
        debug!(
            path = %path.display(),
            actions = fixture.actions.len(),
            solutions = fixture.solutions.len(),
            entity_types = fixture.entity_types.len(),
            "fixture loaded"
        );
        Ok(Self { fixture })
    }

    pub fn fixture(&self) -> &PlatformFixture {
        &self.fixture
    }

    fn action_by_id(&self, query: &QueryExpression) -> Result<Option<&FixtureAction>> {
        let id = query
            .find_condition("workflowid")
            .and_then(Value::as_str)
            .ok_or_else(|| anyhow!("{} query has no workflowid condition", query.entity_name))?;
        Ok(self.fixture.actions.iter().find(|action| action.workflow.id == id))
    }

    fn workflow_rows(&self, query: &QueryExpression) -> Vec<MetadataRecord> {
        let solution = query.find_condition("solutionid").and_then(Value::as_str);
        self.fixture
            .actions
            .iter()
            .filter(|action| solution.is_none_or(|solution| action.solutions.iter().any(|id| id == solution)))
            .map(|action| action.workflow.clone())
            .collect()
    }

    fn solution_rows(&self, query: &QueryExpression) -> Vec<MetadataRecord> {
        let managed = query.find_condition("ismanaged").and_then(Value::as_bool);
        let visible = query.find_condition("isvisible").and_then(Value::as_bool);
        self.fixture
            .solutions
            .iter()
            .filter(|row| managed.is_none_or(|managed| row.get_bool("ismanaged").unwrap_or(false) == managed))
            .filter(|row| visible.is_none_or(|visible| row.get_bool("isvisible").unwrap_or(true) == visible))
            .filter(|row| {
                let id = row.get_str("solutionid").unwrap_or_else(|| row.id.clone());
                self.fixture.actions.iter().any(|action| action.solutions.contains(&id))
            })
            .cloned()
            .collect()
    }
}

fn sorted_by_position(rows: &[MetadataRecord]) -> Vec<MetadataRecord> {
    let mut rows = rows.to_vec();
    rows.sort_by_key(|row| row.get_i64("position").unwrap_or_default());
    rows
}

#[async_trait]
impl PlatformService for FixtureService {
    async fn query_records(&self, query: &QueryExpression) -> Result<RecordSet> {
        let rows = match query.entity_name.as_str() {
            "entity" => self.fixture.entity_types.clone(),
            "solution" => self.solution_rows(query),
            "workflow" => self.workflow_rows(query),
            "sdkmessagerequestfield" => self
                .action_by_id(query)?
                .map(|action| sorted_by_position(&action.request_fields))
                .unwrap_or_default(),
            "sdkmessageresponsefield" => self
                .action_by_id(query)?
                .map(|action| sorted_by_position(&action.response_fields))
                .unwrap_or_default(),
            other => bail!("fixture cannot answer queries on '{other}'"),
        };
        debug!(entity = %query.entity_name, rows = rows.len(), "fixture query answered");
        Ok(RecordSet::new(query.entity_name.clone(), rows))
    }

    async fn execute(&self, request: &ActionRequest) -> Result<IndexMap<String, PlatformValue>> {
        let action = self
            .fixture
            .actions
            .iter()
            .find(|action| action.request_name().as_deref() == Some(request.request_name.as_str()))
            .ok_or_else(|| anyhow!("unknown request '{}'", request.request_name))?;
        if let Some(fault) = &action.fault {
            bail!("{fault}");
        }
        debug!(request = %request.request_name, inputs = request.parameters.len(), "fixture execution");
        Ok(action.response.clone())
    }
}

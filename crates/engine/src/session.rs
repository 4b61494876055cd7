//! Session state for one connection to the platform.
//!
//! Remote work (metadata queries and invocations) runs on spawned Tokio
//! tasks. Each task reports back through a [`SessionCompletion`] on the
//! channel returned by [`ActionSession::new`]; the owner of the session feeds
//! completions into [`ActionSession::apply`], which is the only place shared
//! state changes after a load.
//!
//! Every action selection bumps a generation counter. Parameter loads and
//! executions carry the generation they were started under, and completions
//! from an older generation are dropped. At most one execution per selection
//! is in flight; [`ActionSession::execute`] refuses to start another until the
//! first has been applied.

use std::{sync::Arc, time::Instant};

use action_tester_types::{
    ActionSummary, ExecutionResponse, MetadataRecord, ParameterDirection, ParameterSet, PlatformValue, RecordSet, SolutionSummary,
    TraceLink,
};
use action_tester_util::DetailFormat;
use anyhow::Result;
use thiserror::Error;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, info, warn};

use crate::{
    execution::{self, AssemblyError, CoercionError},
    metadata::{self, EntityTypeCache, queries},
    service::PlatformService,
};

/// Failures surfaced to the operator. None of them end the session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("{operation} failed: {message}")]
    Query { operation: String, message: String },
    #[error("executing {request} failed: {message}")]
    Execution { request: String, message: String },
    #[error("no action is selected")]
    NoActionSelected,
    #[error("an execution is already running")]
    ExecutionInProgress,
    #[error("unknown parameter: {name}")]
    UnknownParameter { name: String },
    #[error(transparent)]
    Assembly(#[from] AssemblyError),
    #[error(transparent)]
    Coercion(#[from] CoercionError),
}

impl SessionError {
    fn query(operation: &str, error: &anyhow::Error) -> Self {
        Self::Query {
            operation: operation.to_string(),
            message: format!("{error:#}"),
        }
    }
}

/// Result of a background task, to be passed to [`ActionSession::apply`].
#[derive(Debug)]
pub enum SessionCompletion {
    EntityTypes(Result<RecordSet>),
    Solutions(Result<RecordSet>),
    Actions(Result<RecordSet>),
    Parameters {
        generation: u64,
        result: Result<(RecordSet, RecordSet)>,
    },
    Executed {
        generation: u64,
        request: String,
        result: Result<ExecutionResponse>,
    },
}

/// What changed after a completion was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    EntityTypesReady { count: usize },
    SolutionsLoaded { count: usize },
    ActionsLoaded { count: usize },
    ParametersLoaded {
        request_count: usize,
        response_count: usize,
        ready: bool,
    },
    ExecutionCompleted {
        elapsed_ms: u64,
        populated: usize,
        ready: bool,
    },
    Failed(SessionError),
    /// A completion from a superseded selection was dropped.
    Discarded { generation: u64 },
}

pub struct ActionSession {
    service: Arc<dyn PlatformService>,
    completions: UnboundedSender<SessionCompletion>,
    entity_cache: EntityTypeCache,
    solutions: Vec<SolutionSummary>,
    actions: Vec<ActionSummary>,
    selected_action: Option<ActionSummary>,
    generation: u64,
    request_parameters: Option<ParameterSet>,
    response_parameters: Option<ParameterSet>,
    last_execution: Option<ExecutionResponse>,
    executing: bool,
}

impl ActionSession {
    /// Creates a session and the receiver its background tasks report to.
    pub fn new(service: Arc<dyn PlatformService>) -> (Self, UnboundedReceiver<SessionCompletion>) {
        let (completions, receiver) = mpsc::unbounded_channel();
        let session = Self {
            service,
            completions,
            entity_cache: EntityTypeCache::new(),
            solutions: Vec::new(),
            actions: Vec::new(),
            selected_action: None,
            generation: 0,
            request_parameters: None,
            response_parameters: None,
            last_execution: None,
            executing: false,
        };
        (session, receiver)
    }

    pub fn entity_cache(&self) -> &EntityTypeCache {
        &self.entity_cache
    }

    pub fn solutions(&self) -> &[SolutionSummary] {
        &self.solutions
    }

    pub fn actions(&self) -> &[ActionSummary] {
        &self.actions
    }

    pub fn selected_action(&self) -> Option<&ActionSummary> {
        self.selected_action.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn request_parameters(&self) -> Option<&ParameterSet> {
        self.request_parameters.as_ref()
    }

    pub fn response_parameters(&self) -> Option<&ParameterSet> {
        self.response_parameters.as_ref()
    }

    pub fn last_execution(&self) -> Option<&ExecutionResponse> {
        self.last_execution.as_ref()
    }

    /// Whether an execution for the current selection has not completed yet.
    pub fn is_executing(&self) -> bool {
        self.executing
    }

    /// Starts the entity-type load unless it is running or done.
    pub fn load_entity_types(&mut self) -> bool {
        if !self.entity_cache.begin_load() {
            debug!("entity type load already claimed");
            return false;
        }
        let service = Arc::clone(&self.service);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = service.query_records(&queries::entity_types_query()).await;
            let _ = completions.send(SessionCompletion::EntityTypes(result));
        });
        true
    }

    pub fn load_solutions(&self, managed: bool, include_invisible: bool) {
        let service = Arc::clone(&self.service);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let result = service.query_records(&queries::solutions_query(managed, include_invisible)).await;
            let _ = completions.send(SessionCompletion::Solutions(result));
        });
    }

    /// Lists custom actions, optionally limited to one solution id.
    pub fn load_actions(&self, solution_id: Option<String>) {
        let service = Arc::clone(&self.service);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let query = queries::custom_actions_query(solution_id.as_deref());
            let result = service.query_records(&query).await;
            let _ = completions.send(SessionCompletion::Actions(result));
        });
    }

    /// Looks up a listed action by display name, unique name, message name
    /// or id.
    pub fn find_action(&self, key: &str) -> Option<&ActionSummary> {
        self.actions.iter().find(|action| {
            action.id == key
                || action.name == key
                || action.unique_name.as_deref() == Some(key)
                || action.message_name.as_deref() == Some(key)
        })
    }

    /// Replaces the selection and starts loading its parameters.
    ///
    /// Any previous parameter sets and execution outcome are dropped at once;
    /// in-flight loads for the old selection become stale.
    pub fn select_action(&mut self, action: Option<ActionSummary>) -> u64 {
        self.generation += 1;
        self.request_parameters = None;
        self.response_parameters = None;
        self.last_execution = None;
        self.executing = false;
        self.selected_action = action;

        let generation = self.generation;
        let Some(action) = &self.selected_action else {
            debug!(generation, "selection cleared");
            return generation;
        };
        info!(generation, action = %action.name, "loading action parameters");

        let service = Arc::clone(&self.service);
        let completions = self.completions.clone();
        let action_id = action.id.clone();
        tokio::spawn(async move {
            let result = load_parameter_rows(service.as_ref(), &action_id).await;
            let _ = completions.send(SessionCompletion::Parameters { generation, result });
        });
        generation
    }

    /// Sets or clears a request value and returns the new readiness.
    pub fn set_parameter_value(&mut self, name: &str, value: Option<PlatformValue>) -> Result<bool, SessionError> {
        let record = self
            .request_parameters
            .as_mut()
            .and_then(|parameters| parameters.find_mut(name))
            .ok_or_else(|| SessionError::UnknownParameter { name: name.to_string() })?;
        match value {
            Some(value) => {
                let display = execution::display_text(&value);
                record.set_value(value, display);
            }
            None => record.clear_value(),
        }
        Ok(self.is_ready())
    }

    /// Coerces operator text into a request value. Empty text clears it.
    pub fn set_parameter_text(&mut self, name: &str, text: &str) -> Result<bool, SessionError> {
        let record = self
            .request_parameters
            .as_mut()
            .and_then(|parameters| parameters.find_mut(name))
            .ok_or_else(|| SessionError::UnknownParameter { name: name.to_string() })?;
        if text.is_empty() {
            record.clear_value();
        } else {
            let value = execution::coerce_input(record, text)?;
            record.set_value(value, text);
        }
        Ok(self.is_ready())
    }

    pub fn is_ready(&self) -> bool {
        execution::is_ready_to_execute(self.selected_action.as_ref(), self.request_parameters.as_ref())
    }

    /// Assembles the request and starts the invocation.
    ///
    /// Output values are cleared before the call. A missing required value
    /// or an execution that is still running aborts without side effects.
    pub fn execute(&mut self) -> Result<u64, SessionError> {
        if self.executing {
            return Err(SessionError::ExecutionInProgress);
        }
        let action = self.selected_action.as_ref().ok_or(SessionError::NoActionSelected)?;
        let parameters = self.request_parameters.as_ref().ok_or(SessionError::NoActionSelected)?;
        let request = execution::assemble_request(action.request_name(), parameters)?;

        if let Some(outputs) = self.response_parameters.as_mut() {
            execution::clear_values(outputs);
        }
        self.last_execution = None;
        self.executing = true;

        let generation = self.generation;
        info!(generation, request = %request.request_name, inputs = request.parameters.len(), "executing action");
        let service = Arc::clone(&self.service);
        let completions = self.completions.clone();
        tokio::spawn(async move {
            let started = Instant::now();
            let result = service.execute(&request).await.map(|results| ExecutionResponse {
                results,
                elapsed_ms: u64::try_from(started.elapsed().as_millis()).unwrap_or(u64::MAX),
            });
            let _ = completions.send(SessionCompletion::Executed {
                generation,
                request: request.request_name,
                result,
            });
        });
        Ok(generation)
    }

    /// Deep link into the trace viewer for the last successful execution.
    pub fn trace_link(&self) -> Option<TraceLink> {
        self.last_execution.as_ref()?;
        let action = self.selected_action.as_ref()?;
        Some(TraceLink::for_message(action.request_name()))
    }

    /// Detail text of one output parameter.
    pub fn result_detail(&self, name: &str, format: DetailFormat) -> Option<String> {
        let record = self.response_parameters.as_ref()?.find(name)?;
        execution::result_detail(record, format)
    }

    /// Folds a background result into the session.
    pub fn apply(&mut self, completion: SessionCompletion) -> SessionEvent {
        match completion {
            SessionCompletion::EntityTypes(Ok(rows)) => {
                let descriptors = metadata::descriptors_from_records(&rows);
                let count = self.entity_cache.complete_load(descriptors);
                SessionEvent::EntityTypesReady { count }
            }
            SessionCompletion::EntityTypes(Err(error)) => {
                warn!(error = %format!("{error:#}"), "entity type load failed");
                self.entity_cache.fail_load();
                SessionEvent::Failed(SessionError::query("loading entity types", &error))
            }
            SessionCompletion::Solutions(Ok(rows)) => {
                self.solutions = map_rows(&rows, SolutionSummary::from_metadata);
                info!(count = self.solutions.len(), "solutions loaded");
                SessionEvent::SolutionsLoaded { count: self.solutions.len() }
            }
            SessionCompletion::Solutions(Err(error)) => {
                warn!(error = %format!("{error:#}"), "solution load failed");
                SessionEvent::Failed(SessionError::query("loading solutions", &error))
            }
            SessionCompletion::Actions(Ok(rows)) => {
                self.actions = map_rows(&rows, ActionSummary::from_metadata);
                info!(count = self.actions.len(), "custom actions loaded");
                SessionEvent::ActionsLoaded { count: self.actions.len() }
            }
            SessionCompletion::Actions(Err(error)) => {
                warn!(error = %format!("{error:#}"), "custom action load failed");
                SessionEvent::Failed(SessionError::query("loading custom actions", &error))
            }
            SessionCompletion::Parameters { generation, .. } | SessionCompletion::Executed { generation, .. }
                if generation != self.generation =>
            {
                debug!(generation, current = self.generation, "discarding stale completion");
                SessionEvent::Discarded { generation }
            }
            SessionCompletion::Parameters { result, .. } => match result {
                Ok((request_rows, response_rows)) => {
                    let request = metadata::build_parameter_set(ParameterDirection::Request, &request_rows, &self.entity_cache);
                    let response = metadata::build_parameter_set(ParameterDirection::Response, &response_rows, &self.entity_cache);
                    let (request_count, response_count) = (request.len(), response.len());
                    self.request_parameters = Some(request);
                    self.response_parameters = Some(response);
                    let ready = self.is_ready();
                    info!(request_count, response_count, ready, "action parameters loaded");
                    SessionEvent::ParametersLoaded {
                        request_count,
                        response_count,
                        ready,
                    }
                }
                Err(error) => {
                    warn!(error = %format!("{error:#}"), "parameter load failed");
                    SessionEvent::Failed(SessionError::query("loading parameters", &error))
                }
            },
            SessionCompletion::Executed { request, result, .. } => {
                self.executing = false;
                self.apply_execution(request, result)
            }
        }
    }

    fn apply_execution(&mut self, request: String, result: Result<ExecutionResponse>) -> SessionEvent {
        match result {
            Ok(response) => {
                let populated = match self.response_parameters.as_mut() {
                    Some(outputs) => execution::populate_values(outputs, &response.results),
                    None => 0,
                };
                let elapsed_ms = response.elapsed_ms;
                info!(request = %request, elapsed_ms, populated, "execution completed");
                self.last_execution = Some(response);
                SessionEvent::ExecutionCompleted {
                    elapsed_ms,
                    populated,
                    ready: self.is_ready(),
                }
            }
            Err(error) => {
                warn!(request = %request, error = %format!("{error:#}"), "execution failed");
                SessionEvent::Failed(SessionError::Execution {
                    request,
                    message: format!("{error:#}"),
                })
            }
        }
    }

    /// Waits for the next background result and applies it.
    pub async fn apply_next(&mut self, completions: &mut UnboundedReceiver<SessionCompletion>) -> Option<SessionEvent> {
        let completion = completions.recv().await?;
        Some(self.apply(completion))
    }
}

async fn load_parameter_rows(service: &dyn PlatformService, action_id: &str) -> Result<(RecordSet, RecordSet)> {
    let request = service.query_records(&queries::request_parameters_query(action_id)).await?;
    let response = service.query_records(&queries::response_parameters_query(action_id)).await?;
    Ok((request, response))
}

fn map_rows<T, E: std::fmt::Display>(rows: &RecordSet, map: impl Fn(&MetadataRecord) -> Result<T, E>) -> Vec<T> {
    rows.records
        .iter()
        .filter_map(|row| match map(row) {
            Ok(item) => Some(item),
            Err(error) => {
                warn!(%error, entity = %rows.entity_name, "dropping metadata row");
                None
            }
        })
        .collect()
}

//! Readiness gate for the execute affordance.

use action_tester_types::{ActionSummary, ParameterRecord, ParameterSet};

/// Whether the selected action can be invoked with the current inputs.
///
/// No action or no loaded request set means not ready. Otherwise every
/// explicitly required parameter must carry a value; the empty set is ready.
pub fn is_ready_to_execute(action: Option<&ActionSummary>, parameters: Option<&ParameterSet>) -> bool {
    match (action, parameters) {
        (Some(_), Some(parameters)) => missing_required(parameters).next().is_none(),
        _ => false,
    }
}

/// Required parameters that still lack a value, in set order.
pub fn missing_required(parameters: &ParameterSet) -> impl Iterator<Item = &ParameterRecord> {
    parameters
        .iter()
        .filter(|record| record.is_required() && !record.has_value())
}

//! Population of response parameters from execution results.

use action_tester_types::{ParameterRecord, ParameterSet, PlatformValue};
use action_tester_util::{DetailFormat, format_detail};
use indexmap::IndexMap;
use tracing::debug;

use crate::render::{RenderOptions, reference_projection, render_value};

/// Clears every output value ahead of a new execution.
pub fn clear_values(parameters: &mut ParameterSet) {
    for record in &mut parameters.records {
        record.clear_value();
    }
}

/// Copies results onto the response records of the same name.
///
/// Returns the number of records populated. Result keys without a matching
/// record are ignored.
pub fn populate_values(parameters: &mut ParameterSet, results: &IndexMap<String, PlatformValue>) -> usize {
    let mut populated = 0;
    for (name, value) in results {
        match parameters.find_mut(name) {
            Some(record) => {
                record.set_value(value.clone(), display_text(value));
                populated += 1;
            }
            None => debug!(result = %name, "result has no matching response parameter"),
        }
    }
    populated
}

/// Short display form of a value, as shown next to an output parameter.
pub fn display_text(value: &PlatformValue) -> String {
    match value {
        PlatformValue::Money(money) => money.value.to_string(),
        PlatformValue::OptionSet(option) => option.value.to_string(),
        PlatformValue::Record(record) => format!("{} {}", record.logical_name, record.id),
        PlatformValue::Reference(reference) => match reference.name.as_deref().filter(|name| !name.is_empty()) {
            Some(name) => name.to_string(),
            None => reference_projection(reference),
        },
        PlatformValue::Null
        | PlatformValue::Collection(_)
        | PlatformValue::ColumnSet(_)
        | PlatformValue::Query(_)
        | PlatformValue::Other(_) => render_value(value, RenderOptions::plain()),
    }
}

/// Full text for the detail view of one output record.
///
/// Strings are shown as-is and everything else is rendered with types and
/// expansion; the result is then pretty-printed in `format`. Records without
/// a value have no detail.
pub fn result_detail(record: &ParameterRecord, format: DetailFormat) -> Option<String> {
    let value = record.raw_value.as_ref()?;
    let text = match value.as_text() {
        Some(text) => text.to_string(),
        None => render_value(value, RenderOptions::default()),
    };
    Some(format_detail(&text, format))
}

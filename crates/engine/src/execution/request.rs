//! Assembly of keyed requests from populated parameter sets.

use action_tester_types::{ActionRequest, ParameterSet};
use indexmap::IndexMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AssemblyError {
    #[error("Missing value for required parameter: {name}")]
    MissingRequired { name: String },
}

impl AssemblyError {
    pub fn missing(name: impl Into<String>) -> Self {
        Self::MissingRequired { name: name.into() }
    }
}

/// Maps every value-bearing record to `request[name] = value`.
///
/// Fails on the first required record without a value; no partial request
/// is ever returned. The parameter set is not modified.
pub fn assemble_request(request_name: &str, parameters: &ParameterSet) -> Result<ActionRequest, AssemblyError> {
    let mut keyed = IndexMap::with_capacity(parameters.len());
    for record in parameters.iter() {
        match &record.raw_value {
            Some(value) => {
                keyed.insert(record.name.clone(), value.clone());
            }
            None if record.is_required() => return Err(AssemblyError::missing(&record.name)),
            None => {}
        }
    }
    Ok(ActionRequest {
        request_name: request_name.to_string(),
        parameters: keyed,
    })
}

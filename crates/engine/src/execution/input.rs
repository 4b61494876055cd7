//! Coercion of operator-entered text into request values.
//!
//! The target shape is chosen from the first word of the record's resolved
//! type label, so `"EntityReference Account"` coerces like `"EntityReference"`.
//! Records without a label take the text verbatim.

use action_tester_types::{ColumnSet, EntityReference, FetchQuery, Money, OptionSetValue, ParameterRecord, PlatformValue, Primitive};
use chrono::{DateTime, NaiveDate, Utc};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoercionError {
    #[error("'{input}' is not a valid {expected} value for parameter {name}")]
    Invalid { name: String, expected: String, input: String },
    #[error("parameter {name}: entity reference must look like <logicalname>:<id>")]
    ReferenceFormat { name: String },
    #[error("parameter {name} has type {type_label}, which cannot be entered as text")]
    Unsupported { name: String, type_label: String },
}

impl CoercionError {
    fn invalid(record: &ParameterRecord, expected: &str, input: &str) -> Self {
        Self::Invalid {
            name: record.name.clone(),
            expected: expected.to_string(),
            input: input.to_string(),
        }
    }
}

/// Converts `input` into a value matching the record's type label.
pub fn coerce_input(record: &ParameterRecord, input: &str) -> Result<PlatformValue, CoercionError> {
    let trimmed = input.trim();
    let Some(base) = record
        .resolved_type
        .as_deref()
        .and_then(|label| label.split_whitespace().next())
    else {
        return Ok(PlatformValue::text(input));
    };

    let value = match base {
        "String" => PlatformValue::text(input),
        "Int16" | "Int32" | "Int64" | "Integer" => trimmed
            .parse::<i64>()
            .map(|value| PlatformValue::Other(Primitive::Integer(value)))
            .map_err(|_| CoercionError::invalid(record, base, input))?,
        "Decimal" | "Double" | "Float" | "Single" => PlatformValue::Other(Primitive::Decimal(parse_number(record, base, trimmed)?)),
        "Money" => PlatformValue::Money(Money {
            value: parse_number(record, base, trimmed)?,
        }),
        "Boolean" => {
            let flag = parse_bool(trimmed).ok_or_else(|| CoercionError::invalid(record, base, input))?;
            PlatformValue::Other(Primitive::Boolean(flag))
        }
        "OptionSetValue" => PlatformValue::OptionSet(OptionSetValue {
            value: trimmed.parse().map_err(|_| CoercionError::invalid(record, base, input))?,
        }),
        "DateTime" => {
            let timestamp = parse_datetime(trimmed).ok_or_else(|| CoercionError::invalid(record, base, input))?;
            PlatformValue::Other(Primitive::DateTime(timestamp))
        }
        "Guid" => {
            if !is_guid(trimmed) {
                return Err(CoercionError::invalid(record, base, input));
            }
            PlatformValue::Other(Primitive::Guid(trimmed.to_ascii_lowercase()))
        }
        "EntityReference" => PlatformValue::Reference(parse_reference(record, trimmed)?),
        "ColumnSet" => PlatformValue::ColumnSet(ColumnSet {
            all_columns: trimmed == "*",
            columns: if trimmed == "*" {
                Vec::new()
            } else {
                trimmed
                    .split(',')
                    .map(str::trim)
                    .filter(|column| !column.is_empty())
                    .map(str::to_string)
                    .collect()
            },
        }),
        "FetchExpression" => PlatformValue::Query(FetchQuery { query: input.to_string() }),
        other => serde_json::from_str(trimmed).map_err(|_| CoercionError::Unsupported {
            name: record.name.clone(),
            type_label: other.to_string(),
        })?,
    };
    Ok(value)
}

fn parse_number(record: &ParameterRecord, expected: &str, text: &str) -> Result<f64, CoercionError> {
    text.parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| CoercionError::invalid(record, expected, text))
}

fn parse_bool(text: &str) -> Option<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

fn parse_datetime(text: &str) -> Option<DateTime<Utc>> {
    if let Ok(parsed) = DateTime::parse_from_rfc3339(text) {
        return Some(parsed.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| naive.and_utc())
}

fn is_guid(text: &str) -> bool {
    let groups: Vec<&str> = text.split('-').collect();
    let lengths = [8, 4, 4, 4, 12];
    groups.len() == lengths.len()
        && groups
            .iter()
            .zip(lengths)
            .all(|(group, length)| group.len() == length && group.chars().all(|c| c.is_ascii_hexdigit()))
}

fn parse_reference(record: &ParameterRecord, text: &str) -> Result<EntityReference, CoercionError> {
    let (logical_name, id) = match text.split_once(':') {
        Some((logical_name, id)) => (logical_name.trim().to_string(), id.trim()),
        None => match &record.bound_entity {
            Some(entity) => (entity.logical_name.clone(), text),
            None => return Err(CoercionError::ReferenceFormat { name: record.name.clone() }),
        },
    };
    if logical_name.is_empty() || id.is_empty() {
        return Err(CoercionError::ReferenceFormat { name: record.name.clone() });
    }
    Ok(EntityReference {
        logical_name,
        id: id.to_string(),
        name: None,
    })
}

//! # Structured Text Utilities
//!
//! Helpers for presenting result text: indentation for tree rendering,
//! format detection, and pretty-printing of JSON and XML payloads.

use quick_xml::{Reader, Writer, events::Event};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of spaces per indentation level.
pub const INDENT_WIDTH: usize = 2;

/// How a result detail should be presented.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailFormat {
    /// Pick a format from the text itself (see [`detect_format`]).
    #[default]
    Auto,
    Plain,
    Json,
    Xml,
}

impl std::str::FromStr for DetailFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "auto" => Ok(Self::Auto),
            "plain" | "text" => Ok(Self::Plain),
            "json" => Ok(Self::Json),
            "xml" => Ok(Self::Xml),
            other => Err(format!("unknown detail format '{other}'; expected auto, plain, json or xml")),
        }
    }
}

/// Failure while re-serializing structured text.
#[derive(Debug, Error)]
pub enum StructuredTextError {
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid XML: {0}")]
    Xml(String),
}

/// Whitespace prefix for the given depth.
pub fn indent(depth: usize) -> String {
    " ".repeat(depth * INDENT_WIDTH)
}

/// Re-indents every line after the first so that multi-line text lines up
/// under the given depth.
pub fn reindent_lines(text: &str, depth: usize) -> String {
    if !text.contains('\n') {
        return text.to_string();
    }
    text.replace('\n', &format!("\n{}", indent(depth)))
}

/// Guesses the format of a result string from its first character.
pub fn detect_format(text: &str) -> DetailFormat {
    match text.trim_start().chars().next() {
        Some('{') => DetailFormat::Json,
        Some('<') => DetailFormat::Xml,
        _ => DetailFormat::Plain,
    }
}

/// Pretty-prints `text` in the requested format.
///
/// `Auto` resolves through [`detect_format`]; `Plain` returns the text
/// unchanged.
pub fn pretty_print(text: &str, format: DetailFormat) -> Result<String, StructuredTextError> {
    let format = match format {
        DetailFormat::Auto => detect_format(text),
        other => other,
    };
    match format {
        DetailFormat::Json => {
            let parsed: serde_json::Value = serde_json::from_str(text)?;
            Ok(serde_json::to_string_pretty(&parsed)?)
        }
        DetailFormat::Xml => pretty_xml(text),
        DetailFormat::Plain | DetailFormat::Auto => Ok(text.to_string()),
    }
}

/// Formats a result detail for display. Empty text passes through; a
/// pretty-print failure is replaced by an inline error marker.
pub fn format_detail(text: &str, format: DetailFormat) -> String {
    if text.is_empty() {
        return String::new();
    }
    match pretty_print(text, format) {
        Ok(pretty) => pretty,
        Err(error) => format!("Error: {error}"),
    }
}

fn pretty_xml(text: &str) -> Result<String, StructuredTextError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', INDENT_WIDTH);
    loop {
        match reader.read_event() {
            Ok(Event::Eof) => break,
            Ok(event) => writer
                .write_event(event)
                .map_err(|error| StructuredTextError::Xml(error.to_string()))?,
            Err(error) => return Err(StructuredTextError::Xml(error.to_string())),
        }
    }
    String::from_utf8(writer.into_inner()).map_err(|error| StructuredTextError::Xml(error.to_string()))
}

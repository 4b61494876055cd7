//! Utility helpers shared by the action tester crates.
//!
//! - [`structured_text`]: indentation and JSON/XML pretty-printing
//! - [`preferences`]: JSON-backed render preferences
//! - [`path_processing`]: config paths and tilde expansion

pub mod path_processing;
pub mod preferences;
pub mod structured_text;

pub use path_processing::{config_file_path, expand_tilde};
pub use preferences::{PreferencesError, PreferencesPayload, UserPreferences};
pub use structured_text::{DetailFormat, StructuredTextError, detect_format, format_detail, indent, pretty_print, reindent_lines};

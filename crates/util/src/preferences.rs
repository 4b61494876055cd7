//! User preference persistence for the action tester.
//!
//! A tiny JSON-backed store recording how results are rendered by default:
//! whether type annotations are appended, whether collections are expanded,
//! and which format the result detail uses. The file is written to the
//! standard configuration directory (`~/.config/action-tester/preferences.json`
//! on most platforms) and is safe to share between threads thanks to the
//! internal `Mutex`.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::{config_file_path, expand_tilde, structured_text::DetailFormat};

/// Environment variable allowing callers to override the preferences file path.
pub const PREFERENCES_PATH_ENV: &str = "ACTION_TESTER_PREFERENCES_PATH";

/// Default filename for the JSON payload.
pub const PREFERENCES_FILE_NAME: &str = "preferences.json";

/// Error surfaced when reading or writing preferences fails.
#[derive(Debug, Error)]
pub enum PreferencesError {
    /// I/O failure (for example, permissions or missing directory).
    #[error("preferences I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// Serialization or deserialization failure.
    #[error("preferences serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persisted preference values.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PreferencesPayload {
    /// Append the dynamic type name to rendered scalars.
    pub attribute_types: bool,
    /// Render every record of a collection, not only its summary.
    pub expand_collections: bool,
    /// Format used for the result detail view.
    pub detail_format: DetailFormat,
}

impl Default for PreferencesPayload {
    fn default() -> Self {
        Self {
            attribute_types: true,
            expand_collections: true,
            detail_format: DetailFormat::Auto,
        }
    }
}

/// Thread-safe preferences store backed by a JSON file.
#[derive(Debug, Default)]
pub struct UserPreferences {
    path: PathBuf,
    payload: Mutex<PreferencesPayload>,
    persist_to_disk: bool,
}

impl UserPreferences {
    /// Opens the store at the default location (see [`PREFERENCES_PATH_ENV`]).
    pub fn new() -> Result<Self, PreferencesError> {
        Self::open(default_preferences_path())
    }

    /// Opens the store at an explicit path.
    pub fn open(path: PathBuf) -> Result<Self, PreferencesError> {
        let payload = load_payload(&path)?;
        debug!(path = %path.display(), "loaded preferences");
        Ok(Self {
            path,
            payload: Mutex::new(payload),
            persist_to_disk: true,
        })
    }

    /// Build an in-memory store used as a fallback when the config directory cannot be accessed.
    pub fn ephemeral() -> Self {
        Self {
            path: PathBuf::new(),
            payload: Mutex::new(PreferencesPayload::default()),
            persist_to_disk: false,
        }
    }

    /// Path to the underlying JSON file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current values.
    pub fn snapshot(&self) -> PreferencesPayload {
        self.lock().clone()
    }

    /// Applies `change` and persists the result.
    pub fn update(&self, change: impl FnOnce(&mut PreferencesPayload)) -> Result<PreferencesPayload, PreferencesError> {
        let mut payload = self.lock();
        change(&mut payload);
        if self.persist_to_disk {
            self.save_locked(&payload)?;
        }
        Ok(payload.clone())
    }

    fn lock(&self) -> MutexGuard<'_, PreferencesPayload> {
        self.payload.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save_locked(&self, payload: &PreferencesPayload) -> Result<(), PreferencesError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let data = serde_json::to_string_pretty(payload)?;
        fs::write(&self.path, data)?;
        Ok(())
    }
}

fn default_preferences_path() -> PathBuf {
    if let Ok(path) = env::var(PREFERENCES_PATH_ENV) {
        let trimmed = path.trim();
        if !trimmed.is_empty() {
            return expand_tilde(trimmed);
        }
    }
    config_file_path(PREFERENCES_FILE_NAME)
}

fn load_payload(path: &Path) -> Result<PreferencesPayload, PreferencesError> {
    match fs::read_to_string(path) {
        Ok(data) => match serde_json::from_str(&data) {
            Ok(payload) => Ok(payload),
            Err(error) => {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "Failed to parse preferences file; using defaults"
                );
                Ok(PreferencesPayload::default())
            }
        },
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Ok(PreferencesPayload::default()),
        Err(error) => Err(PreferencesError::Io(error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let prefs = UserPreferences::open(dir.path().join("prefs.json")).expect("open");
        assert_eq!(prefs.snapshot(), PreferencesPayload::default());
        assert!(prefs.snapshot().attribute_types);
    }

    #[test]
    fn updates_are_persisted_and_reloaded() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("nested").join("prefs.json");
        let prefs = UserPreferences::open(path.clone()).expect("open");
        prefs
            .update(|payload| {
                payload.expand_collections = false;
                payload.detail_format = DetailFormat::Xml;
            })
            .expect("update");

        let reloaded = UserPreferences::open(path).expect("reopen");
        let snapshot = reloaded.snapshot();
        assert!(!snapshot.expand_collections);
        assert_eq!(snapshot.detail_format, DetailFormat::Xml);
        assert!(snapshot.attribute_types);
    }

    #[test]
    fn unparsable_file_falls_back_to_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        fs::write(&path, "not json").expect("write");
        let prefs = UserPreferences::open(path).expect("open");
        assert_eq!(prefs.snapshot(), PreferencesPayload::default());
    }

    #[test]
    fn partial_file_keeps_remaining_defaults() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("prefs.json");
        fs::write(&path, r#"{"attribute_types": false}"#).expect("write");
        let snapshot = UserPreferences::open(path).expect("open").snapshot();
        assert!(!snapshot.attribute_types);
        assert!(snapshot.expand_collections);
    }

    #[test]
    fn env_var_overrides_default_location() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("custom.json");
        temp_env::with_var(PREFERENCES_PATH_ENV, Some(path.to_string_lossy().to_string()), || {
            let prefs = UserPreferences::new().expect("open");
            assert_eq!(prefs.path(), path.as_path());
        });
    }

    #[test]
    fn ephemeral_store_never_writes() {
        let prefs = UserPreferences::ephemeral();
        prefs.update(|payload| payload.attribute_types = false).expect("update");
        assert!(!prefs.snapshot().attribute_types);
        assert_eq!(prefs.path(), Path::new(""));
    }
}

//! Persisted user preferences.
//!
//! The sensitivity setting survives restarts and is process-wide (one
//! setting, not per-document). The store is an injected interface so the
//! coordinator is testable without a real storage backend.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::warn;

use rhetor_common::config::config_dir;
use rhetor_common::Result;

use crate::sensitivity::SensitivityLevel;

/// Storage boundary for the user's sensitivity preference.
///
/// `load` never fails: corrupt or missing values fall back to the default.
/// `save` is last-write-wins.
pub trait PreferenceStore: Send + Sync {
    /// Load the persisted level, defaulting to `Medium`.
    fn load(&self) -> SensitivityLevel;

    /// Persist the level.
    fn save(&self, level: SensitivityLevel) -> Result<()>;
}

/// On-disk preference document.
#[derive(Debug, Serialize, Deserialize)]
struct PreferenceDocument {
    /// Persisted wire form of the level ("LOW" | "MEDIUM" | "HIGH").
    sensitivity: String,
    /// When the preference was last written.
    updated_at: DateTime<Utc>,
}

/// File-backed preference store under the Rhetor home directory.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    /// Store backed by an explicit file path.
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    /// Store at the default location, `~/.rhetor/preferences.json`.
    pub fn with_default_path() -> Self {
        Self::new(config_dir().join("preferences.json"))
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load(&self) -> SensitivityLevel {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            // Absent file is the common first-run case, not an error.
            Err(_) => return SensitivityLevel::default(),
        };

        match serde_json::from_str::<PreferenceDocument>(&content) {
            Ok(doc) => SensitivityLevel::parse_or_default(&doc.sensitivity),
            Err(e) => {
                warn!(
                    path = %self.path.display(),
                    error = %e,
                    "Corrupt preference file, using default sensitivity"
                );
                SensitivityLevel::default()
            }
        }
    }

    fn save(&self, level: SensitivityLevel) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let doc = PreferenceDocument {
            sensitivity: level.as_str().to_string(),
            updated_at: Utc::now(),
        };
        fs::write(&self.path, serde_json::to_string_pretty(&doc)?)?;
        Ok(())
    }
}

/// In-memory store for tests and embedders that manage persistence
/// themselves.
#[derive(Default)]
pub struct MemoryPreferenceStore {
    level: Mutex<SensitivityLevel>,
}

impl MemoryPreferenceStore {
    /// Store starting at the given level.
    pub fn with_level(level: SensitivityLevel) -> Self {
        Self {
            level: Mutex::new(level),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load(&self) -> SensitivityLevel {
        *self.level.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn save(&self, level: SensitivityLevel) -> Result<()> {
        *self
            .level
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = level;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_store_round_trip() {
        let store = MemoryPreferenceStore::default();
        assert_eq!(store.load(), SensitivityLevel::Medium);

        store.save(SensitivityLevel::High).unwrap();
        assert_eq!(store.load(), SensitivityLevel::High);
    }

    #[test]
    fn test_missing_file_defaults_to_medium() {
        let dir = tempfile::tempdir().unwrap();
        let store = FilePreferenceStore::new(dir.path().join("does-not-exist.json"));
        assert_eq!(store.load(), SensitivityLevel::Medium);
    }
}

//! JSON file-based preference store.
//!
//! Uses atomic file writes (write-to-temp + rename) so a crash mid-write never
//! leaves a truncated file behind.
//!
//! # File Format
//!
//! ```json
//! {
//!   "version": 1,
//!   "unit": "kilograms",
//!   "updated_at": "2024-05-01T12:00:00Z"
//! }
//! ```
//!
//! The unit is stored as a plain string so that an unknown value written by a
//! newer or older build degrades to grams instead of failing to parse.

use super::backend::PreferenceStore;
use crate::domain::{Result, TrackerError, UnitType};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default file name inside the data directory.
pub const PREFERENCES_FILE: &str = "preferences.json";

const FORMAT_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
struct PreferenceData {
    version: u32,

    #[serde(default)]
    unit: Option<String>,

    #[serde(default)]
    updated_at: Option<DateTime<Utc>>,
}

/// Preference store persisted to a JSON file.
#[derive(Debug, Clone)]
pub struct JsonPreferences {
    file_path: PathBuf,
}

impl JsonPreferences {
    /// Opens a preference file, creating parent directories as needed.
    ///
    /// The file itself is created on the first write.
    ///
    /// # Errors
    ///
    /// Returns an error if the parent directory cannot be created.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use material_tracker::preferences::JsonPreferences;
    /// use std::path::PathBuf;
    ///
    /// let prefs = JsonPreferences::new(PathBuf::from("/tmp/material-tracker/preferences.json"))?;
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    pub fn new(file_path: PathBuf) -> Result<Self> {
        if let Some(parent) = file_path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        tracing::debug!(path = ?file_path, "preference store opened");
        Ok(Self { file_path })
    }

    /// Opens [`PREFERENCES_FILE`] inside `dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if `dir` cannot be created.
    pub fn in_dir(dir: &Path) -> Result<Self> {
        Self::new(dir.join(PREFERENCES_FILE))
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.file_path
    }

    fn load(&self) -> Result<Option<PreferenceData>> {
        if !self.file_path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&self.file_path)?;
        let data: PreferenceData = serde_json::from_str(&contents)
            .map_err(|e| TrackerError::Storage(format!("failed to parse preferences: {e}")))?;
        Ok(Some(data))
    }

    fn save(&self, data: &PreferenceData) -> Result<()> {
        let json = serde_json::to_string_pretty(data)
            .map_err(|e| TrackerError::Storage(format!("failed to serialize preferences: {e}")))?;

        let tmp_path = self.file_path.with_extension("tmp");
        std::fs::write(&tmp_path, json)?;
        std::fs::rename(&tmp_path, &self.file_path)?;
        Ok(())
    }
}

#[async_trait]
impl PreferenceStore for JsonPreferences {
    async fn get_unit(&self) -> UnitType {
        let _span = tracing::debug_span!("get_unit", path = ?self.file_path).entered();

        match self.load() {
            Ok(Some(PreferenceData { unit: Some(raw), .. })) => match raw.parse::<UnitType>() {
                Ok(unit) => unit,
                Err(err) => {
                    tracing::warn!(error = %err, "stored unit not recognised, using grams");
                    UnitType::Grams
                }
            },
            Ok(_) => UnitType::Grams,
            Err(err) => {
                tracing::warn!(error = %err, "preferences unreadable, using grams");
                UnitType::Grams
            }
        }
    }

    async fn set_unit(&self, unit: UnitType) -> Result<()> {
        let _span = tracing::debug_span!("set_unit", unit = unit.key()).entered();

        self.save(&PreferenceData {
            version: FORMAT_VERSION,
            unit: Some(unit.key().to_string()),
            updated_at: Some(Utc::now()),
        })?;
        tracing::debug!("unit preference saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_file_reads_as_grams() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = JsonPreferences::in_dir(dir.path()).unwrap();
        assert_eq!(prefs.get_unit().await, UnitType::Grams);
        assert!(!prefs.path().exists());
    }

    #[tokio::test]
    async fn write_leaves_no_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = JsonPreferences::in_dir(dir.path()).unwrap();
        prefs.set_unit(UnitType::Pounds).await.unwrap();

        assert!(prefs.path().exists());
        assert!(!prefs.path().with_extension("tmp").exists());

        let raw = std::fs::read_to_string(prefs.path()).unwrap();
        assert!(raw.contains("\"unit\": \"pounds\""));
        assert!(raw.contains("\"version\": 1"));
    }
}

/// JSON settings persistence with atomic replacement
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::error::{RecorderError, Result};
use crate::store::SettingsStore;
use crate::types::RecorderSettings;

/// Settings stored as a single JSON document
pub struct JsonSettingsStore {
    path: PathBuf,
}

impl JsonSettingsStore {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        JsonSettingsStore {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl SettingsStore for JsonSettingsStore {
    /// Missing file means a fresh install; defaults apply
    fn load(&self) -> Result<RecorderSettings> {
        if !self.path.exists() {
            debug!("No settings file at {}, using defaults", self.path.display());
            return Ok(RecorderSettings::default());
        }

        let content = std::fs::read_to_string(&self.path)?;
        let settings = serde_json::from_str(&content)?;
        Ok(settings)
    }

    /// Write-then-rename so a crash never leaves a truncated settings file
    fn save(&self, settings: &RecorderSettings) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let content = serde_json::to_string_pretty(settings)?;
        let tmp = self.path.with_extension("tmp");

        std::fs::write(&tmp, content)
            .map_err(|e| RecorderError::Settings(format!("{}: {}", tmp.display(), e)))?;
        std::fs::rename(&tmp, &self.path)
            .map_err(|e| RecorderError::Settings(format!("{}: {}", self.path.display(), e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use crate::types::RecordingEntry;

    use super::*;

    #[test]
    fn test_missing_file_loads_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));

        let settings = store.load().unwrap();
        assert!(settings.tick.is_empty());
        assert_eq!(settings.filter_window_secs, 60);
    }

    #[test]
    fn test_save_load_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("settings.json"));

        let mut settings = RecorderSettings::default();
        settings.filter_window_secs = 30;
        settings.tick.insert(
            "rb2110@SHFE".to_string(),
            RecordingEntry {
                symbol: "rb2110".to_string(),
                exchange: "SHFE".to_string(),
                gateway_name: "CTP".to_string(),
            },
        );

        store.save(&settings).unwrap();
        let loaded = store.load().unwrap();

        assert_eq!(loaded.filter_window_secs, 30);
        assert_eq!(loaded.tick.len(), 1);
        assert_eq!(loaded.tick["rb2110@SHFE"].gateway_name, "CTP");
    }

    #[test]
    fn test_save_creates_parent_directory() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonSettingsStore::new(dir.path().join("nested/settings.json"));

        store.save(&RecorderSettings::default()).unwrap();
        assert!(dir.path().join("nested/settings.json").exists());
    }
}

//! Durable client-side preferences.
//!
//! The player persists exactly one value: the last quality label the user
//! picked. It is read when a player is created and written on every quality
//! change.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
    sync::Mutex,
};

use crate::{
    error::{ReelsyncError, Result},
    types::QualityLabel,
};

/// Key the quality preference is stored under.
pub const QUALITY_KEY: &str = "preferredQuality";

const PREFERENCES_FILE: &str = "preferences.json";

pub trait PreferenceStore: Send + Sync {
    fn load_quality(&self) -> Option<QualityLabel>;
    fn save_quality(&self, label: &QualityLabel) -> Result<()>;
}

pub fn get_root_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("/tmp"))
        .join("reelsync")
}

/// JSON file of string keys, shared with any other client preference.
pub struct FilePreferenceStore {
    path: PathBuf,
}

impl FilePreferenceStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self::new(dir.join(PREFERENCES_FILE))
    }

    pub fn default_location() -> Self {
        Self::in_dir(&get_root_config_dir())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read_all(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }
        let content = fs::read_to_string(&self.path)?;
        if content.trim().is_empty() {
            return Ok(BTreeMap::new());
        }
        Ok(serde_json::from_str(&content)?)
    }
}

impl PreferenceStore for FilePreferenceStore {
    fn load_quality(&self) -> Option<QualityLabel> {
        match self.read_all() {
            Ok(values) => values
                .get(QUALITY_KEY)
                .filter(|v| !v.is_empty())
                .map(QualityLabel::new),
            Err(e) => {
                tracing::warn!(path = %self.path.display(), error = %e, "Ignoring unreadable preferences");
                None
            }
        }
    }

    fn save_quality(&self, label: &QualityLabel) -> Result<()> {
        // A corrupt file is replaced rather than blocking the write.
        let mut values = self.read_all().unwrap_or_default();
        values.insert(QUALITY_KEY.to_string(), label.as_str().to_string());

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| ReelsyncError::PreferenceStore {
                path: self.path.clone(),
                reason: e.to_string(),
            })?;
        }
        fs::write(&self.path, serde_json::to_string_pretty(&values)?)?;
        Ok(())
    }
}

#[derive(Default)]
pub struct MemoryPreferenceStore {
    quality: Mutex<Option<QualityLabel>>,
}

impl MemoryPreferenceStore {
    pub fn with_quality(label: QualityLabel) -> Self {
        Self {
            quality: Mutex::new(Some(label)),
        }
    }
}

impl PreferenceStore for MemoryPreferenceStore {
    fn load_quality(&self) -> Option<QualityLabel> {
        self.quality
            .lock()
            .expect("MemoryPreferenceStore poisoned")
            .clone()
    }

    fn save_quality(&self, label: &QualityLabel) -> Result<()> {
        *self.quality.lock().expect("MemoryPreferenceStore poisoned") = Some(label.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn missing_file_has_no_preference() {
        let dir = tempdir().unwrap();
        let store = FilePreferenceStore::in_dir(dir.path());
        assert_eq!(store.load_quality(), None);
    }

    #[test]
    fn saved_quality_survives_a_new_store() {
        let dir = tempdir().unwrap();
        FilePreferenceStore::in_dir(&dir.path().join("nested"))
            .save_quality(&QualityLabel::new("720p"))
            .unwrap();

        let reopened = FilePreferenceStore::in_dir(&dir.path().join("nested"));
        assert_eq!(reopened.load_quality(), Some(QualityLabel::new("720p")));
    }

    #[test]
    fn other_keys_are_preserved() {
        let dir = tempdir().unwrap();
        let store = FilePreferenceStore::in_dir(dir.path());
        fs::write(store.path(), r#"{"theme":"dark"}"#).unwrap();

        store.save_quality(&QualityLabel::max()).unwrap();

        let raw: BTreeMap<String, String> =
            serde_json::from_str(&fs::read_to_string(store.path()).unwrap()).unwrap();
        assert_eq!(raw.get("theme").map(String::as_str), Some("dark"));
        assert_eq!(raw.get(QUALITY_KEY).map(String::as_str), Some("MAX"));
    }

    #[test]
    fn corrupt_file_reads_as_unset_and_is_overwritten() {
        let dir = tempdir().unwrap();
        let store = FilePreferenceStore::in_dir(dir.path());
        fs::write(store.path(), "{not json").unwrap();

        assert_eq!(store.load_quality(), None);
        store.save_quality(&QualityLabel::new("480p")).unwrap();
        assert_eq!(store.load_quality(), Some(QualityLabel::new("480p")));
    }
}

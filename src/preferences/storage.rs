//! Durable slot for the last explicitly chosen language.

use crate::errors::StorageError;
use crate::types::Language;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Key the language code is stored under.
pub const PREFERENCE_KEY: &str = "preferred-language";

pub trait PreferenceStorage: Send + Sync {
    fn load(&self) -> Result<Option<Language>, StorageError>;
    fn save(&self, language: Language) -> Result<(), StorageError>;
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct PreferenceFile {
    #[serde(rename = "preferred-language", default, skip_serializing_if = "Option::is_none")]
    preferred_language: Option<String>,
}

/// JSON file holding `{ "preferred-language": "<code>" }`.
#[derive(Debug, Clone)]
pub struct FilePreferenceStorage {
    path: PathBuf,
}

impl FilePreferenceStorage {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn display(&self) -> String {
        self.path.display().to_string()
    }
}

impl PreferenceStorage for FilePreferenceStorage {
    fn load(&self) -> Result<Option<Language>, StorageError> {
        let content = match fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StorageError::Read(self.display(), e)),
        };
        let file: PreferenceFile =
            serde_json::from_str(&content).map_err(|e| StorageError::Corrupt(self.display(), e))?;
        // Unknown codes count as no preference.
        Ok(file.preferred_language.as_deref().and_then(Language::parse))
    }

    fn save(&self, language: Language) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| StorageError::Write(self.display(), e))?;
            }
        }
        let file = PreferenceFile {
            preferred_language: Some(language.code().to_string()),
        };
        let content = serde_json::to_string_pretty(&file)
            .map_err(|e| StorageError::Corrupt(self.display(), e))?;
        fs::write(&self.path, content).map_err(|e| StorageError::Write(self.display(), e))
    }
}

/// Process-local storage, mostly for tests and one-shot sessions.
#[derive(Debug, Default)]
pub struct MemoryPreferenceStorage {
    value: Mutex<Option<Language>>,
}

impl MemoryPreferenceStorage {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_value(language: Language) -> Self {
        Self {
            value: Mutex::new(Some(language)),
        }
    }
}

impl PreferenceStorage for MemoryPreferenceStorage {
    fn load(&self) -> Result<Option<Language>, StorageError> {
        Ok(*self.value.lock())
    }

    fn save(&self, language: Language) -> Result<(), StorageError> {
        *self.value.lock() = Some(language);
        Ok(())
    }
}

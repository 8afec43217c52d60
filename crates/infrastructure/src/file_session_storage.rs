use std::collections::BTreeMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::RwLock;

use harvestgate_application::SessionStorage;
use harvestgate_core::{AppError, AppResult};
use tracing::warn;

/// Session storage persisted as one JSON object on disk.
///
/// Writes go to a sibling temporary file first and are renamed into place,
/// so a crash never leaves a half-written file behind.
pub struct FileSessionStorage {
    path: PathBuf,
    entries: RwLock<BTreeMap<String, String>>,
}

impl FileSessionStorage {
    /// Opens storage at `path`.
    ///
    /// A missing or malformed file starts empty; an unreadable one is an
    /// error.
    pub fn open(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let entries = match fs::read_to_string(&path) {
            Ok(raw) if raw.trim().is_empty() => BTreeMap::new(),
            Ok(raw) => serde_json::from_str(&raw).unwrap_or_else(|error| {
                warn!(
                    path = %path.display(),
                    error = %error,
                    "session storage file is malformed; starting empty"
                );
                BTreeMap::new()
            }),
            Err(error) if error.kind() == ErrorKind::NotFound => BTreeMap::new(),
            Err(error) => {
                return Err(AppError::Internal(format!(
                    "failed to read session storage file '{}': {error}",
                    path.display()
                )));
            }
        };

        Ok(Self {
            path,
            entries: RwLock::new(entries),
        })
    }

    /// Returns the backing file path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Applies `update` to a copy of the entries and commits it to memory
    /// only once the file has been replaced.
    fn write_through(
        &self,
        update: impl FnOnce(&mut BTreeMap<String, String>) -> bool,
    ) -> AppResult<()> {
        let mut entries = self
            .entries
            .write()
            .map_err(|_| AppError::Internal("session storage lock poisoned".to_owned()))?;
        let mut next = entries.clone();
        if !update(&mut next) {
            return Ok(());
        }

        let encoded = serde_json::to_string_pretty(&next).map_err(|error| {
            AppError::Internal(format!("failed to encode session storage: {error}"))
        })?;
        let temporary = self.path.with_extension("tmp");
        fs::write(&temporary, encoded)
            .and_then(|()| fs::rename(&temporary, &self.path))
            .map_err(|error| {
                AppError::Internal(format!(
                    "failed to write session storage file '{}': {error}",
                    self.path.display()
                ))
            })?;

        *entries = next;
        Ok(())
    }
}

impl SessionStorage for FileSessionStorage {
    fn get(&self, key: &str) -> AppResult<Option<String>> {
        let entries = self.entries.read().map_err(|_| {
            AppError::Internal("session storage lock poisoned".to_owned())
        })?;

        Ok(entries.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> AppResult<()> {
        self.write_through(|entries| {
            entries.insert(key.to_owned(), value.to_owned()).as_deref() != Some(value)
        })
    }

    fn remove(&self, key: &str) -> AppResult<()> {
        self.write_through(|entries| entries.remove(key).is_some())
    }
}

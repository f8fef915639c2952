//! File-backed configuration store.
//!
//! All remotes live in one TOML document:
//!
//! ```toml
//! [remote.origin]
//! url = "https://example.com/repo.git"
//! fetch = ["+refs/heads/*:refs/remotes/origin/*"]
//! ```
//!
//! Every mutation reads the document, edits it, and writes it back through a
//! temporary sibling file that is renamed over the original, so readers never
//! observe a half-written file.

use std::collections::BTreeMap;
use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::{RemoteConfigStore, RemoteEntry};
use crate::error::{ConfigError, ConfigResult};

#[derive(Debug, Default, Serialize, Deserialize)]
struct ConfigDocument {
    #[serde(default)]
    remote: BTreeMap<String, RemoteSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct RemoteSection {
    url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    fetch: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    push: Vec<String>,
}

impl RemoteSection {
    fn into_entry(self, name: &str) -> RemoteEntry {
        RemoteEntry {
            name: name.to_string(),
            url: self.url,
            fetch: self.fetch,
            push: self.push,
        }
    }
}

impl From<&RemoteEntry> for RemoteSection {
    fn from(entry: &RemoteEntry) -> Self {
        Self {
            url: entry.url.clone(),
            fetch: entry.fetch.clone(),
            push: entry.push.clone(),
        }
    }
}

/// A [`RemoteConfigStore`] persisted as a TOML file.
#[derive(Debug)]
pub struct FileConfigStore {
    path: PathBuf,
    /// Serializes read-modify-write cycles within this process.
    lock: Mutex<()>,
}

impl FileConfigStore {
    /// Use the document at `path`. The file is created on first write.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn read(&self) -> ConfigResult<ConfigDocument> {
        let text = match fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(ConfigDocument::default()),
            Err(err) => return Err(err.into()),
        };
        toml::from_str(&text).map_err(|e| ConfigError::Serialization(e.to_string()))
    }

    fn write(&self, doc: &ConfigDocument) -> ConfigResult<()> {
        let text = toml::to_string_pretty(doc).map_err(|e| ConfigError::Serialization(e.to_string()))?;
        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        fs::create_dir_all(&dir)?;

        let mut tmp = tempfile::NamedTempFile::new_in(&dir)?;
        tmp.write_all(text.as_bytes())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| ConfigError::Io(e.error))?;
        debug!(path = %self.path.display(), remotes = doc.remote.len(), "wrote remote config");
        Ok(())
    }

    /// Run a read-modify-write cycle under the process lock. The document is
    /// written only if `edit` succeeds.
    fn update<R>(&self, edit: impl FnOnce(&mut ConfigDocument) -> ConfigResult<R>) -> ConfigResult<R> {
        let _guard = self.lock.lock().map_err(|_| ConfigError::Poisoned)?;
        let mut doc = self.read()?;
        let result = edit(&mut doc)?;
        self.write(&doc)?;
        Ok(result)
    }
}

impl RemoteConfigStore for FileConfigStore {
    fn load_remote(&self, name: &str) -> ConfigResult<Option<RemoteEntry>> {
        let _guard = self.lock.lock().map_err(|_| ConfigError::Poisoned)?;
        let mut doc = self.read()?;
        Ok(doc.remote.remove(name).map(|section| section.into_entry(name)))
    }

    fn save_remote(&self, entry: &RemoteEntry) -> ConfigResult<()> {
        entry.validate()?;
        self.update(|doc| {
            doc.remote.insert(entry.name.clone(), entry.into());
            Ok(())
        })
    }

    fn create_remote(&self, entry: &RemoteEntry) -> ConfigResult<()> {
        entry.validate()?;
        self.update(|doc| {
            if doc.remote.contains_key(&entry.name) {
                return Err(ConfigError::AlreadyExists { name: entry.name.clone() });
            }
            doc.remote.insert(entry.name.clone(), entry.into());
            Ok(())
        })
    }

    fn rename_remote(&self, old: &str, renamed: &RemoteEntry) -> ConfigResult<()> {
        renamed.validate()?;
        self.update(|doc| {
            if !doc.remote.contains_key(old) {
                return Err(ConfigError::NotFound { name: old.to_string() });
            }
            if renamed.name != old && doc.remote.contains_key(&renamed.name) {
                return Err(ConfigError::AlreadyExists { name: renamed.name.clone() });
            }
            doc.remote.remove(old);
            doc.remote.insert(renamed.name.clone(), renamed.into());
            Ok(())
        })
    }

    fn delete_remote(&self, name: &str) -> ConfigResult<bool> {
        self.update(|doc| Ok(doc.remote.remove(name).is_some()))
    }

    fn remote_names(&self) -> ConfigResult<Vec<String>> {
        let _guard = self.lock.lock().map_err(|_| ConfigError::Poisoned)?;
        Ok(self.read()?.remote.into_keys().collect())
    }
}

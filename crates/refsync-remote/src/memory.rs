//! In-memory configuration store for testing and ephemeral use.

use std::collections::BTreeMap;
use std::sync::RwLock;

use crate::config::{RemoteConfigStore, RemoteEntry};
use crate::error::{ConfigError, ConfigResult};

/// An in-memory implementation of [`RemoteConfigStore`].
///
/// Entries live in a `BTreeMap` behind a `RwLock` and are lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryConfigStore {
    remotes: RwLock<BTreeMap<String, RemoteEntry>>,
}

impl InMemoryConfigStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// A store pre-populated with `entries`.
    pub fn with_remotes(entries: impl IntoIterator<Item = RemoteEntry>) -> Self {
        let remotes = entries.into_iter().map(|e| (e.name.clone(), e)).collect();
        Self {
            remotes: RwLock::new(remotes),
        }
    }
}

impl RemoteConfigStore for InMemoryConfigStore {
    fn load_remote(&self, name: &str) -> ConfigResult<Option<RemoteEntry>> {
        let remotes = self.remotes.read().map_err(|_| ConfigError::Poisoned)?;
        Ok(remotes.get(name).cloned())
    }

    fn save_remote(&self, entry: &RemoteEntry) -> ConfigResult<()> {
        entry.validate()?;
        let mut remotes = self.remotes.write().map_err(|_| ConfigError::Poisoned)?;
        remotes.insert(entry.name.clone(), entry.clone());
        Ok(())
    }

    fn create_remote(&self, entry: &RemoteEntry) -> ConfigResult<()> {
        entry.validate()?;
        let mut remotes = self.remotes.write().map_err(|_| ConfigError::Poisoned)?;
        if remotes.contains_key(&entry.name) {
            return Err(ConfigError::AlreadyExists { name: entry.name.clone() });
        }
        remotes.insert(entry.name.clone(), entry.clone());
        Ok(())
    }

    fn rename_remote(&self, old: &str, renamed: &RemoteEntry) -> ConfigResult<()> {
        renamed.validate()?;
        let mut remotes = self.remotes.write().map_err(|_| ConfigError::Poisoned)?;
        if !remotes.contains_key(old) {
            return Err(ConfigError::NotFound { name: old.to_string() });
        }
        if renamed.name != old && remotes.contains_key(&renamed.name) {
            return Err(ConfigError::AlreadyExists { name: renamed.name.clone() });
        }
        remotes.remove(old);
        remotes.insert(renamed.name.clone(), renamed.clone());
        Ok(())
    }

    fn delete_remote(&self, name: &str) -> ConfigResult<bool> {
        let mut remotes = self.remotes.write().map_err(|_| ConfigError::Poisoned)?;
        Ok(remotes.remove(name).is_some())
    }

    fn remote_names(&self) -> ConfigResult<Vec<String>> {
        let remotes = self.remotes.read().map_err(|_| ConfigError::Poisoned)?;
        Ok(remotes.keys().cloned().collect())
    }
}

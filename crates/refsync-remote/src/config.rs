//! The persisted shape of a remote and the [`RemoteConfigStore`] trait.

use serde::{Deserialize, Serialize};
use refsync_refspec::{validate_remote_name, Direction, RefspecError, RefspecPattern};

use crate::error::{ConfigError, ConfigResult};

/// A remote as it is written to configuration. Refspecs are stored in their
/// canonical string form, fetch and push lists kept apart.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteEntry {
    pub name: String,
    pub url: String,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fetch: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub push: Vec<String>,
}

impl RemoteEntry {
    /// An entry with the conventional fetch refspec
    /// `+refs/heads/*:refs/remotes/<name>/*`.
    pub fn with_default_fetch(name: impl Into<String>, url: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            fetch: vec![default_fetch_refspec(&name)],
            name,
            url: url.into(),
            push: Vec::new(),
        }
    }

    /// Check the name and URL, and parse every refspec.
    pub fn validate(&self) -> ConfigResult<()> {
        check_name(&self.name)?;
        if self.url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl { name: self.name.clone() });
        }
        self.refspecs().map(|_| ())
    }

    /// Parse the stored refspecs, fetch refspecs first.
    pub fn refspecs(&self) -> ConfigResult<Vec<RefspecPattern>> {
        let fetch = self.fetch.iter().map(|s| RefspecPattern::parse(s, Direction::Fetch));
        let push = self.push.iter().map(|s| RefspecPattern::parse(s, Direction::Push));
        Ok(fetch.chain(push).collect::<Result<Vec<_>, _>>()?)
    }
}

/// The refspec git installs for a newly added remote.
pub fn default_fetch_refspec(remote: &str) -> String {
    format!("+refs/heads/*:refs/remotes/{remote}/*")
}

/// Validate a remote name, reporting failures as [`ConfigError::InvalidName`].
pub fn check_name(name: &str) -> ConfigResult<()> {
    validate_remote_name(name).map_err(|err| match err {
        RefspecError::InvalidRefName { name, reason } => ConfigError::InvalidName { name, reason },
        other => ConfigError::InvalidRefspec(other),
    })
}

/// Persistence backend for remote definitions.
///
/// Implementations must be thread-safe and apply each call atomically: a
/// failed call leaves the stored configuration unchanged.
pub trait RemoteConfigStore: Send + Sync {
    /// Read a remote by name. Returns `Ok(None)` if it does not exist.
    fn load_remote(&self, name: &str) -> ConfigResult<Option<RemoteEntry>>;

    /// Create or replace the remote named `entry.name`.
    fn save_remote(&self, entry: &RemoteEntry) -> ConfigResult<()>;

    /// Create a remote, failing with [`ConfigError::AlreadyExists`] if the
    /// name is taken.
    fn create_remote(&self, entry: &RemoteEntry) -> ConfigResult<()>;

    /// Replace the remote `old` with `renamed`, which carries the new name.
    ///
    /// Fails with [`ConfigError::NotFound`] if `old` does not exist and with
    /// [`ConfigError::AlreadyExists`] if another remote holds the new name.
    fn rename_remote(&self, old: &str, renamed: &RemoteEntry) -> ConfigResult<()>;

    /// Delete a remote. Returns `Ok(true)` if it existed.
    fn delete_remote(&self, name: &str) -> ConfigResult<bool>;

    /// All remote names, sorted.
    fn remote_names(&self) -> ConfigResult<Vec<String>>;
}

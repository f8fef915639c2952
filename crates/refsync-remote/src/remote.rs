use std::sync::Arc;

use refsync_refspec::{Direction, RefspecError, RefspecPattern};
use refsync_sync::{
    Connection, ConnectionState, FetchOutcome, PushSession, PushStatus, SyncResult, TransferSession,
};
use refsync_transport::{Offline, TransferStats, Transport};
use tracing::{debug, info};

use crate::config::{check_name, RemoteConfigStore, RemoteEntry};
use crate::error::{ConfigError, ConfigResult};

/// A named remote: URL, ordered refspecs, and the transport used to reach it.
///
/// Configuration edits are written to the store before the in-memory value
/// changes. Transfers are serialized through an explicit
/// [`ConnectionState`]; starting one while another connection is open fails
/// with [`SyncError::Busy`](refsync_sync::SyncError::Busy).
pub struct Remote<T: Transport = Offline> {
    name: String,
    url: String,
    refspecs: Vec<RefspecPattern>,
    state: ConnectionState,
    transport: T,
    store: Arc<dyn RemoteConfigStore>,
}

impl<T: Transport> Remote<T> {
    /// Persist a new remote with the default fetch refspec
    /// `+refs/heads/*:refs/remotes/<name>/*`.
    pub fn create(
        store: Arc<dyn RemoteConfigStore>,
        name: &str,
        url: &str,
        transport: T,
    ) -> ConfigResult<Self> {
        let entry = RemoteEntry::with_default_fetch(name, url);
        store.create_remote(&entry)?;
        info!(remote = %name, %url, "created remote");
        Self::from_entry(store, entry, transport)
    }

    /// Rebuild a remote from its stored definition.
    pub fn load(store: Arc<dyn RemoteConfigStore>, name: &str, transport: T) -> ConfigResult<Self> {
        let entry = store
            .load_remote(name)?
            .ok_or_else(|| ConfigError::NotFound { name: name.to_string() })?;
        Self::from_entry(store, entry, transport)
    }

    fn from_entry(store: Arc<dyn RemoteConfigStore>, entry: RemoteEntry, transport: T) -> ConfigResult<Self> {
        let refspecs = entry.refspecs()?;
        Ok(Self {
            name: entry.name,
            url: entry.url,
            refspecs,
            state: ConnectionState::Disconnected,
            transport,
            store,
        })
    }

    /// Swap the transport. The new one starts disconnected.
    pub fn with_transport<U: Transport>(self, transport: U) -> Remote<U> {
        Remote {
            name: self.name,
            url: self.url,
            refspecs: self.refspecs,
            state: ConnectionState::Disconnected,
            transport,
            store: self.store,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch refspecs first, then push refspecs, each in configured order.
    pub fn refspecs(&self) -> &[RefspecPattern] {
        &self.refspecs
    }

    /// The first fetch refspec, if any.
    pub fn fetch_refspec(&self) -> Option<&RefspecPattern> {
        self.refspecs.iter().find(|spec| spec.direction() == Direction::Fetch)
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.state
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub fn transport_mut(&mut self) -> &mut T {
        &mut self.transport
    }

    /// The persisted form of this remote.
    pub fn entry(&self) -> RemoteEntry {
        let (fetch, push): (Vec<_>, Vec<_>) = self
            .refspecs
            .iter()
            .partition(|spec| spec.direction() == Direction::Fetch);
        RemoteEntry {
            name: self.name.clone(),
            url: self.url.clone(),
            fetch: fetch.iter().map(|spec| spec.to_string()).collect(),
            push: push.iter().map(|spec| spec.to_string()).collect(),
        }
    }

    /// Write the in-memory definition back to the store.
    pub fn save(&self) -> ConfigResult<()> {
        self.store.save_remote(&self.entry())
    }

    /// Rename the remote.
    ///
    /// Fetch refspecs whose destination lives under `refs/remotes/<old>/`
    /// are moved under `refs/remotes/<new>/`. On failure, including a name
    /// collision, nothing changes.
    pub fn rename(&mut self, new_name: &str) -> ConfigResult<()> {
        check_name(new_name)?;
        if new_name == self.name {
            return Ok(());
        }

        let refspecs = rename_tracking(&self.refspecs, &self.name, new_name)?;
        let mut renamed = self.entry();
        renamed.name = new_name.to_string();
        let (fetch, _): (Vec<_>, Vec<_>) = refspecs
            .iter()
            .partition(|spec| spec.direction() == Direction::Fetch);
        renamed.fetch = fetch.iter().map(|spec| spec.to_string()).collect();

        self.store.rename_remote(&self.name, &renamed)?;
        info!(from = %self.name, to = %new_name, "renamed remote");
        self.name = renamed.name;
        self.refspecs = refspecs;
        Ok(())
    }

    pub fn set_url(&mut self, url: &str) -> ConfigResult<()> {
        if url.trim().is_empty() {
            return Err(ConfigError::EmptyUrl { name: self.name.clone() });
        }
        let mut entry = self.entry();
        entry.url = url.to_string();
        self.store.save_remote(&entry)?;
        debug!(remote = %self.name, %url, "updated url");
        self.url = entry.url;
        Ok(())
    }

    /// Replace every fetch refspec with the single forced mapping
    /// `+source:destination`. Push refspecs are kept.
    pub fn set_single_fetch_refspec(&mut self, source: &str, destination: &str) -> ConfigResult<()> {
        let text = format!("+{source}:{destination}");
        if destination.is_empty() {
            return Err(RefspecError::InvalidPattern {
                refspec: text,
                reason: "fetch refspec needs a destination to track".into(),
            }
            .into());
        }
        let spec = RefspecPattern::parse(&text, Direction::Fetch)?;
        let mut refspecs = vec![spec];
        refspecs.extend(
            self.refspecs
                .iter()
                .filter(|spec| spec.direction() == Direction::Push)
                .cloned(),
        );
        self.replace_refspecs(refspecs)
    }

    /// Append a refspec in the given direction.
    pub fn add_refspec(&mut self, refspec: &str, direction: Direction) -> ConfigResult<()> {
        let spec = RefspecPattern::parse(refspec, direction)?;
        let mut refspecs = self.refspecs.clone();
        // Keep fetch refspecs ahead of push refspecs.
        let at = match direction {
            Direction::Fetch => refspecs
                .iter()
                .position(|s| s.direction() == Direction::Push)
                .unwrap_or(refspecs.len()),
            Direction::Push => refspecs.len(),
        };
        refspecs.insert(at, spec);
        self.replace_refspecs(refspecs)
    }

    fn replace_refspecs(&mut self, refspecs: Vec<RefspecPattern>) -> ConfigResult<()> {
        let previous = std::mem::replace(&mut self.refspecs, refspecs);
        if let Err(err) = self.save() {
            self.refspecs = previous;
            return Err(err);
        }
        debug!(remote = %self.name, count = self.refspecs.len(), "updated refspecs");
        Ok(())
    }

    /// Open a connection in `direction`. It is closed when the guard drops.
    pub fn connect(&mut self, direction: Direction) -> SyncResult<Connection<'_, T>> {
        Connection::open(&mut self.transport, &mut self.state, direction)
    }

    /// Fetch through the configured fetch refspecs.
    pub fn fetch(&mut self) -> SyncResult<TransferStats> {
        self.fetch_detailed().map(|outcome| outcome.stats)
    }

    /// Like [`Remote::fetch`], also reporting which local tips moved.
    pub fn fetch_detailed(&mut self) -> SyncResult<FetchOutcome> {
        debug!(remote = %self.name, "fetch");
        TransferSession::new(&mut self.transport, &mut self.state, &self.refspecs).fetch()
    }

    /// Push `refspecs`, returning the references the remote rejected.
    pub fn push<S: AsRef<str>>(&mut self, refspecs: &[S]) -> SyncResult<Vec<PushStatus>> {
        debug!(remote = %self.name, count = refspecs.len(), "push");
        PushSession::new(&mut self.transport, &mut self.state).push(refspecs)
    }
}

/// Move fetch destinations under `refs/remotes/<old>/` to `refs/remotes/<new>/`.
fn rename_tracking(
    refspecs: &[RefspecPattern],
    old: &str,
    new: &str,
) -> ConfigResult<Vec<RefspecPattern>> {
    let old_prefix = format!("refs/remotes/{old}/");
    refspecs
        .iter()
        .map(|spec| -> ConfigResult<RefspecPattern> {
            let rest = match spec.destination().strip_prefix(&old_prefix) {
                Some(rest) if spec.direction() == Direction::Fetch => rest,
                _ => return Ok(spec.clone()),
            };
            let destination = format!("refs/remotes/{new}/{rest}");
            Ok(RefspecPattern::new(spec.source(), destination, spec.is_forced(), Direction::Fetch)?)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryConfigStore;

    fn store() -> Arc<dyn RemoteConfigStore> {
        Arc::new(InMemoryConfigStore::new())
    }

    fn origin(store: &Arc<dyn RemoteConfigStore>) -> Remote {
        Remote::create(Arc::clone(store), "origin", "https://example.com/repo.git", Offline).unwrap()
    }

    #[test]
    fn create_installs_default_fetch_refspec() {
        let store = store();
        let remote = origin(&store);
        assert_eq!(remote.refspecs().len(), 1);
        let spec = remote.fetch_refspec().unwrap();
        assert_eq!(spec.to_string(), "+refs/heads/*:refs/remotes/origin/*");
        assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
    }

    #[test]
    fn create_twice_is_rejected() {
        let store = store();
        origin(&store);
        let err = Remote::create(Arc::clone(&store), "origin", "u", Offline).err().unwrap();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
    }

    #[test]
    fn load_missing_is_not_found() {
        let err = Remote::load(store(), "origin", Offline).err().unwrap();
        assert!(matches!(err, ConfigError::NotFound { .. }));
    }

    #[test]
    fn rename_moves_tracking_destinations() {
        let store = store();
        let mut remote = origin(&store);
        remote.add_refspec("refs/tags/*:refs/tags/*", Direction::Fetch).unwrap();
        remote.rename("upstream").unwrap();

        assert_eq!(remote.name(), "upstream");
        let specs: Vec<String> = remote.refspecs().iter().map(|s| s.to_string()).collect();
        assert_eq!(specs, vec!["+refs/heads/*:refs/remotes/upstream/*", "refs/tags/*:refs/tags/*"]);
        assert_eq!(store.remote_names().unwrap(), vec!["upstream".to_string()]);
    }

    #[test]
    fn rename_collision_keeps_name() {
        let store = store();
        let mut remote = origin(&store);
        Remote::create(Arc::clone(&store), "mirror", "u", Offline).unwrap();
        let err = remote.rename("mirror").unwrap_err();
        assert!(matches!(err, ConfigError::AlreadyExists { .. }));
        assert_eq!(remote.name(), "origin");
        assert_eq!(
            remote.fetch_refspec().unwrap().destination(),
            "refs/remotes/origin/*"
        );
    }

    #[test]
    fn rename_to_invalid_name_fails() {
        let store = store();
        let mut remote = origin(&store);
        assert!(matches!(remote.rename("a/b"), Err(ConfigError::InvalidName { .. })));
        assert_eq!(remote.name(), "origin");
    }

    #[test]
    fn set_url_rejects_empty() {
        let store = store();
        let mut remote = origin(&store);
        assert!(matches!(remote.set_url(""), Err(ConfigError::EmptyUrl { .. })));
        remote.set_url("ssh://host/repo.git").unwrap();
        assert_eq!(remote.url(), "ssh://host/repo.git");
        assert_eq!(store.load_remote("origin").unwrap().unwrap().url, "ssh://host/repo.git");
    }

    #[test]
    fn single_fetch_refspec_replaces_fetch_set_only() {
        let store = store();
        let mut remote = origin(&store);
        remote.add_refspec("refs/tags/*:refs/tags/*", Direction::Fetch).unwrap();
        remote.add_refspec("refs/heads/main", Direction::Push).unwrap();
        remote
            .set_single_fetch_refspec("refs/heads/main", "refs/remotes/origin/main")
            .unwrap();

        let stored = store.load_remote("origin").unwrap().unwrap();
        assert_eq!(stored.fetch, vec!["+refs/heads/main:refs/remotes/origin/main".to_string()]);
        assert_eq!(stored.push, vec!["refs/heads/main:refs/heads/main".to_string()]);
        assert_eq!(remote.refspecs().len(), 2);
        assert!(remote.fetch_refspec().unwrap().is_forced());
    }

    #[test]
    fn single_fetch_refspec_needs_destination() {
        let store = store();
        let mut remote = origin(&store);
        let err = remote.set_single_fetch_refspec("refs/heads/main", "").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRefspec(RefspecError::InvalidPattern { .. })));
        assert_eq!(remote.fetch_refspec().unwrap().to_string(), "+refs/heads/*:refs/remotes/origin/*");
        assert_eq!(
            store.load_remote("origin").unwrap().unwrap().fetch,
            vec!["+refs/heads/*:refs/remotes/origin/*".to_string()]
        );
    }

    #[test]
    fn bad_refspec_changes_nothing() {
        let store = store();
        let mut remote = origin(&store);
        let err = remote.set_single_fetch_refspec("refs/*/a/*", "refs/b/*").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidRefspec(_)));
        assert_eq!(remote.refspecs().len(), 1);
    }

    #[test]
    fn offline_fetch_is_connection_error() {
        let store = store();
        let mut remote = origin(&store);
        let err = remote.fetch().unwrap_err();
        assert!(matches!(err, refsync_sync::SyncError::Connection(_)));
        assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
    }
}

//! End-to-end tests: a `Remote` wired to an `InMemoryTransport`.

use std::sync::Arc;

use refsync_refspec::Direction;
use refsync_remote::{ConfigError, FileConfigStore, InMemoryConfigStore, Remote, RemoteConfigStore};
use refsync_sync::{ConnectionState, PushStatus, SyncError};
use refsync_transport::{Call, FailurePoint, InMemoryTransport, Repository, TransportError};

/// Remote has `main` (two commits) and `dev` (one more on top); local is empty.
fn upstream() -> InMemoryTransport {
    let mut remote = Repository::new();
    let root = remote.commit(b"root", &[]);
    let main = remote.commit(b"main", &[root]);
    let dev = remote.commit(b"dev", &[main]);
    remote.set_ref("refs/heads/main", main);
    remote.set_ref("refs/heads/dev", dev);
    InMemoryTransport::new(Repository::new(), remote)
}

fn origin(transport: InMemoryTransport) -> (Arc<dyn RemoteConfigStore>, Remote<InMemoryTransport>) {
    let store: Arc<dyn RemoteConfigStore> = Arc::new(InMemoryConfigStore::new());
    let remote = Remote::create(Arc::clone(&store), "origin", "mem://upstream", transport).unwrap();
    (store, remote)
}

#[test]
fn fetch_populates_tracking_refs() {
    let (_store, mut remote) = origin(upstream());
    let stats = remote.fetch().unwrap();

    assert_eq!(stats.received_objects, 3);
    assert_eq!(stats.indexed_objects, 3);
    assert!(stats.received_bytes > 0);
    let t = remote.transport();
    assert_eq!(
        t.local().ref_target("refs/remotes/origin/main"),
        t.remote().ref_target("refs/heads/main")
    );
    assert_eq!(
        t.local().ref_target("refs/remotes/origin/dev"),
        t.remote().ref_target("refs/heads/dev")
    );
    assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
}

#[test]
fn second_fetch_receives_nothing_new() {
    let (_store, mut remote) = origin(upstream());
    remote.fetch().unwrap();
    let outcome = remote.fetch_detailed().unwrap();
    assert_eq!(outcome.stats.received_objects, 0);
    assert_eq!(outcome.updated.len(), 2);
}

#[test]
fn download_failure_leaves_remote_disconnected() {
    let mut transport = upstream();
    transport.fail_at(FailurePoint::Download);
    let (_store, mut remote) = origin(transport);

    let err = remote.fetch().unwrap_err();
    assert!(matches!(err, SyncError::Transfer(TransportError::Download(_))));
    assert!(err.is_retryable());
    assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
    assert_eq!(remote.transport().count(&Call::Disconnect), 1);
    assert_eq!(remote.transport().connection(), None);
}

#[test]
fn fetch_while_connected_is_busy() {
    let (_store, mut remote) = origin(upstream());
    let conn = remote.connect(Direction::Fetch).unwrap();
    // Leak the guard so the connection is never closed.
    std::mem::forget(conn);
    assert_eq!(remote.connection_state(), ConnectionState::Connected(Direction::Fetch));

    let err = remote.fetch().unwrap_err();
    assert!(matches!(err, SyncError::Busy { active: Direction::Fetch }));
    assert_eq!(remote.transport().count(&Call::Download), 0);

    let err = remote.push(&["refs/heads/main"]).unwrap_err();
    assert!(matches!(err, SyncError::Busy { .. }));
}

#[test]
fn dropped_connection_frees_the_remote() {
    let (_store, mut remote) = origin(upstream());
    {
        let _conn = remote.connect(Direction::Push).unwrap();
    }
    assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
    remote.fetch().unwrap();
}

/// Local and remote share `main`; local then moves one commit ahead.
fn ahead_by_one() -> InMemoryTransport {
    let mut local = Repository::new();
    let base = local.commit(b"base", &[]);
    let next = local.commit(b"next", &[base]);
    local.set_ref("refs/heads/main", next);
    let mut remote = Repository::new();
    remote.import(&local, &[base]);
    remote.set_ref("refs/heads/main", base);
    InMemoryTransport::new(local, remote)
}

#[test]
fn rejected_push_returns_one_status() {
    let mut transport = ahead_by_one();
    transport.reject_push("refs/heads/main", "protected branch");
    let (_store, mut remote) = origin(transport);

    let statuses = remote.push(&["refs/heads/main:refs/heads/main"]).unwrap();
    assert_eq!(
        statuses,
        vec![PushStatus {
            reference_name: "refs/heads/main".into(),
            message: "protected branch".into(),
        }]
    );
    assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
    assert_eq!(remote.transport().count(&Call::Disconnect), 1);
}

#[test]
fn accepted_push_moves_remote_tip() {
    let (_store, mut remote) = origin(ahead_by_one());
    let statuses = remote.push(&["refs/heads/main:refs/heads/main"]).unwrap();
    assert!(statuses.is_empty());
    let t = remote.transport();
    assert_eq!(t.remote().ref_target("refs/heads/main"), t.local().ref_target("refs/heads/main"));
}

#[test]
fn empty_push_succeeds_with_no_statuses() {
    let (_store, mut remote) = origin(ahead_by_one());
    let statuses = remote.push::<&str>(&[]).unwrap();
    assert!(statuses.is_empty());
    assert_eq!(remote.transport().count(&Call::Finish), 1);
}

#[test]
fn malformed_push_refspec_is_not_retryable() {
    let (_store, mut remote) = origin(ahead_by_one());
    let err = remote.push(&["refs/heads/ma in"]).unwrap_err();
    assert!(matches!(err, SyncError::InvalidRefspec { .. }));
    assert!(!err.is_retryable());
}

#[test]
fn push_to_empty_destination_is_rejected() {
    let (_store, mut remote) = origin(ahead_by_one());
    let err = remote.push(&["refs/heads/main:"]).unwrap_err();
    assert!(matches!(err, SyncError::InvalidRefspec { .. }));
    assert!(remote.transport().remote().refs().keys().all(|name| !name.is_empty()));
    assert_eq!(remote.connection_state(), ConnectionState::Disconnected);
}

#[test]
fn rename_collision_leaves_name_unchanged() {
    let (store, mut remote) = origin(upstream());
    Remote::create(Arc::clone(&store), "backup", "mem://backup", InMemoryTransport::default()).unwrap();

    let err = remote.rename("backup").unwrap_err();
    assert!(matches!(err, ConfigError::AlreadyExists { .. }));
    assert_eq!(remote.name(), "origin");
    assert_eq!(store.load_remote("backup").unwrap().unwrap().url, "mem://backup");
}

#[test]
fn renamed_remote_fetches_into_new_namespace() {
    let (_store, mut remote) = origin(upstream());
    remote.rename("upstream").unwrap();
    remote.fetch().unwrap();
    let local = remote.transport().local();
    assert!(local.ref_target("refs/remotes/upstream/main").is_some());
    assert!(local.ref_target("refs/remotes/origin/main").is_none());
}

#[test]
fn single_fetch_refspec_limits_what_is_tracked() {
    let (_store, mut remote) = origin(upstream());
    remote
        .set_single_fetch_refspec("refs/heads/main", "refs/remotes/origin/trunk")
        .unwrap();
    let outcome = remote.fetch_detailed().unwrap();
    assert_eq!(outcome.updated.len(), 1);
    assert_eq!(outcome.updated[0].name, "refs/remotes/origin/trunk");
    assert!(remote.transport().local().ref_target("refs/remotes/origin/dev").is_none());
}

#[test]
fn file_store_round_trips_remote_edits() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    let store: Arc<dyn RemoteConfigStore> = Arc::new(FileConfigStore::new(&path));

    let mut remote = Remote::create(Arc::clone(&store), "origin", "https://a.example/r.git", upstream()).unwrap();
    remote.set_url("https://b.example/r.git").unwrap();
    remote.add_refspec("refs/heads/main", Direction::Push).unwrap();
    remote.rename("mirror").unwrap();

    let reopened: Arc<dyn RemoteConfigStore> = Arc::new(FileConfigStore::new(&path));
    let loaded = Remote::load(reopened, "mirror", InMemoryTransport::default()).unwrap();
    assert_eq!(loaded.url(), "https://b.example/r.git");
    let specs: Vec<String> = loaded.refspecs().iter().map(|s| s.to_string()).collect();
    assert_eq!(
        specs,
        vec!["+refs/heads/*:refs/remotes/mirror/*", "refs/heads/main:refs/heads/main"]
    );
    assert!(matches!(
        Remote::load(Arc::clone(&store), "origin", InMemoryTransport::default()),
        Err(ConfigError::NotFound { .. })
    ));
}

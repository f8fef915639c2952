//! Remote definitions for refsync.
//!
//! A [`Remote`] aggregates a name, a URL, and an ordered list of refspecs.
//! Every mutation goes through a [`RemoteConfigStore`] first and only then
//! changes the in-memory value, so a failed write leaves the remote as it
//! was. Fetch and push are delegated to the sessions in `refsync-sync`.
//!
//! # Modules
//!
//! - [`error`] — [`ConfigError`] for persistence and validation failures
//! - [`config`] — [`RemoteEntry`] and the [`RemoteConfigStore`] trait
//! - [`memory`] — [`InMemoryConfigStore`] for tests and ephemeral use
//! - [`file`] — [`FileConfigStore`], one TOML document for all remotes
//! - [`remote`] — The [`Remote`] type

pub mod config;
pub mod error;
pub mod file;
pub mod memory;
pub mod remote;

pub use config::{RemoteConfigStore, RemoteEntry};
pub use error::{ConfigError, ConfigResult};
pub use file::FileConfigStore;
pub use memory::InMemoryConfigStore;
pub use remote::Remote;

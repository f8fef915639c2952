//! Remote synchronization for refsync.
//!
//! Sequences connect, negotiate, transfer, ref-update and disconnect for
//! both fetch and push against a [`Transport`](refsync_transport::Transport).
//! The connection is a scoped resource: every exit path, including early
//! error returns, disconnects before control returns to the caller.

pub mod connection;
pub mod error;
pub mod fetch;
pub mod push;
pub mod types;

pub use connection::{Connection, ConnectionState};
pub use error::{SyncError, SyncResult};
pub use fetch::{plan_tip_updates, TransferSession};
pub use push::PushSession;
pub use types::{FetchOutcome, PushStatus};

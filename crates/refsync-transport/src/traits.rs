//! The collaborator contract driven by fetch and push sessions.

use refsync_types::Direction;

use crate::error::TransportResult;
use crate::types::{AdvertisedRef, RefStatus, TipUpdate, TransferStats};

/// A lazy, finite, non-restartable stream of per-reference push verdicts,
/// in the order the remote reported them.
pub type StatusStream<'a> = Box<dyn Iterator<Item = TransportResult<RefStatus>> + 'a>;

/// Object transfer against one remote.
///
/// Calls are blocking. A transport holds at most one connection at a time;
/// callers pair every successful [`Transport::connect`] with exactly one
/// [`Transport::disconnect`].
pub trait Transport: Send {
    /// Open a connection for the given direction.
    fn connect(&mut self, direction: Direction) -> TransportResult<()>;

    /// Negotiate and download the objects the remote has and we lack.
    fn download(&mut self) -> TransportResult<()>;

    /// Close the connection. Best-effort: the connection is considered
    /// closed even when an error is returned.
    fn disconnect(&mut self) -> TransportResult<()>;

    /// Counters for the most recent download.
    fn stats(&self) -> TransferStats;

    /// The references the remote advertised for the last download.
    fn fetched_refs(&self) -> TransportResult<Vec<AdvertisedRef>>;

    /// Apply local reference updates. Non-forced updates must be
    /// fast-forwards or the call fails without applying anything.
    fn update_local_tips(&mut self, updates: &[TipUpdate]) -> TransportResult<()>;

    /// Start a push over the current connection. The handle is released
    /// when dropped.
    fn open_push_session(&mut self) -> TransportResult<Box<dyn PushSessionHandle + '_>>;
}

/// One push negotiation: register refspecs, finish, read statuses, update
/// remote tips.
pub trait PushSessionHandle {
    /// Register a push refspec with the session.
    fn add_refspec(&mut self, refspec: &str) -> TransportResult<()>;

    /// Send the pack and wait for the remote's report.
    fn finish(&mut self) -> TransportResult<()>;

    /// Whether the remote applied the pushed pack.
    fn unpack_ok(&self) -> bool;

    /// Per-reference verdicts from the remote's report.
    fn statuses(&mut self) -> StatusStream<'_>;

    /// Record the accepted updates as the remote's new tips.
    fn update_remote_tips(&mut self) -> TransportResult<()>;
}

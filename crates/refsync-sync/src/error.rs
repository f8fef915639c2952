use refsync_refspec::RefspecError;
use refsync_transport::TransportError;
use refsync_types::Direction;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SyncError {
    /// Connecting to (or disconnecting from) the remote failed.
    #[error("connection error: {0}")]
    Connection(#[source] TransportError),

    /// Download, negotiation, or tip update failed.
    #[error("transfer error: {0}")]
    Transfer(#[source] TransportError),

    #[error("not a fast-forward update for ref {name}")]
    NonFastForward { name: String },

    /// A push refspec supplied by the caller is malformed or matches
    /// nothing. Fix the input rather than retrying.
    #[error("invalid refspec {refspec:?}: {reason}")]
    InvalidRefspec { refspec: String, reason: String },

    /// Reading the remote's per-reference report failed.
    #[error("push status error: {0}")]
    PushStatus(#[source] TransportError),

    /// A fetch or push is already in progress on this remote.
    #[error("remote is busy with a {active} in progress")]
    Busy { active: Direction },

    #[error(transparent)]
    Refspec(#[from] RefspecError),
}

impl SyncError {
    /// Whether repeating the same call could succeed. Input errors and
    /// history conflicts are not retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            SyncError::Connection(_) | SyncError::Transfer(_) | SyncError::Busy { .. }
        )
    }
}

pub type SyncResult<T> = Result<T, SyncError>;

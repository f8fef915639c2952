use refsync_types::{Direction, Oid};
use thiserror::Error;

/// Failures reported by a transport implementation.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("transport is not connected for {0}")]
    NotConnected(Direction),

    #[error("transport is already connected for {0}")]
    AlreadyConnected(Direction),

    #[error("download failed: {0}")]
    Download(String),

    #[error("not a fast-forward update for ref {name}")]
    NonFastForward { name: String },

    #[error("invalid refspec {refspec:?}: {reason}")]
    InvalidRefspec { refspec: String, reason: String },

    #[error("negotiation failed: {0}")]
    Negotiation(String),

    #[error("remote failed to unpack the pushed objects")]
    UnpackFailed,

    #[error("status report failed: {0}")]
    Status(String),

    #[error("object not found: {0}")]
    MissingObject(Oid),

    #[error("remote error: {0}")]
    Remote(String),
}

pub type TransportResult<T> = Result<T, TransportError>;

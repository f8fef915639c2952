use serde::{Deserialize, Serialize};
use refsync_transport::{TipUpdate, TransferStats};

/// A reference the remote did not accept as pushed, with its reason.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PushStatus {
    pub reference_name: String,
    pub message: String,
}

/// Everything a completed fetch produced.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct FetchOutcome {
    pub stats: TransferStats,
    /// Local references updated through the configured fetch refspecs.
    pub updated: Vec<TipUpdate>,
}

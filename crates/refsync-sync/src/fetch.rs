use std::collections::HashSet;

use refsync_refspec::RefspecPattern;
use refsync_transport::{AdvertisedRef, TipUpdate, Transport, TransportError};
use refsync_types::Direction;
use tracing::{debug, info};

use crate::connection::{Connection, ConnectionState};
use crate::error::{SyncError, SyncResult};
use crate::types::FetchOutcome;

/// Drives one fetch: connect, download, snapshot stats, update local tips,
/// disconnect.
pub struct TransferSession<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    state: &'a mut ConnectionState,
    refspecs: &'a [RefspecPattern],
}

impl<'a, T: Transport + ?Sized> TransferSession<'a, T> {
    pub fn new(
        transport: &'a mut T,
        state: &'a mut ConnectionState,
        refspecs: &'a [RefspecPattern],
    ) -> Self {
        Self { transport, state, refspecs }
    }

    /// Run the fetch. The transport is disconnected before this returns,
    /// whatever the outcome; the first error encountered is the one
    /// returned.
    pub fn fetch(self) -> SyncResult<FetchOutcome> {
        let mut conn = Connection::open(self.transport, self.state, Direction::Fetch)?;
        conn.begin_transfer();
        let outcome = transfer(conn.transport(), self.refspecs);
        if let Ok(ref fetched) = outcome {
            info!(
                indexed = fetched.stats.indexed_objects,
                received = fetched.stats.received_objects,
                bytes = fetched.stats.received_bytes,
                tips = fetched.updated.len(),
                "fetch complete"
            );
        }
        conn.close(outcome)
    }
}

fn transfer<T: Transport + ?Sized>(
    transport: &mut T,
    refspecs: &[RefspecPattern],
) -> SyncResult<FetchOutcome> {
    debug!("downloading");
    transport.download().map_err(SyncError::Transfer)?;
    let stats = transport.stats();

    let advertised = transport.fetched_refs().map_err(SyncError::Transfer)?;
    let updates = plan_tip_updates(refspecs, &advertised)?;
    debug!(count = updates.len(), "updating tips");
    transport.update_local_tips(&updates).map_err(|err| match err {
        TransportError::NonFastForward { name } => SyncError::NonFastForward { name },
        other => SyncError::Transfer(other),
    })?;

    Ok(FetchOutcome { stats, updated: updates })
}

/// Map advertised remote references onto local tip updates.
///
/// Each reference is mapped by the first fetch refspec whose source matches
/// it; the refspec's force flag carries over to the update. References no
/// refspec matches, and refspecs with no destination, produce no update.
/// When two references map to the same local name, the first one wins.
pub fn plan_tip_updates(
    refspecs: &[RefspecPattern],
    advertised: &[AdvertisedRef],
) -> SyncResult<Vec<TipUpdate>> {
    let mut updates = Vec::new();
    let mut claimed: HashSet<String> = HashSet::new();

    for remote_ref in advertised {
        let Some(spec) = refspecs
            .iter()
            .filter(|spec| spec.direction() == Direction::Fetch)
            .find(|spec| spec.matches_source(&remote_ref.name))
        else {
            continue;
        };
        if spec.destination().is_empty() {
            continue;
        }
        let name = spec.transform(&remote_ref.name)?;
        if !claimed.insert(name.clone()) {
            debug!(local = %name, remote = %remote_ref.name, "local ref already claimed, skipping");
            continue;
        }
        updates.push(TipUpdate {
            name,
            target: remote_ref.target,
            force: spec.is_forced(),
        });
    }
    Ok(updates)
}

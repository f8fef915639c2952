use refsync_refspec::RefspecPattern;
use refsync_transport::{PushSessionHandle, Transport, TransportError};
use refsync_types::Direction;
use tracing::{debug, info};

use crate::connection::{Connection, ConnectionState};
use crate::error::{SyncError, SyncResult};
use crate::types::PushStatus;

/// Drives one push: connect, open a push session, register refspecs,
/// finish negotiation, collect per-reference statuses, update remote tips,
/// disconnect.
pub struct PushSession<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    state: &'a mut ConnectionState,
}

impl<'a, T: Transport + ?Sized> PushSession<'a, T> {
    pub fn new(transport: &'a mut T, state: &'a mut ConnectionState) -> Self {
        Self { transport, state }
    }

    /// Push `refspecs` in order.
    ///
    /// Returns one [`PushStatus`] per reference the remote reported a
    /// problem for, in report order; references it accepted are omitted.
    /// Registration stops at the first refspec that fails; refspecs already
    /// registered are not withdrawn, but negotiation does not run.
    pub fn push<S: AsRef<str>>(self, refspecs: &[S]) -> SyncResult<Vec<PushStatus>> {
        let mut conn = Connection::open(self.transport, self.state, Direction::Push)?;
        conn.begin_transfer();
        let outcome = negotiate(conn.transport(), refspecs);
        if let Ok(ref statuses) = outcome {
            info!(refspecs = refspecs.len(), rejected = statuses.len(), "push complete");
        }
        conn.close(outcome)
    }
}

fn negotiate<T, S>(transport: &mut T, refspecs: &[S]) -> SyncResult<Vec<PushStatus>>
where
    T: Transport + ?Sized,
    S: AsRef<str>,
{
    let mut session = transport.open_push_session().map_err(SyncError::Transfer)?;

    for refspec in refspecs {
        register(session.as_mut(), refspec.as_ref())?;
    }

    debug!("finishing push negotiation");
    session.finish().map_err(SyncError::Transfer)?;
    if !session.unpack_ok() {
        return Err(SyncError::Transfer(TransportError::UnpackFailed));
    }

    let statuses = collect_statuses(session.as_mut())?;
    session.update_remote_tips().map_err(SyncError::Transfer)?;
    Ok(statuses)
}

/// Validate a caller-supplied refspec and hand it to the session.
fn register(session: &mut dyn PushSessionHandle, refspec: &str) -> SyncResult<()> {
    if refspec.is_empty() {
        return Err(SyncError::InvalidRefspec {
            refspec: String::new(),
            reason: "refspec must not be empty".into(),
        });
    }
    RefspecPattern::push(refspec).map_err(|err| SyncError::InvalidRefspec {
        refspec: refspec.to_string(),
        reason: err.to_string(),
    })?;

    debug!(%refspec, "registering push refspec");
    session.add_refspec(refspec).map_err(|err| match err {
        TransportError::InvalidRefspec { refspec, reason } => {
            SyncError::InvalidRefspec { refspec, reason }
        }
        other => SyncError::Transfer(other),
    })
}

/// Drain the session's report, keeping only references with a message.
fn collect_statuses(session: &mut dyn PushSessionHandle) -> SyncResult<Vec<PushStatus>> {
    let mut statuses = Vec::new();
    for report in session.statuses() {
        let status = report.map_err(SyncError::PushStatus)?;
        if let Some(message) = status.message {
            statuses.push(PushStatus {
                reference_name: status.reference,
                message,
            });
        }
    }
    Ok(statuses)
}

//! Scoped connections to a transport.
//!
//! A [`Connection`] is acquired at the start of a fetch or push and always
//! released: explicitly through [`Connection::close`], or on drop if the
//! operation unwinds or returns early. The owning remote's
//! [`ConnectionState`] tracks the connection so a second transfer started
//! while one is open is rejected with [`SyncError::Busy`].

use refsync_transport::{Transport, TransportResult};
use refsync_types::Direction;
use tracing::{debug, warn};

use crate::error::{SyncError, SyncResult};

/// Where a remote is in its connect/transfer/disconnect cycle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connected(Direction),
    /// Objects or references are moving.
    Transferring(Direction),
}

impl ConnectionState {
    pub fn is_connected(&self) -> bool {
        !matches!(self, ConnectionState::Disconnected)
    }

    /// The direction of the open connection, if any.
    pub fn direction(&self) -> Option<Direction> {
        match self {
            ConnectionState::Disconnected => None,
            ConnectionState::Connected(d) | ConnectionState::Transferring(d) => Some(*d),
        }
    }
}

/// An open connection that disconnects when closed or dropped.
pub struct Connection<'a, T: Transport + ?Sized> {
    transport: &'a mut T,
    state: &'a mut ConnectionState,
    direction: Direction,
    open: bool,
}

impl<'a, T: Transport + ?Sized> Connection<'a, T> {
    /// Connect `transport` for `direction`, recording the connection in
    /// `state`.
    ///
    /// Fails with [`SyncError::Busy`] if `state` already shows a connection,
    /// and with [`SyncError::Connection`] if the transport refuses; in both
    /// cases `state` is left as it was.
    pub fn open(
        transport: &'a mut T,
        state: &'a mut ConnectionState,
        direction: Direction,
    ) -> SyncResult<Self> {
        if let Some(active) = state.direction() {
            return Err(SyncError::Busy { active });
        }
        debug!(%direction, "connecting");
        transport.connect(direction).map_err(SyncError::Connection)?;
        *state = ConnectionState::Connected(direction);
        Ok(Self {
            transport,
            state,
            direction,
            open: true,
        })
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn state(&self) -> ConnectionState {
        *self.state
    }

    /// Access the connected transport.
    pub fn transport(&mut self) -> &mut T {
        &mut *self.transport
    }

    /// Mark the connection as moving data.
    pub fn begin_transfer(&mut self) {
        *self.state = ConnectionState::Transferring(self.direction);
    }

    /// Disconnect and combine the disconnect result with `outcome`.
    ///
    /// An error already in `outcome` always wins; a failed disconnect is
    /// only surfaced (as [`SyncError::Connection`]) when the operation
    /// itself succeeded.
    pub fn close<R>(mut self, outcome: SyncResult<R>) -> SyncResult<R> {
        match (outcome, self.shutdown()) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(cleanup)) => Err(SyncError::Connection(cleanup)),
            (Err(err), Ok(())) => Err(err),
            (Err(err), Err(cleanup)) => {
                warn!(error = %cleanup, "disconnect failed after an earlier error");
                Err(err)
            }
        }
    }

    fn shutdown(&mut self) -> TransportResult<()> {
        if !self.open {
            return Ok(());
        }
        self.open = false;
        *self.state = ConnectionState::Disconnected;
        debug!(direction = %self.direction, "disconnecting");
        self.transport.disconnect()
    }
}

impl<T: Transport + ?Sized> Drop for Connection<'_, T> {
    fn drop(&mut self) {
        if let Err(err) = self.shutdown() {
            warn!(error = %err, "disconnect failed while dropping connection");
        }
    }
}

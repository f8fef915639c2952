use refsync_types::Direction;

use crate::error::{TransportError, TransportResult};
use crate::traits::{PushSessionHandle, Transport};
use crate::types::{AdvertisedRef, TipUpdate, TransferStats};

/// A transport that refuses every connection.
///
/// Remotes opened only to read or edit their configuration carry this
/// transport until a real one is attached.
#[derive(Clone, Copy, Debug, Default)]
pub struct Offline;

impl Transport for Offline {
    fn connect(&mut self, direction: Direction) -> TransportResult<()> {
        Err(TransportError::Connect(format!("no transport attached for {direction}")))
    }

    fn download(&mut self) -> TransportResult<()> {
        Err(TransportError::NotConnected(Direction::Fetch))
    }

    fn disconnect(&mut self) -> TransportResult<()> {
        Ok(())
    }

    fn stats(&self) -> TransferStats {
        TransferStats::default()
    }

    fn fetched_refs(&self) -> TransportResult<Vec<AdvertisedRef>> {
        Ok(Vec::new())
    }

    fn update_local_tips(&mut self, _updates: &[TipUpdate]) -> TransportResult<()> {
        Err(TransportError::NotConnected(Direction::Fetch))
    }

    fn open_push_session(&mut self) -> TransportResult<Box<dyn PushSessionHandle + '_>> {
        Err(TransportError::NotConnected(Direction::Push))
    }
}

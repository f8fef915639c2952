//! The object-transfer collaborator consumed by refsync sessions.
//!
//! Sessions never speak a wire protocol themselves. They drive a
//! [`Transport`] through connect, download, tip updates, and a push session
//! lifecycle, and interpret what it reports.
//!
//! # Modules
//!
//! - [`error`] — [`TransportError`], the typed result of every collaborator call
//! - [`types`] — [`TransferStats`], [`AdvertisedRef`], [`TipUpdate`], [`RefStatus`]
//! - [`traits`] — The [`Transport`] and [`PushSessionHandle`] traits
//! - [`negotiation`] — Want/have object walks over a commit graph
//! - [`memory`] — [`InMemoryTransport`], a two-repository backend for tests
//! - [`offline`] — [`Offline`], a transport that refuses every connection

pub mod error;
pub mod memory;
pub mod negotiation;
pub mod offline;
pub mod traits;
pub mod types;

pub use error::{TransportError, TransportResult};
pub use memory::{Call, FailurePoint, InMemoryTransport, ObjectRecord, Repository};
pub use negotiation::NegotiationEngine;
pub use offline::Offline;
pub use traits::{PushSessionHandle, StatusStream, Transport};
pub use types::{AdvertisedRef, RefStatus, TipUpdate, TransferStats};

//! Foundation types shared by every refsync crate.
//!
//! # Key Types
//!
//! - [`Oid`] — Content-addressed object identifier (BLAKE3 hash)
//! - [`Direction`] — Whether a connection or refspec is used for fetch or push

pub mod direction;
pub mod error;
pub mod object;

pub use direction::Direction;
pub use error::TypeError;
pub use object::Oid;

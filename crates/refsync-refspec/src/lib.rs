//! Refspec patterns for mapping reference names between repositories.
//!
//! A refspec such as `+refs/heads/*:refs/remotes/origin/*` pairs a source
//! pattern with a destination pattern. Each side may contain at most one `*`
//! wildcard; the segment it captures on one side is substituted into the
//! other side's wildcard. Fetch refspecs map remote names to local tracking
//! names, push refspecs map local names to remote names.
//!
//! # Modules
//!
//! - [`error`] — Error types for parsing and transformation
//! - [`names`] — Ref-name and remote-name validation
//! - [`pattern`] — The immutable [`RefspecPattern`] type

pub mod error;
pub mod names;
pub mod pattern;

pub use error::{RefspecError, Result};
pub use names::{validate_ref_name, validate_refspec_side, validate_remote_name};
pub use pattern::RefspecPattern;
pub use refsync_types::Direction;

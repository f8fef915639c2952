//! Error types for refspec operations.

use thiserror::Error;

/// Errors that can occur while building or applying a refspec.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefspecError {
    /// The refspec text or one of its sides is malformed. Raised at
    /// construction, never at match time.
    #[error("invalid refspec {refspec:?}: {reason}")]
    InvalidPattern { refspec: String, reason: String },

    /// A transform was requested for a name the pattern does not match.
    #[error("{name:?} does not match refspec pattern {pattern:?}")]
    PatternMismatch { name: String, pattern: String },

    /// A reference or remote name violates naming rules.
    #[error("invalid name {name:?}: {reason}")]
    InvalidRefName { name: String, reason: String },
}

/// Convenience type alias for refspec operations.
pub type Result<T> = std::result::Result<T, RefspecError>;

//! Error types for remote configuration.

use refsync_refspec::RefspecError;
use thiserror::Error;

/// Errors raised while validating or persisting a remote definition.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("remote not found: {name}")]
    NotFound { name: String },

    /// Another remote already uses this name.
    #[error("remote already exists: {name}")]
    AlreadyExists { name: String },

    #[error("invalid remote name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    #[error("remote {name} needs a non-empty url")]
    EmptyUrl { name: String },

    /// A stored or supplied refspec could not be parsed.
    #[error(transparent)]
    InvalidRefspec(#[from] RefspecError),

    #[error("config store lock poisoned")]
    Poisoned,

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Convenience type alias for configuration operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

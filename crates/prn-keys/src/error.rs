//! Error types for key and name handling.

use thiserror::Error;

/// Errors raised while interpreting names, states, or versions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum KeyError {
    /// An event or file name cannot be used as a key segment.
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: String },

    /// A lifecycle state other than `pending` or `approved`.
    #[error("unknown layer state: {0:?}")]
    InvalidState(String),

    /// A version token that is not `v<N>` or `<N>`.
    #[error("invalid version: {0:?}")]
    InvalidVersion(String),
}

/// Convenience type alias for key operations.
pub type Result<T> = std::result::Result<T, KeyError>;

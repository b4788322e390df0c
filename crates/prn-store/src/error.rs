/// Errors from object store operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// No object exists at the requested key.
    #[error("object not found: {0}")]
    NotFound(String),

    /// The key cannot be mapped onto this backend.
    #[error("invalid object key {key:?}: {reason}")]
    InvalidKey { key: String, reason: String },

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Any other backend failure (network, permissions, poisoned state).
    #[error("backend error: {0}")]
    Backend(String),
}

impl StoreError {
    /// Returns `true` if this error means the key is absent.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

//! Error types for the persistence layer.

use thiserror::Error;

/// Result type for storage operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The key-value backend failed.
    #[error("storage backend error: {0}")]
    Backend(String),

    /// A value could not be sealed before writing.
    #[error("encryption error: {0}")]
    Encryption(String),

    /// A value is present but unreadable (undecryptable, not UTF-8, or not a
    /// storage map). Never reported for absent values.
    #[error("stored value unreadable: {0}")]
    Decryption(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<rusqlite::Error> for StoreError {
    fn from(err: rusqlite::Error) -> Self {
        Self::Backend(err.to_string())
    }
}

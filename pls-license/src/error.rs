//! Error types for the licensing module.

use pls_crypto::CryptoError;
use pls_store::StoreError;
use thiserror::Error;

/// Licensing-specific errors.
#[derive(Debug, Error)]
pub enum LicenseError {
    /// The remote authority could not be reached (connect failure, timeout,
    /// interrupted body). Never retried automatically.
    #[error("transport error: {0}")]
    Transport(String),

    /// A 2xx response lacked required fields or was not JSON.
    #[error("unexpected response format: {0}")]
    UnexpectedResponseFormat(String),

    /// The authority answered with a non-2xx status.
    #[error("remote rejected request (HTTP {status}): {message}")]
    RemoteRejected { status: u16, message: String },

    /// Persisted license material is present but unreadable.
    #[error("license record unreadable: {0}")]
    Decryption(String),

    /// No storage-map entry (or stored value) for the requested plugin.
    #[error("not found: {0}")]
    NotFound(String),

    /// The key-value backend failed.
    #[error("storage error: {0}")]
    Storage(String),

    /// Invalid configuration.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl LicenseError {
    /// Returns true if the error came from talking to the remote authority.
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Self::Transport(_) | Self::UnexpectedResponseFormat(_) | Self::RemoteRejected { .. }
        )
    }

    /// Stable machine-readable code for this error kind.
    pub fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "transport_error",
            Self::UnexpectedResponseFormat(_) => "unexpected_response_format",
            Self::RemoteRejected { .. } => "remote_rejected",
            Self::Decryption(_) => "decryption_error",
            Self::NotFound(_) => "not_found",
            Self::Storage(_) => "storage_error",
            Self::Config(_) => "config_error",
            Self::Serialization(_) => "serialization_error",
        }
    }
}

impl From<StoreError> for LicenseError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Decryption(msg) => Self::Decryption(msg),
            StoreError::Serialization(e) => Self::Serialization(e),
            StoreError::Backend(msg) | StoreError::Encryption(msg) => Self::Storage(msg),
        }
    }
}

impl From<CryptoError> for LicenseError {
    fn from(err: CryptoError) -> Self {
        match err {
            CryptoError::Decryption(msg) => Self::Decryption(msg),
            CryptoError::KeyDerivation(msg) => Self::Config(format!("key derivation: {msg}")),
            CryptoError::Encryption(msg) => Self::Storage(msg),
        }
    }
}

/// Result type for license operations.
pub type LicenseResult<T> = Result<T, LicenseError>;

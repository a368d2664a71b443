//! Codec errors.

use thiserror::Error;

pub type CryptoResult<T> = Result<T, CryptoError>;

/// Failure of a codec operation.
///
/// Callers branch on `Decryption`: it means stored bytes exist but cannot be
/// read back under the current key.
#[derive(Debug, Error)]
pub enum CryptoError {
    /// Key derivation failed (bad parameters or a salt that is too short).
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Decryption failed (malformed input, wrong key or tampered data).
    #[error("decryption failed: {0}")]
    Decryption(String),
}

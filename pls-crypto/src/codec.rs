//! Abstract codec for at-rest payloads.
//!
//! The record store depends on `Arc<dyn EncryptionCodec>` and never sees raw
//! keys. `SecretCodec` derives its key from the host secret once, at
//! construction; tests use `PassthroughCodec`.

use crate::cipher;
use crate::error::CryptoResult;
use crate::key::{KdfParams, StorageKey};
use serde::{Deserialize, Serialize};

/// Host-supplied secret material for the at-rest codec.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct CodecConfig {
    /// The host secret.
    pub secret_key: String,
    /// Salt mixed into key derivation (at least 8 bytes).
    pub secret_salt: String,
    /// Argon2id cost parameters.
    #[serde(default)]
    pub kdf: KdfParams,
}

impl std::fmt::Debug for CodecConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CodecConfig")
            .field("secret_key", &"[REDACTED]")
            .field("secret_salt", &"[REDACTED]")
            .field("kdf", &self.kdf)
            .finish()
    }
}

/// Trait for encrypting/decrypting opaque byte payloads.
///
/// Implementations own the key material and keep no other state.
pub trait EncryptionCodec: Send + Sync {
    /// Encrypts `plaintext` into an opaque blob.
    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Decrypts a blob produced by `encrypt`. Malformed or tampered input is
    /// always `CryptoError::Decryption`.
    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>>;
}

/// ChaCha20-Poly1305 codec keyed by the host secret.
#[derive(Debug, Clone)]
pub struct SecretCodec {
    key: StorageKey,
}

impl SecretCodec {
    /// Derives the codec key from host configuration.
    pub fn from_config(config: &CodecConfig) -> CryptoResult<Self> {
        let key =
            StorageKey::derive(&config.secret_key, config.secret_salt.as_bytes(), &config.kdf)?;
        Ok(Self { key })
    }

    /// Uses an already-derived key.
    pub fn from_key(key: StorageKey) -> Self {
        Self { key }
    }
}

impl EncryptionCodec for SecretCodec {
    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        cipher::seal(&self.key, plaintext)
    }

    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        cipher::open(&self.key, ciphertext)
    }
}

/// No-op codec for tests and hosts that opt out of at-rest encryption.
/// Data passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct PassthroughCodec;

impl EncryptionCodec for PassthroughCodec {
    fn encrypt(&self, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
        Ok(plaintext.to_vec())
    }

    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Vec<u8>> {
        Ok(ciphertext.to_vec())
    }
}

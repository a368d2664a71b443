//! Sealed blob format.
//!
//! A blob is `nonce (12 bytes) || ciphertext || tag (16 bytes)`. Every
//! `seal` draws a fresh nonce, so identical plaintexts never produce
//! identical blobs.

use crate::error::{CryptoError, CryptoResult};
use crate::key::StorageKey;
use chacha20poly1305::aead::{Aead, KeyInit, OsRng};
use chacha20poly1305::{AeadCore, ChaCha20Poly1305, Key, Nonce};

/// Nonce length for ChaCha20-Poly1305.
pub const NONCE_SIZE: usize = 12;

/// Poly1305 tag length.
pub const TAG_SIZE: usize = 16;

/// Smallest well-formed blob: a nonce plus the tag of an empty plaintext.
pub const MIN_BLOB_SIZE: usize = NONCE_SIZE + TAG_SIZE;

fn aead(key: &StorageKey) -> ChaCha20Poly1305 {
    ChaCha20Poly1305::new(Key::from_slice(key.as_bytes()))
}

/// Seals `plaintext` under `key` into a self-contained blob.
pub fn seal(key: &StorageKey, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let nonce = ChaCha20Poly1305::generate_nonce(&mut OsRng);
    let sealed = aead(key)
        .encrypt(&nonce, plaintext)
        .map_err(|e| CryptoError::Encryption(e.to_string()))?;

    let mut blob = Vec::with_capacity(NONCE_SIZE + sealed.len());
    blob.extend_from_slice(&nonce);
    blob.extend_from_slice(&sealed);
    Ok(blob)
}

/// Opens a blob produced by [`seal`].
///
/// Truncated input, a wrong key and a modified byte all fail the same way.
pub fn open(key: &StorageKey, blob: &[u8]) -> CryptoResult<Vec<u8>> {
    if blob.len() < MIN_BLOB_SIZE {
        return Err(CryptoError::Decryption(format!(
            "blob is {} bytes, need at least {MIN_BLOB_SIZE}",
            blob.len()
        )));
    }
    let (nonce, sealed) = blob.split_at(NONCE_SIZE);
    aead(key)
        .decrypt(Nonce::from_slice(nonce), sealed)
        .map_err(|_| CryptoError::Decryption("authentication tag mismatch".to_string()))
}

//! The storage key and how it is obtained from the host secret.

use crate::error::{CryptoError, CryptoResult};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Key length in bytes.
pub const KEY_SIZE: usize = 32;

/// Argon2 refuses shorter salts.
pub const MIN_SALT_SIZE: usize = 8;

/// Symmetric key for sealing license records. Wiped on drop.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct StorageKey([u8; KEY_SIZE]);

impl StorageKey {
    /// Wraps raw key material.
    pub fn from_bytes(bytes: [u8; KEY_SIZE]) -> Self {
        Self(bytes)
    }

    /// Stretches the host secret into a key with Argon2id.
    ///
    /// Deterministic in `(secret, salt, params)`, so blobs written by one
    /// process open in the next as long as the host keeps its secret.
    pub fn derive(secret: &str, salt: &[u8], params: &KdfParams) -> CryptoResult<Self> {
        if salt.len() < MIN_SALT_SIZE {
            return Err(CryptoError::KeyDerivation(format!(
                "salt is {} bytes, need at least {MIN_SALT_SIZE}",
                salt.len()
            )));
        }

        let cost = Params::new(
            params.memory_cost,
            params.time_cost,
            params.parallelism,
            Some(KEY_SIZE),
        )
        .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        let mut out = [0u8; KEY_SIZE];
        Argon2::new(Algorithm::Argon2id, Version::V0x13, cost)
            .hash_password_into(secret.as_bytes(), salt, &mut out)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;

        let key = Self(out);
        out.zeroize();
        Ok(key)
    }

    /// A fresh key from the OS RNG. Blobs sealed with it die with the process.
    pub fn random() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

impl std::fmt::Debug for StorageKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("StorageKey([REDACTED])")
    }
}

/// Argon2id cost settings.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct KdfParams {
    /// KiB of memory per derivation.
    pub memory_cost: u32,
    /// Passes over memory.
    pub time_cost: u32,
    /// Lanes.
    pub parallelism: u32,
}

impl Default for KdfParams {
    fn default() -> Self {
        // OWASP baseline for Argon2id: m=19 MiB, t=2, p=1
        Self {
            memory_cost: 19 * 1024,
            time_cost: 2,
            parallelism: 1,
        }
    }
}

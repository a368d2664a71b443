//! The license record store.
//!
//! Two kinds of state live in the key-value store:
//!
//! - the storage map, one encrypted JSON blob under a well-known key;
//! - individual license ids and activation keys, each under the name recorded
//!   in (or recomputed for) the plugin's storage-map entry.
//!
//! Writes of the storage map replace the whole blob. There is no partial
//! update and no concurrency guard, so callers that modify the map must
//! read-modify-write and accept that the last writer wins.

use crate::error::{StoreError, StoreResult};
use crate::kv::KeyValueStore;
use pls_crypto::{CryptoError, EncryptionCodec};
use pls_types::{StorageMap, StorageMethod};
use std::sync::Arc;
use tracing::debug;

/// Default persistence key for the storage-map blob.
pub const DEFAULT_STORAGE_MAP_KEY: &str = "pls_license_storage_map";

/// Reads and writes license records through the encryption codec.
#[derive(Clone)]
pub struct LicenseRecordStore {
    kv: Arc<dyn KeyValueStore>,
    codec: Arc<dyn EncryptionCodec>,
    map_key: String,
}

impl LicenseRecordStore {
    /// Creates a record store using [`DEFAULT_STORAGE_MAP_KEY`].
    pub fn new(kv: Arc<dyn KeyValueStore>, codec: Arc<dyn EncryptionCodec>) -> Self {
        Self::with_map_key(kv, codec, DEFAULT_STORAGE_MAP_KEY)
    }

    /// Creates a record store with a custom storage-map key.
    pub fn with_map_key(
        kv: Arc<dyn KeyValueStore>,
        codec: Arc<dyn EncryptionCodec>,
        map_key: impl Into<String>,
    ) -> Self {
        Self {
            kv,
            codec,
            map_key: map_key.into(),
        }
    }

    /// The key under which the storage-map blob lives.
    pub fn storage_map_key(&self) -> &str {
        &self.map_key
    }

    /// Reads the storage map.
    ///
    /// Returns an empty map only when no blob exists. A blob that is present
    /// but cannot be decrypted or parsed is `StoreError::Decryption`.
    pub fn get_storage_map(&self) -> StoreResult<StorageMap> {
        let Some(blob) = self.kv.get(&self.map_key)? else {
            debug!(key = %self.map_key, "no storage map persisted");
            return Ok(StorageMap::new());
        };

        let plaintext = self.codec.decrypt(&blob).map_err(unreadable)?;
        serde_json::from_slice(&plaintext).map_err(|e| {
            StoreError::Decryption(format!("storage map is not a valid map: {e}"))
        })
    }

    /// Replaces the persisted storage map with `map`.
    pub fn put_storage_map(&self, map: &StorageMap) -> StoreResult<()> {
        let json = serde_json::to_vec(map)?;
        let blob = self.codec.encrypt(&json).map_err(sealing)?;
        self.kv.set(&self.map_key, &blob)?;
        debug!(key = %self.map_key, entries = map.len(), "storage map written");
        Ok(())
    }

    /// Reads an individual value stored under `name`.
    pub fn get_value(&self, name: &str, method: StorageMethod) -> StoreResult<Option<String>> {
        let Some(raw) = self.kv.get(name)? else {
            return Ok(None);
        };

        let bytes = match method {
            StorageMethod::Encrypted => self.codec.decrypt(&raw).map_err(unreadable)?,
            StorageMethod::Plain => raw,
        };

        String::from_utf8(bytes)
            .map(Some)
            .map_err(|e| StoreError::Decryption(format!("value under {name} is not UTF-8: {e}")))
    }

    /// Writes an individual value under `name`.
    pub fn put_value(&self, name: &str, method: StorageMethod, value: &str) -> StoreResult<()> {
        let bytes = match method {
            StorageMethod::Encrypted => self.codec.encrypt(value.as_bytes()).map_err(sealing)?,
            StorageMethod::Plain => value.as_bytes().to_vec(),
        };
        self.kv.set(name, &bytes)
    }
}

fn unreadable(err: CryptoError) -> StoreError {
    StoreError::Decryption(err.to_string())
}

fn sealing(err: CryptoError) -> StoreError {
    StoreError::Encryption(err.to_string())
}

//! Shared test helpers for store tests.

#![allow(dead_code)]

use pls_crypto::{EncryptionCodec, SecretCodec, StorageKey};
use pls_store::{KeyValueStore, LicenseRecordStore, MemoryStore};
use pls_types::{PluginId, ProviderName, StorageMapEntry, StorageMethod};
use std::sync::Arc;

/// A codec with a fresh random key.
pub fn test_codec() -> Arc<dyn EncryptionCodec> {
    Arc::new(SecretCodec::from_key(StorageKey::random()))
}

/// A record store over a fresh in-memory backend, returning both.
pub fn memory_records() -> (Arc<MemoryStore>, LicenseRecordStore) {
    let kv = Arc::new(MemoryStore::new());
    let records = LicenseRecordStore::new(kv.clone() as Arc<dyn KeyValueStore>, test_codec());
    (kv, records)
}

/// A fully populated entry as written by a current provisioning.
pub fn full_entry(plugin: &str, provider: &str) -> (PluginId, StorageMapEntry) {
    (
        PluginId::from(plugin),
        StorageMapEntry {
            download_url: Some(format!("https://cdn.example/{plugin}.zip")),
            basename: Some(format!("{plugin}/{plugin}.php")),
            provider: Some(ProviderName::from(provider)),
            activation_key_storage_name: Some(format!("pls_activation_key_{plugin}")),
            license_id_storage_name: Some(format!("pls_license_id_{plugin}")),
            storage_method: Some(StorageMethod::Encrypted),
        },
    )
}

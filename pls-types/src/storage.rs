//! The persisted storage map and the entries it holds.
//!
//! Entries written by older schemas may lack any field, so every field is
//! optional. Missing storage names are recomputed by the provider resolver;
//! they are never treated as lost.

use crate::ids::{PluginId, ProviderName};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How an individual license value is persisted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageMethod {
    /// Value passes through the encryption codec.
    #[default]
    Encrypted,
    /// Value is stored as UTF-8 text.
    Plain,
}

impl StorageMethod {
    /// Returns the wire name of this method.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Encrypted => "encrypted",
            Self::Plain => "plain",
        }
    }
}

impl fmt::Display for StorageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The canonical persistence key names for one plugin's license material.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StorageNames {
    /// Key under which the license id is stored.
    pub license_id: String,
    /// Key under which the activation key is stored.
    pub activation_key: String,
    /// How both values are persisted.
    pub storage_method: StorageMethod,
}

/// Where and how a plugin's license material is persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageMapEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub download_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub basename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<ProviderName>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub activation_key_storage_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub license_id_storage_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage_method: Option<StorageMethod>,
}

impl StorageMapEntry {
    /// Returns true if every storage name is recorded explicitly.
    #[must_use]
    pub fn has_storage_names(&self) -> bool {
        self.license_id_storage_name.is_some()
            && self.activation_key_storage_name.is_some()
            && self.storage_method.is_some()
    }

    /// Names recorded in this entry, with gaps filled from `resolved`.
    #[must_use]
    pub fn storage_names_or(&self, resolved: &StorageNames) -> StorageNames {
        StorageNames {
            license_id: self
                .license_id_storage_name
                .clone()
                .unwrap_or_else(|| resolved.license_id.clone()),
            activation_key: self
                .activation_key_storage_name
                .clone()
                .unwrap_or_else(|| resolved.activation_key.clone()),
            storage_method: self.storage_method.unwrap_or(resolved.storage_method),
        }
    }

    /// Backfills absent storage names from `names`. Returns true if anything changed.
    pub fn fill_missing_names(&mut self, names: &StorageNames) -> bool {
        let mut changed = false;
        if self.license_id_storage_name.is_none() {
            self.license_id_storage_name = Some(names.license_id.clone());
            changed = true;
        }
        if self.activation_key_storage_name.is_none() {
            self.activation_key_storage_name = Some(names.activation_key.clone());
            changed = true;
        }
        if self.storage_method.is_none() {
            self.storage_method = Some(names.storage_method);
            changed = true;
        }
        changed
    }
}

/// Persisted index from plugin id to storage-map entry.
///
/// Ordered so that serialization is deterministic.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StorageMap(BTreeMap<PluginId, StorageMapEntry>);

impl StorageMap {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the entry for `plugin`, if any.
    #[must_use]
    pub fn get(&self, plugin: &PluginId) -> Option<&StorageMapEntry> {
        self.0.get(plugin)
    }

    /// Inserts or replaces the entry for `plugin`.
    pub fn insert(&mut self, plugin: PluginId, entry: StorageMapEntry) -> Option<StorageMapEntry> {
        self.0.insert(plugin, entry)
    }

    #[must_use]
    pub fn contains(&self, plugin: &PluginId) -> bool {
        self.0.contains_key(plugin)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PluginId, &StorageMapEntry)> {
        self.0.iter()
    }
}

impl FromIterator<(PluginId, StorageMapEntry)> for StorageMap {
    fn from_iter<I: IntoIterator<Item = (PluginId, StorageMapEntry)>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

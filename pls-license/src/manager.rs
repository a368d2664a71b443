//! License lifecycle orchestration.
//!
//! Per plugin: unprovisioned, then provisioned, then activated. An activated
//! license is re-validated against the authority whenever it is used; there is
//! no local notion of expiry.
//!
//! Remote calls are avoided where stored state is still confirmed valid:
//! `provision` and `activate` both short-circuit when a stored activation key
//! passes the status check.

use crate::api::{HttpLicensingApi, LicensingApi};
use crate::config::{LicensingConfig, SiteIdentity};
use crate::error::{LicenseError, LicenseResult};
use crate::lock::{MapLock, Unguarded};
use crate::provider::ProviderRegistry;
use pls_crypto::EncryptionCodec;
use pls_store::{KeyValueStore, LicenseRecordStore};
use pls_types::{
    ActivationKey, LicenseId, LicenseStatus, PluginId, ProviderName, StorageMapEntry, StorageNames,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// A provisioned license: the id plus where its material lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionedLicense {
    pub license_id: LicenseId,
    #[serde(flatten)]
    pub entry: StorageMapEntry,
}

/// Orchestrates provisioning, activation and validation.
pub struct LicenseManager {
    records: LicenseRecordStore,
    providers: ProviderRegistry,
    api: Arc<dyn LicensingApi>,
    site: SiteIdentity,
    lock: Arc<dyn MapLock>,
}

impl LicenseManager {
    /// Creates a manager with no guard around storage-map writes.
    pub fn new(
        records: LicenseRecordStore,
        providers: ProviderRegistry,
        api: Arc<dyn LicensingApi>,
        site: SiteIdentity,
    ) -> Self {
        Self {
            records,
            providers,
            api,
            site,
            lock: Arc::new(Unguarded),
        }
    }

    /// Wires the HTTP client, provider registry and record store from configuration.
    pub fn from_config(
        config: &LicensingConfig,
        kv: Arc<dyn KeyValueStore>,
        codec: Arc<dyn EncryptionCodec>,
    ) -> LicenseResult<Self> {
        config.validate()?;
        let records = LicenseRecordStore::with_map_key(kv, codec, config.storage_map_key.clone());
        let providers = ProviderRegistry::from_config(&config.providers);
        let api = Arc::new(HttpLicensingApi::new(config)?);
        Ok(Self::new(records, providers, api, config.site.clone()))
    }

    /// Replaces the storage-map write guard.
    pub fn with_lock(mut self, lock: Arc<dyn MapLock>) -> Self {
        self.lock = lock;
        self
    }

    pub fn records(&self) -> &LicenseRecordStore {
        &self.records
    }

    pub fn providers(&self) -> &ProviderRegistry {
        &self.providers
    }

    /// Provisions a license for `plugin`, reusing the stored one when it is
    /// still remotely valid.
    ///
    /// A stored entry is reused unchanged when its license id and activation
    /// key are both present and the activation key passes the status check.
    /// Otherwise the authority is asked for a new license. Remote failures
    /// propagate before anything is written.
    pub async fn provision(
        &self,
        plugin: &PluginId,
        provider: &ProviderName,
    ) -> LicenseResult<ProvisionedLicense> {
        let _guard = self.lock.acquire(plugin).await;
        let mut map = self.records.get_storage_map()?;
        let existing = map.get(plugin).cloned();

        if let Some(entry) = &existing {
            if let Some(cached) = self.cached_license(plugin, entry).await? {
                info!(plugin = %plugin, "stored license still valid, skipping provisioning");
                return Ok(cached);
            }
        }

        info!(plugin = %plugin, provider = %provider, "provisioning license");
        let response = self.api.provision(plugin, provider).await?;

        let resolved = self.providers.resolve(provider, plugin);
        let names = match &existing {
            Some(entry) => entry.storage_names_or(&resolved),
            None => resolved,
        };
        let names = match &response.storage_map {
            Some(overrides) => overrides.apply(names),
            None => names,
        };

        self.records.put_value(
            &names.license_id,
            names.storage_method,
            response.license_id.as_str(),
        )?;

        let entry = StorageMapEntry {
            download_url: Some(response.download_url),
            basename: response
                .basename
                .or_else(|| existing.and_then(|e| e.basename)),
            provider: Some(provider.clone()),
            activation_key_storage_name: Some(names.activation_key),
            license_id_storage_name: Some(names.license_id),
            storage_method: Some(names.storage_method),
        };
        map.insert(plugin.clone(), entry.clone());
        self.records.put_storage_map(&map)?;

        debug!(plugin = %plugin, license_id = %response.license_id, "license recorded");
        Ok(ProvisionedLicense {
            license_id: response.license_id,
            entry,
        })
    }

    /// Activates the provisioned license for `plugin`.
    ///
    /// Returns the stored activation key without a remote activation when it
    /// is still valid. Entries written without storage names get them
    /// backfilled after a successful activation.
    pub async fn activate(&self, plugin: &PluginId) -> LicenseResult<ActivationKey> {
        let _guard = self.lock.acquire(plugin).await;
        let mut map = self.records.get_storage_map()?;
        let Some(mut entry) = map.get(plugin).cloned() else {
            return Err(not_provisioned(plugin));
        };
        let names = self.resolved_names(plugin, &entry);

        if let Some(stored) = self
            .records
            .get_value(&names.activation_key, names.storage_method)?
        {
            let key = ActivationKey::from(stored);
            if self.check_key(&key).await {
                info!(plugin = %plugin, "stored activation key still valid");
                return Ok(key);
            }
            debug!(plugin = %plugin, "stored activation key rejected, reactivating");
        }

        let license_id = self
            .records
            .get_value(&names.license_id, names.storage_method)?
            .map(LicenseId::from)
            .ok_or_else(|| {
                LicenseError::NotFound(format!("no license id stored for plugin {plugin}"))
            })?;

        info!(plugin = %plugin, "activating license");
        let key = self.api.activate(&license_id, &self.site).await?;
        self.records
            .put_value(&names.activation_key, names.storage_method, key.as_str())?;

        if entry.fill_missing_names(&names) {
            map.insert(plugin.clone(), entry);
            self.records.put_storage_map(&map)?;
            debug!(plugin = %plugin, "backfilled storage names");
        }

        Ok(key)
    }

    /// Fail-closed validity gate.
    ///
    /// Uses `activation_key` when given, otherwise the key stored for
    /// `plugin`. Every failure along the way reports `false`.
    pub async fn check_license_status(
        &self,
        plugin: Option<&PluginId>,
        activation_key: Option<&ActivationKey>,
    ) -> bool {
        if let Some(key) = activation_key {
            return self.check_key(key).await;
        }

        let Some(plugin) = plugin else {
            warn!("no plugin or activation key to check, reporting invalid");
            return false;
        };

        match self.stored_activation_key(plugin) {
            Ok(Some(key)) => self.check_key(&key).await,
            Ok(None) => {
                debug!(plugin = %plugin, "no activation key stored, reporting invalid");
                false
            }
            Err(e) => {
                warn!(
                    plugin = %plugin,
                    error = %e,
                    "could not read activation key, reporting invalid"
                );
                false
            }
        }
    }

    /// Remote status for `plugin`, keyed by its activation key or, before
    /// activation, its license id. Errors propagate.
    pub async fn status(&self, plugin: &PluginId) -> LicenseResult<LicenseStatus> {
        let map = self.records.get_storage_map()?;
        let entry = map.get(plugin).ok_or_else(|| not_provisioned(plugin))?;
        let names = self.resolved_names(plugin, entry);

        let handle = match self
            .records
            .get_value(&names.activation_key, names.storage_method)?
        {
            Some(key) => key,
            None => self
                .records
                .get_value(&names.license_id, names.storage_method)?
                .ok_or_else(|| {
                    LicenseError::NotFound(format!(
                        "no license material stored for plugin {plugin}"
                    ))
                })?,
        };

        self.api.status(&handle).await
    }

    /// The stored license for `entry`, if complete and still valid.
    async fn cached_license(
        &self,
        plugin: &PluginId,
        entry: &StorageMapEntry,
    ) -> LicenseResult<Option<ProvisionedLicense>> {
        let names = self.resolved_names(plugin, entry);

        let Some(license_id) = self
            .records
            .get_value(&names.license_id, names.storage_method)?
        else {
            return Ok(None);
        };
        let Some(activation_key) = self
            .records
            .get_value(&names.activation_key, names.storage_method)?
        else {
            debug!(plugin = %plugin, "license not activated, provisioning again");
            return Ok(None);
        };

        if !self.check_key(&ActivationKey::from(activation_key)).await {
            debug!(plugin = %plugin, "stored license invalid, provisioning again");
            return Ok(None);
        }

        Ok(Some(ProvisionedLicense {
            license_id: LicenseId::from(license_id),
            entry: entry.clone(),
        }))
    }

    fn stored_activation_key(&self, plugin: &PluginId) -> LicenseResult<Option<ActivationKey>> {
        let map = self.records.get_storage_map()?;
        let Some(entry) = map.get(plugin) else {
            return Ok(None);
        };
        let names = self.resolved_names(plugin, entry);
        Ok(self
            .records
            .get_value(&names.activation_key, names.storage_method)?
            .map(ActivationKey::from))
    }

    /// Names recorded in `entry`, recomputed through the entry's provider
    /// where absent.
    fn resolved_names(&self, plugin: &PluginId, entry: &StorageMapEntry) -> StorageNames {
        let resolved = match &entry.provider {
            Some(provider) => self.providers.resolve(provider, plugin),
            None => self.providers.resolve_default(plugin),
        };
        entry.storage_names_or(&resolved)
    }

    async fn check_key(&self, key: &ActivationKey) -> bool {
        match self.api.status(key.as_str()).await {
            Ok(status) => {
                debug!(%status, "license status checked");
                status.is_valid()
            }
            Err(e) => {
                warn!(error = %e, "license status check failed, reporting invalid");
                false
            }
        }
    }
}

fn not_provisioned(plugin: &PluginId) -> LicenseError {
    LicenseError::NotFound(format!("no license provisioned for plugin {plugin}"))
}

//! Licensing configuration.
//!
//! Built once by the host and injected into the manager and its
//! collaborators. Nothing reads configuration from globals.

use crate::error::{LicenseError, LicenseResult};
use pls_store::DEFAULT_STORAGE_MAP_KEY;
use pls_types::StorageMethod;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use std::time::Duration;

/// Default base URL of the licensing authority.
pub const DEFAULT_API_BASE_URL: &str = "https://hiive.cloud/api";

/// Default request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

/// The installation presented to the authority on activation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteIdentity {
    /// Domain name of this installation.
    pub domain_name: String,
    /// Administrative contact email.
    pub email: String,
}

/// Storage naming for a provider declared in configuration.
///
/// Templates may use `{plugin}` (the raw plugin id) and `{slug}` (the
/// sanitized plugin id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub license_id_key: String,
    pub activation_key_key: String,
    #[serde(default)]
    pub storage_method: StorageMethod,
}

/// Configuration for the license lifecycle.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LicensingConfig {
    /// Base URL of the licensing authority.
    pub api_base_url: String,
    /// Bearer token for the authority, if it requires one.
    pub api_token: Option<String>,
    /// Fixed timeout applied to every remote call.
    pub timeout_secs: u64,
    /// Installation identity sent on activation.
    pub site: SiteIdentity,
    /// Persistence key of the storage-map blob.
    pub storage_map_key: String,
    /// Providers with vendor-specific storage naming.
    pub providers: BTreeMap<String, ProviderConfig>,
}

impl Default for LicensingConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            site: SiteIdentity::default(),
            storage_map_key: DEFAULT_STORAGE_MAP_KEY.to_string(),
            providers: BTreeMap::new(),
        }
    }
}

impl std::fmt::Debug for LicensingConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LicensingConfig")
            .field("api_base_url", &self.api_base_url)
            .field("api_token", &self.api_token.as_ref().map(|_| "[REDACTED]"))
            .field("timeout_secs", &self.timeout_secs)
            .field("site", &self.site)
            .field("storage_map_key", &self.storage_map_key)
            .field("providers", &self.providers)
            .finish()
    }
}

impl LicensingConfig {
    /// Loads configuration from a JSON file. Absent fields take defaults.
    pub fn load(path: impl AsRef<Path>) -> LicenseResult<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path).map_err(|e| {
            LicenseError::Config(format!("failed to read {}: {e}", path.display()))
        })?;
        let config: Self = serde_json::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// The fixed timeout for remote calls.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    /// Rejects configurations that cannot work.
    pub fn validate(&self) -> LicenseResult<()> {
        if self.api_base_url.trim().is_empty() {
            return Err(LicenseError::Config("api_base_url must not be empty".to_string()));
        }
        if self.timeout_secs == 0 {
            return Err(LicenseError::Config("timeout_secs must be positive".to_string()));
        }
        if self.storage_map_key.trim().is_empty() {
            return Err(LicenseError::Config("storage_map_key must not be empty".to_string()));
        }
        for (name, provider) in &self.providers {
            for template in [&provider.license_id_key, &provider.activation_key_key] {
                if !template.contains("{plugin}") && !template.contains("{slug}") {
                    return Err(LicenseError::Config(format!(
                        "provider {name}: key template {template:?} needs {{plugin}} or {{slug}}"
                    )));
                }
            }
            if provider.license_id_key == provider.activation_key_key {
                return Err(LicenseError::Config(format!(
                    "provider {name}: license id and activation key templates must differ"
                )));
            }
        }
        Ok(())
    }
}

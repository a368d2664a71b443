//! Storage location resolution per provider.
//!
//! Each provider decides where a plugin's license id and activation key are
//! persisted. Resolution is a pure function of (provider, plugin): callers
//! recompute names whenever a persisted entry predates explicit names, so the
//! same inputs must always produce the same names.
//!
//! Providers that are not registered resolve through [`DefaultProvider`]:
//!
//! - license id: `pls_license_id_<slug>`
//! - activation key: `pls_activation_key_<slug>`
//! - storage method: `encrypted`
//!
//! where `<slug>` is the plugin id with `[a-z0-9-]` kept as-is and every
//! other UTF-8 byte written as `_` plus two lowercase hex digits
//! (`acme_plugin` becomes `acme_5fplugin`, `Acme` becomes `_41cme`). An
//! underscore only ever opens an escape, so distinct plugin ids never share
//! a slug and never share a storage key.

use crate::config::ProviderConfig;
use pls_types::{PluginId, ProviderName, StorageMethod, StorageNames};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;

/// Name reported by [`DefaultProvider`].
pub const DEFAULT_PROVIDER: &str = "default";

/// Encodes a plugin id for use inside a persistence key. Reversible.
pub fn plugin_slug(plugin: &PluginId) -> String {
    let raw = plugin.as_str();
    let mut slug = String::with_capacity(raw.len());
    for byte in raw.bytes() {
        if byte.is_ascii_lowercase() || byte.is_ascii_digit() || byte == b'-' {
            slug.push(char::from(byte));
        } else {
            slug.push('_');
            slug.push_str(&hex::encode([byte]));
        }
    }
    slug
}

/// Capability interface for a licensing scheme.
pub trait LicenseProvider: Send + Sync {
    /// Provider name as used in the storage map.
    fn name(&self) -> &str;

    /// Canonical storage names for `plugin`. Must be deterministic.
    fn storage_names(&self, plugin: &PluginId) -> StorageNames;
}

/// The documented fallback naming scheme.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultProvider;

impl LicenseProvider for DefaultProvider {
    fn name(&self) -> &str {
        DEFAULT_PROVIDER
    }

    fn storage_names(&self, plugin: &PluginId) -> StorageNames {
        let slug = plugin_slug(plugin);
        StorageNames {
            license_id: format!("pls_license_id_{slug}"),
            activation_key: format!("pls_activation_key_{slug}"),
            storage_method: StorageMethod::Encrypted,
        }
    }
}

/// A provider whose key names come from templates.
#[derive(Debug, Clone)]
pub struct TemplateProvider {
    name: String,
    config: ProviderConfig,
}

impl TemplateProvider {
    pub fn new(name: impl Into<String>, config: ProviderConfig) -> Self {
        Self {
            name: name.into(),
            config,
        }
    }

    fn render(template: &str, plugin: &PluginId) -> String {
        template
            .replace("{plugin}", plugin.as_str())
            .replace("{slug}", &plugin_slug(plugin))
    }
}

impl LicenseProvider for TemplateProvider {
    fn name(&self) -> &str {
        &self.name
    }

    fn storage_names(&self, plugin: &PluginId) -> StorageNames {
        StorageNames {
            license_id: Self::render(&self.config.license_id_key, plugin),
            activation_key: Self::render(&self.config.activation_key_key, plugin),
            storage_method: self.config.storage_method,
        }
    }
}

/// Runtime registry of providers keyed by name.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    providers: HashMap<ProviderName, Arc<dyn LicenseProvider>>,
    fallback: DefaultProvider,
}

impl ProviderRegistry {
    /// An empty registry; every provider resolves through the default scheme.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry of template providers from configuration.
    pub fn from_config(providers: &BTreeMap<String, ProviderConfig>) -> Self {
        let mut registry = Self::new();
        for (name, config) in providers {
            registry.register(Arc::new(TemplateProvider::new(name.clone(), config.clone())));
        }
        registry
    }

    /// Registers (or replaces) a provider under its own name.
    pub fn register(&mut self, provider: Arc<dyn LicenseProvider>) {
        self.providers
            .insert(ProviderName::from(provider.name()), provider);
    }

    /// Returns true if `provider` has vendor-specific naming.
    pub fn is_registered(&self, provider: &ProviderName) -> bool {
        self.providers.contains_key(provider)
    }

    /// Resolves storage names for `plugin` under `provider`, falling back
    /// to the default scheme for unknown providers.
    pub fn resolve(&self, provider: &ProviderName, plugin: &PluginId) -> StorageNames {
        match self.providers.get(provider) {
            Some(p) => p.storage_names(plugin),
            None => self.fallback.storage_names(plugin),
        }
    }

    /// Resolves storage names when no provider is known.
    pub fn resolve_default(&self, plugin: &PluginId) -> StorageNames {
        self.fallback.storage_names(plugin)
    }
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut names: Vec<&str> = self.providers.keys().map(ProviderName::as_str).collect();
        names.sort_unstable();
        f.debug_struct("ProviderRegistry")
            .field("providers", &names)
            .finish()
    }
}

//! License lifecycle management for third-party plugins.
//!
//! This module handles:
//! - Resolving where each plugin's license material is stored, per provider
//! - Talking to the remote licensing authority (provision, activate, status)
//! - Orchestrating the lifecycle on top of the encrypted record store
//!
//! # Design Principles
//!
//! - **Remote truth**: validity is never computed locally; the authority decides
//! - **Fail closed**: any doubt in [`LicenseManager::check_license_status`] means invalid
//! - **Minimal remote traffic**: stored licenses are reused while still valid
//! - **Corruption is loud**: unreadable records surface as [`LicenseError::Decryption`]
//!
//! # Concurrency
//!
//! The storage map is replaced in full on every write. Concurrent writers
//! race unless a [`MapLock`] is installed with [`LicenseManager::with_lock`].

mod api;
mod config;
mod error;
mod lock;
mod manager;
mod provider;

pub use api::{HttpLicensingApi, LicensingApi, ProvisionResponse, StorageMapOverrides};
pub use config::{
    DEFAULT_API_BASE_URL, DEFAULT_TIMEOUT_SECS, LicensingConfig, ProviderConfig, SiteIdentity,
};
pub use error::{LicenseError, LicenseResult};
pub use lock::{MapLock, MapLockGuard, ProcessMapLock, Unguarded};
pub use manager::{LicenseManager, ProvisionedLicense};
pub use provider::{
    DEFAULT_PROVIDER, DefaultProvider, LicenseProvider, ProviderRegistry, TemplateProvider,
    plugin_slug,
};

//! Core type definitions for the plugin license service.
//!
//! This crate defines the plain data shared by every layer:
//! - Opaque identifiers (plugin, provider, license id, activation key)
//! - The storage map and its entries
//! - Remote license status
//!
//! Nothing here talks to storage or the network.

mod ids;
mod status;
mod storage;

pub use ids::{ActivationKey, LicenseId, PluginId, ProviderName};
pub use status::{LicenseState, LicenseStatus};
pub use storage::{StorageMap, StorageMapEntry, StorageMethod, StorageNames};

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("unknown license status: {0}")]
    UnknownStatus(String),
}

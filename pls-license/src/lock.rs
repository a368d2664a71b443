//! Hook around storage-map read-modify-write.
//!
//! The storage map is one blob replaced in full on every write. Without a
//! guard, two concurrent writers race and the last one silently discards the
//! other's update. [`Unguarded`] keeps that behavior. Hosts that need
//! exclusion plug in a [`MapLock`]: [`ProcessMapLock`] for a single process,
//! or their own implementation backed by whatever their store offers.

use async_trait::async_trait;
use pls_types::PluginId;
use std::sync::Arc;
use tokio::sync::Mutex;

/// Held for the duration of one read-modify-write. Dropping it releases.
pub type MapLockGuard = Box<dyn Send>;

/// Mutual exclusion for storage-map writers.
#[async_trait]
pub trait MapLock: Send + Sync {
    /// Waits until the caller may modify the entry for `plugin`.
    async fn acquire(&self, plugin: &PluginId) -> MapLockGuard;
}

/// No exclusion: concurrent writers race and the last writer wins.
#[derive(Debug, Clone, Copy, Default)]
pub struct Unguarded;

#[async_trait]
impl MapLock for Unguarded {
    async fn acquire(&self, _plugin: &PluginId) -> MapLockGuard {
        Box::new(())
    }
}

/// Serializes every writer within this process.
///
/// All plugins share one blob, so the lock is not keyed by plugin.
#[derive(Debug, Clone, Default)]
pub struct ProcessMapLock {
    inner: Arc<Mutex<()>>,
}

impl ProcessMapLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl MapLock for ProcessMapLock {
    async fn acquire(&self, _plugin: &PluginId) -> MapLockGuard {
        Box::new(self.inner.clone().lock_owned().await)
    }
}

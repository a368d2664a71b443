//! Shared test helpers for license tests.

#![allow(dead_code)]

use async_trait::async_trait;
use pls_crypto::{EncryptionCodec, SecretCodec, StorageKey};
use pls_license::{
    LicenseError, LicenseManager, LicenseResult, LicensingApi, ProviderRegistry,
    ProvisionResponse, SiteIdentity,
};
use pls_store::{KeyValueStore, LicenseRecordStore, MemoryStore};
use pls_types::{ActivationKey, LicenseId, LicenseStatus, PluginId, ProviderName};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Notify;

/// A canned answer from the fake authority. Errors are rebuilt on every call.
#[derive(Debug, Clone)]
pub enum Reply<T> {
    Ok(T),
    Transport,
    Malformed,
    Rejected(u16),
}

impl<T: Clone> Reply<T> {
    fn produce(&self) -> LicenseResult<T> {
        match self {
            Reply::Ok(value) => Ok(value.clone()),
            Reply::Transport => Err(LicenseError::Transport("connection refused".into())),
            Reply::Malformed => Err(LicenseError::UnexpectedResponseFormat(
                "missing field".into(),
            )),
            Reply::Rejected(status) => Err(LicenseError::RemoteRejected {
                status: *status,
                message: "rejected".into(),
            }),
        }
    }
}

/// Pauses a fake provisioning call until the test releases it.
#[derive(Default)]
pub struct Gate {
    pub entered: Notify,
    pub release: Notify,
}

/// In-process stand-in for the licensing authority.
pub struct FakeApi {
    provision_reply: Mutex<Reply<ProvisionResponse>>,
    activate_reply: Mutex<Reply<ActivationKey>>,
    status_reply: Mutex<Reply<LicenseStatus>>,
    provision_calls: AtomicUsize,
    activate_calls: AtomicUsize,
    status_calls: AtomicUsize,
    status_handles: Mutex<Vec<String>>,
    gate: Option<Arc<Gate>>,
}

impl FakeApi {
    /// Provisions `L1`, activates with `AK1`, and reports every key valid.
    pub fn new() -> Self {
        Self {
            provision_reply: Mutex::new(Reply::Ok(provision_response(
                "L1",
                "https://cdn/x.zip",
                Some("acme-plugin/acme-plugin.php"),
            ))),
            activate_reply: Mutex::new(Reply::Ok(ActivationKey::from("AK1"))),
            status_reply: Mutex::new(Reply::Ok(LicenseStatus::Validity { valid: true })),
            provision_calls: AtomicUsize::new(0),
            activate_calls: AtomicUsize::new(0),
            status_calls: AtomicUsize::new(0),
            status_handles: Mutex::new(Vec::new()),
            gate: None,
        }
    }

    pub fn gated(gate: Arc<Gate>) -> Self {
        Self {
            gate: Some(gate),
            ..Self::new()
        }
    }

    pub fn set_provision(&self, reply: Reply<ProvisionResponse>) {
        *self.provision_reply.lock().unwrap() = reply;
    }

    pub fn set_activate(&self, reply: Reply<ActivationKey>) {
        *self.activate_reply.lock().unwrap() = reply;
    }

    pub fn set_status(&self, reply: Reply<LicenseStatus>) {
        *self.status_reply.lock().unwrap() = reply;
    }

    pub fn provision_calls(&self) -> usize {
        self.provision_calls.load(Ordering::SeqCst)
    }

    pub fn activate_calls(&self) -> usize {
        self.activate_calls.load(Ordering::SeqCst)
    }

    pub fn status_calls(&self) -> usize {
        self.status_calls.load(Ordering::SeqCst)
    }

    /// Handles passed to `status`, in call order.
    pub fn status_handles(&self) -> Vec<String> {
        self.status_handles.lock().unwrap().clone()
    }
}

#[async_trait]
impl LicensingApi for FakeApi {
    async fn provision(
        &self,
        _plugin: &PluginId,
        _provider: &ProviderName,
    ) -> LicenseResult<ProvisionResponse> {
        self.provision_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(gate) = &self.gate {
            gate.entered.notify_one();
            gate.release.notified().await;
        }
        let reply = self.provision_reply.lock().unwrap().clone();
        reply.produce()
    }

    async fn activate(
        &self,
        _license_id: &LicenseId,
        _site: &SiteIdentity,
    ) -> LicenseResult<ActivationKey> {
        self.activate_calls.fetch_add(1, Ordering::SeqCst);
        let reply = self.activate_reply.lock().unwrap().clone();
        reply.produce()
    }

    async fn status(&self, handle: &str) -> LicenseResult<LicenseStatus> {
        self.status_calls.fetch_add(1, Ordering::SeqCst);
        self.status_handles.lock().unwrap().push(handle.to_string());
        let reply = self.status_reply.lock().unwrap().clone();
        reply.produce()
    }
}

pub fn provision_response(
    license_id: &str,
    download_url: &str,
    basename: Option<&str>,
) -> ProvisionResponse {
    ProvisionResponse {
        license_id: LicenseId::from(license_id),
        download_url: download_url.to_string(),
        basename: basename.map(str::to_string),
        storage_map: None,
    }
}

pub fn test_codec() -> Arc<dyn EncryptionCodec> {
    Arc::new(SecretCodec::from_key(StorageKey::random()))
}

pub fn site() -> SiteIdentity {
    SiteIdentity {
        domain_name: "shop.example".to_string(),
        email: "admin@shop.example".to_string(),
    }
}

/// A manager over in-memory storage and a fake authority.
pub struct Harness {
    pub kv: Arc<MemoryStore>,
    pub codec: Arc<dyn EncryptionCodec>,
    pub api: Arc<FakeApi>,
    pub manager: LicenseManager,
}

impl Harness {
    pub fn records(&self) -> &LicenseRecordStore {
        self.manager.records()
    }
}

pub fn harness() -> Harness {
    harness_with(FakeApi::new(), ProviderRegistry::new())
}

pub fn harness_with(api: FakeApi, providers: ProviderRegistry) -> Harness {
    let kv = Arc::new(MemoryStore::new());
    let codec = test_codec();
    let api = Arc::new(api);
    let manager = manager_over(kv.clone(), codec.clone(), api.clone(), providers);
    Harness {
        kv,
        codec,
        api,
        manager,
    }
}

/// A manager sharing an existing backend and codec.
pub fn manager_over(
    kv: Arc<MemoryStore>,
    codec: Arc<dyn EncryptionCodec>,
    api: Arc<FakeApi>,
    providers: ProviderRegistry,
) -> LicenseManager {
    let records = LicenseRecordStore::new(kv as Arc<dyn KeyValueStore>, codec);
    LicenseManager::new(records, providers, api as Arc<dyn LicensingApi>, site())
}

pub fn plugin(id: &str) -> PluginId {
    PluginId::from(id)
}

pub fn provider(name: &str) -> ProviderName {
    ProviderName::from(name)
}

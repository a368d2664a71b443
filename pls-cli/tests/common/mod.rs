//! Shared test helpers for the command and HTTP surface.

#![allow(dead_code)]

use pls_crypto::PassthroughCodec;
use pls_license::{LicenseManager, LicensingConfig, ProcessMapLock, SiteIdentity};
use pls_store::MemoryStore;
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// A mock authority that provisions `L1`, activates with `AK1`, and reports
/// `AK1` valid.
pub async fn authority() -> MockServer {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/sites/v2/pls/license"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "license_id": "L1",
            "download_url": "https://cdn/x.zip",
            "basename": "acme-plugin/acme-plugin.php"
        })))
        .mount(&server)
        .await;

    Mock::given(method("POST"))
        .and(path("/license/L1/activate"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "data": { "activation_key": "AK1" }
        })))
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/license/AK1/status"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({ "data": { "valid": true } })),
        )
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/license/L1/status"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "new" })))
        .mount(&server)
        .await;

    server
}

/// A manager over in-memory storage talking to `base_url`.
pub fn manager_for(base_url: String) -> LicenseManager {
    let config = LicensingConfig {
        api_base_url: base_url,
        timeout_secs: 2,
        site: SiteIdentity {
            domain_name: "shop.example".to_string(),
            email: "admin@shop.example".to_string(),
        },
        ..Default::default()
    };
    LicenseManager::from_config(&config, Arc::new(MemoryStore::new()), Arc::new(PassthroughCodec))
        .unwrap()
        .with_lock(Arc::new(ProcessMapLock::new()))
}

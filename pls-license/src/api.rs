//! Client for the remote licensing authority.
//!
//! Three endpoints, all relative to the configured base URL:
//!
//! | Operation | Request |
//! |---|---|
//! | provision | `POST /sites/v2/pls/license` with `{pluginSlug, providerName}` |
//! | activate | `POST /license/{licenseId}/activate` with `{domain_name, email}` |
//! | status | `GET /license/{handle}/status` |
//!
//! Every call uses the fixed timeout from configuration and is attempted
//! exactly once. Retry policy belongs to the caller.

use crate::config::{LicensingConfig, SiteIdentity};
use crate::error::{LicenseError, LicenseResult};
use async_trait::async_trait;
use pls_types::{
    ActivationKey, LicenseId, LicenseState, LicenseStatus, PluginId, ProviderName, StorageMethod,
    StorageNames,
};
use reqwest::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Storage names the authority may dictate for a provisioned license.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageMapOverrides {
    #[serde(default, alias = "licenseIdStorageName")]
    pub license_id_storage_name: Option<String>,
    #[serde(default, alias = "activationKeyStorageName")]
    pub activation_key_storage_name: Option<String>,
    #[serde(default, alias = "storageMethod")]
    pub storage_method: Option<StorageMethod>,
}

impl StorageMapOverrides {
    /// Returns `names` with every overridden field replaced.
    pub fn apply(&self, names: StorageNames) -> StorageNames {
        StorageNames {
            license_id: self
                .license_id_storage_name
                .clone()
                .unwrap_or(names.license_id),
            activation_key: self
                .activation_key_storage_name
                .clone()
                .unwrap_or(names.activation_key),
            storage_method: self.storage_method.unwrap_or(names.storage_method),
        }
    }
}

/// A successful provisioning answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProvisionResponse {
    pub license_id: LicenseId,
    pub download_url: String,
    pub basename: Option<String>,
    pub storage_map: Option<StorageMapOverrides>,
}

/// Operations offered by the licensing authority.
#[async_trait]
pub trait LicensingApi: Send + Sync {
    /// Requests a new license for `plugin` under `provider`.
    async fn provision(
        &self,
        plugin: &PluginId,
        provider: &ProviderName,
    ) -> LicenseResult<ProvisionResponse>;

    /// Activates `license_id` for this installation.
    async fn activate(
        &self,
        license_id: &LicenseId,
        site: &SiteIdentity,
    ) -> LicenseResult<ActivationKey>;

    /// Reports the status of an activation key or license id.
    async fn status(&self, handle: &str) -> LicenseResult<LicenseStatus>;
}

/// [`LicensingApi`] over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpLicensingApi {
    client: Client,
    base_url: String,
    token: Option<String>,
}

impl HttpLicensingApi {
    /// Builds the client once, with the configured timeout.
    pub fn new(config: &LicensingConfig) -> LicenseResult<Self> {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| LicenseError::Config(format!("http client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            token: config.api_token.clone(),
        })
    }

    /// The base URL requests are sent to.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn license_url(&self, handle: &str, action: &str) -> String {
        format!(
            "{}/license/{}/{action}",
            self.base_url,
            urlencoding::encode(handle)
        )
    }

    async fn send(&self, builder: RequestBuilder, operation: &str) -> LicenseResult<Value> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| LicenseError::Transport(format!("{operation} request failed: {e}")))?;
        read_json(response, operation).await
    }
}

#[async_trait]
impl LicensingApi for HttpLicensingApi {
    async fn provision(
        &self,
        plugin: &PluginId,
        provider: &ProviderName,
    ) -> LicenseResult<ProvisionResponse> {
        debug!(plugin = %plugin, provider = %provider, "requesting license provisioning");

        let request = self
            .client
            .post(format!("{}/sites/v2/pls/license", self.base_url))
            .json(&json!({
                "pluginSlug": plugin.as_str(),
                "providerName": provider.as_str(),
            }));
        let body = self.send(request, "provision").await?;
        let response = parse_provision(&body)?;

        debug!(plugin = %plugin, license_id = %response.license_id, "license provisioned remotely");
        Ok(response)
    }

    async fn activate(
        &self,
        license_id: &LicenseId,
        site: &SiteIdentity,
    ) -> LicenseResult<ActivationKey> {
        debug!(license_id = %license_id, domain = %site.domain_name, "requesting activation");

        let request = self
            .client
            .post(self.license_url(license_id.as_str(), "activate"))
            .json(&json!({
                "domain_name": site.domain_name,
                "email": site.email,
            }));
        let body = self.send(request, "activate").await?;

        body.get("data")
            .and_then(|data| data.get("activation_key"))
            .and_then(Value::as_str)
            .filter(|key| !key.is_empty())
            .map(ActivationKey::from)
            .ok_or_else(|| missing_field("activate", "data.activation_key"))
    }

    async fn status(&self, handle: &str) -> LicenseResult<LicenseStatus> {
        let request = self.client.get(self.license_url(handle, "status"));
        let body = self.send(request, "status").await?;
        let status = parse_status(&body)?;

        debug!(%status, "license status received");
        Ok(status)
    }
}

async fn read_json(response: Response, operation: &str) -> LicenseResult<Value> {
    let status = response.status();
    let body = response
        .text()
        .await
        .map_err(|e| LicenseError::Transport(format!("{operation}: failed to read body: {e}")))?;

    if !status.is_success() {
        let message = rejection_message(&body);
        warn!(
            operation,
            status = status.as_u16(),
            %message,
            "licensing authority rejected request"
        );
        return Err(LicenseError::RemoteRejected {
            status: status.as_u16(),
            message,
        });
    }

    serde_json::from_str(&body).map_err(|e| {
        LicenseError::UnexpectedResponseFormat(format!("{operation}: body is not JSON: {e}"))
    })
}

fn rejection_message(body: &str) -> String {
    let from_json = serde_json::from_str::<Value>(body).ok().and_then(|v| {
        v.get("message")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    from_json.unwrap_or_else(|| match body.trim() {
        "" => "empty response body".to_string(),
        text => text.to_string(),
    })
}

fn missing_field(operation: &str, field: &str) -> LicenseError {
    LicenseError::UnexpectedResponseFormat(format!("{operation}: missing {field}"))
}

fn parse_provision(body: &Value) -> LicenseResult<ProvisionResponse> {
    let license_id = match body.get("license_id") {
        Some(Value::String(id)) if !id.is_empty() => id.clone(),
        Some(Value::Number(id)) => id.to_string(),
        _ => return Err(missing_field("provision", "license_id")),
    };

    let download_url = body
        .get("download_url")
        .and_then(Value::as_str)
        .filter(|url| !url.is_empty())
        .ok_or_else(|| missing_field("provision", "download_url"))?
        .to_string();

    let basename = body
        .get("basename")
        .and_then(Value::as_str)
        .filter(|name| !name.is_empty())
        .map(str::to_string);

    // Some revisions send an empty list instead of omitting the field.
    let storage_map = match body.get("storage_map") {
        None | Some(Value::Null) => None,
        Some(Value::Array(items)) if items.is_empty() => None,
        Some(overrides @ Value::Object(_)) => Some(
            serde_json::from_value::<StorageMapOverrides>(overrides.clone()).map_err(|e| {
                LicenseError::UnexpectedResponseFormat(format!(
                    "provision: invalid storage_map: {e}"
                ))
            })?,
        ),
        Some(other) => {
            return Err(LicenseError::UnexpectedResponseFormat(format!(
                "provision: storage_map must be an object, got {other}"
            )));
        }
    };

    Ok(ProvisionResponse {
        license_id: LicenseId::from(license_id),
        download_url,
        basename,
        storage_map,
    })
}

fn parse_status(body: &Value) -> LicenseResult<LicenseStatus> {
    let data = body.get("data");

    if let Some(valid) = data.and_then(|d| d.get("valid")) {
        return valid
            .as_bool()
            .map(|valid| LicenseStatus::Validity { valid })
            .ok_or_else(|| {
                LicenseError::UnexpectedResponseFormat(format!(
                    "status: data.valid is not a boolean: {valid}"
                ))
            });
    }

    let state = body
        .get("status")
        .or_else(|| data.and_then(|d| d.get("status")))
        .and_then(Value::as_str)
        .ok_or_else(|| missing_field("status", "data.valid or status"))?;

    state
        .parse::<LicenseState>()
        .map(|status| LicenseStatus::State { status })
        .map_err(|e| LicenseError::UnexpectedResponseFormat(format!("status: {e}")))
}

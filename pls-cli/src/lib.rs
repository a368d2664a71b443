//! Command and HTTP surface for the plugin license service.
//!
//! Both surfaces are thin pass-throughs to [`LicenseManager`]: they parse
//! a plugin id (and provider), call one lifecycle operation, and render
//! the result or the error.

use axum::{
    Router,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Json, Response},
    routing::{get, post},
};
use clap::Subcommand;
use pls_license::{
    DEFAULT_PROVIDER, LicenseError, LicenseManager, LicenseResult, ProvisionedLicense,
};
use pls_types::{ActivationKey, LicenseStatus, PluginId, ProviderName};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, warn};

/// Namespace every HTTP route lives under.
pub const API_PREFIX: &str = "/newfold-pls/v1";

/// The license operations shared by the command line and the HTTP API.
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Operation {
    /// Provision a license for a plugin
    Provision {
        /// Plugin identifier
        plugin: String,
        /// Licensing provider
        #[arg(long, default_value = DEFAULT_PROVIDER)]
        provider: String,
    },
    /// Activate the provisioned license for a plugin
    Activate {
        /// Plugin identifier
        plugin: String,
    },
    /// Show the license status reported by the licensing authority
    Status {
        /// Plugin identifier
        plugin: String,
    },
    /// Check whether a plugin's license is valid (fails closed)
    Check {
        /// Plugin identifier
        plugin: String,
    },
}

/// Runs one operation and renders its success line.
pub async fn execute(manager: &LicenseManager, operation: &Operation) -> LicenseResult<String> {
    match operation {
        Operation::Provision { plugin, provider } => {
            let license = manager
                .provision(
                    &PluginId::from(plugin.as_str()),
                    &ProviderName::from(provider.as_str()),
                )
                .await?;
            Ok(format!("License provisioned: {}", serde_json::to_string(&license)?))
        }
        Operation::Activate { plugin } => {
            let activation_key = manager.activate(&PluginId::from(plugin.as_str())).await?;
            let body = ActivationResponse { activation_key };
            Ok(format!("License activated: {}", serde_json::to_string(&body)?))
        }
        Operation::Status { plugin } => {
            let status = manager.status(&PluginId::from(plugin.as_str())).await?;
            Ok(format!("License status: {}", serde_json::to_string(&status)?))
        }
        Operation::Check { plugin } => {
            let valid = manager
                .check_license_status(Some(&PluginId::from(plugin.as_str())), None)
                .await;
            Ok(format!("License valid: {valid}"))
        }
    }
}

// ── HTTP ─────────────────────────────────────────────────────────

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProvisionRequest {
    pub plugin_slug: PluginId,
    #[serde(default)]
    pub provider_name: Option<ProviderName>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PluginRequest {
    pub plugin_slug: PluginId,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ActivationResponse {
    pub activation_key: ActivationKey,
}

/// JSON body of every failed request.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

/// A [`LicenseError`] rendered as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub LicenseError);

impl From<LicenseError> for ApiError {
    fn from(err: LicenseError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            LicenseError::NotFound(_) => StatusCode::NOT_FOUND,
            e if e.is_remote() => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(code = self.0.code(), "request failed: {}", self.0);
        } else {
            warn!(code = self.0.code(), "request failed: {}", self.0);
        }

        let body = ErrorBody {
            code: self.0.code().to_string(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

async fn provision_handler(
    State(manager): State<Arc<LicenseManager>>,
    Json(request): Json<ProvisionRequest>,
) -> Result<Json<ProvisionedLicense>, ApiError> {
    let provider = request
        .provider_name
        .unwrap_or_else(|| ProviderName::from(DEFAULT_PROVIDER));
    let license = manager.provision(&request.plugin_slug, &provider).await?;
    Ok(Json(license))
}

async fn activate_handler(
    State(manager): State<Arc<LicenseManager>>,
    Json(request): Json<PluginRequest>,
) -> Result<Json<ActivationResponse>, ApiError> {
    let activation_key = manager.activate(&request.plugin_slug).await?;
    Ok(Json(ActivationResponse { activation_key }))
}

async fn status_handler(
    State(manager): State<Arc<LicenseManager>>,
    Query(request): Query<PluginRequest>,
) -> Result<Json<LicenseStatus>, ApiError> {
    let status = manager.status(&request.plugin_slug).await?;
    Ok(Json(status))
}

/// Build the HTTP API router over `manager`.
pub fn build_router(manager: Arc<LicenseManager>) -> Router {
    let routes = Router::new()
        .route("/license", post(provision_handler))
        .route("/license/activate", post(activate_handler))
        .route("/license/status", get(status_handler));

    Router::new().nest(API_PREFIX, routes).with_state(manager)
}

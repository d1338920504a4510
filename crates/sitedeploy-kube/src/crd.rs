//! `Webapp` custom resource
//!
//! One `Webapp` describes one destination container and the version that
//! should be published to it. Its status records the last reconcile.

use chrono::{SecondsFormat, Utc};
use kube::CustomResource;
use kube::CustomResourceExt;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use sitedeploy_core::request::{
    DEFAULT_CONTAINER, DEFAULT_MARKER_FILE, DEFAULT_PACKAGE_CONTAINER, DEFAULT_TAG_KEY,
};
use sitedeploy_core::{CredentialRef, DeploymentOutcome, DeploymentRequest};

use crate::error::Result;

fn default_container() -> String {
    DEFAULT_CONTAINER.to_string()
}

fn default_marker_file() -> String {
    DEFAULT_MARKER_FILE.to_string()
}

fn default_tag_key() -> String {
    DEFAULT_TAG_KEY.to_string()
}

fn default_package_container() -> String {
    DEFAULT_PACKAGE_CONTAINER.to_string()
}

/// Desired state of a published static site
#[derive(CustomResource, Clone, Debug, PartialEq, Deserialize, Serialize, JsonSchema)]
#[kube(
    group = "sitedeploy.io",
    version = "v1alpha1",
    kind = "Webapp",
    plural = "webapps",
    namespaced,
    status = "WebappStatus",
    printcolumn = r#"{"name":"Status","type":"string","jsonPath":".status.status","description":"Result of the last reconcile"}"#,
    printcolumn = r#"{"name":"Deployed","type":"string","jsonPath":".status.deployed-version","description":"Version currently published"}"#,
    printcolumn = r#"{"name":"Desired","type":"string","jsonPath":".spec.versionToDeploy","description":"Version to publish"}"#,
    printcolumn = r#"{"name":"Error","type":"string","jsonPath":".status.error","description":"Error of the last reconcile"}"#
)]
#[serde(rename_all = "camelCase")]
pub struct WebappSpec {
    pub azure_tenant_id: String,
    pub azure_spn_id: String,
    pub azure_spn_secret: String,

    /// Destination storage account
    pub storage_name: String,

    #[serde(default = "default_container")]
    pub container_name: String,

    /// Marker object carrying the version tag
    #[serde(default = "default_marker_file")]
    pub filename_to_check: String,

    #[serde(default = "default_tag_key")]
    pub blob_tag_key: String,

    pub version_to_deploy: String,

    /// Storage account holding `{version}.zip` packages
    pub package_storage_name: String,

    #[serde(default = "default_package_container")]
    pub package_container_name: String,
}

impl WebappSpec {
    pub fn to_request(&self) -> DeploymentRequest {
        DeploymentRequest::new(
            CredentialRef::new(
                &self.azure_tenant_id,
                &self.azure_spn_id,
                &self.azure_spn_secret,
            ),
            &self.storage_name,
            &self.version_to_deploy,
            &self.package_storage_name,
        )
        .with_container(&self.container_name)
        .with_marker_file(&self.filename_to_check)
        .with_tag_key(&self.blob_tag_key)
        .with_package_container(&self.package_container_name)
    }
}

/// Status values written by the controller
pub mod status {
    pub const SKIPPED: &str = "SKIPPED";
    pub const SUCCESS: &str = "SUCCESS";
    pub const FAILED: &str = "FAILED";
    pub const INVALID: &str = "INVALID";
}

/// Observed state, a serialization of the last `DeploymentOutcome`
#[derive(Clone, Debug, Default, PartialEq, Deserialize, Serialize, JsonSchema)]
pub struct WebappStatus {
    #[serde(default)]
    pub status: String,

    #[serde(default, rename = "deployed-version")]
    pub deployed_version: String,

    #[serde(default)]
    pub error: String,

    #[serde(default, rename = "last-update")]
    pub last_update: String,
}

impl WebappStatus {
    /// Status after an attempt
    ///
    /// A failed attempt does not know what is published, so the previously
    /// recorded version is kept.
    pub fn from_outcome(outcome: &DeploymentOutcome, previous: Option<&WebappStatus>) -> Self {
        let deployed_version = match &outcome.resulting_version {
            Some(version) => version.clone(),
            None => previous
                .map(|p| p.deployed_version.clone())
                .unwrap_or_default(),
        };

        Self {
            status: outcome.status.as_str().to_uppercase(),
            deployed_version,
            error: outcome
                .error
                .as_ref()
                .map(|e| format!("{}: {}", e.kind, e.message))
                .unwrap_or_default(),
            last_update: outcome
                .finished_at
                .to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    /// Status for a spec that cannot be turned into a request
    pub fn invalid(message: impl Into<String>, previous: Option<&WebappStatus>) -> Self {
        Self {
            status: status::INVALID.to_string(),
            deployed_version: previous
                .map(|p| p.deployed_version.clone())
                .unwrap_or_default(),
            error: message.into(),
            last_update: Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
        }
    }

    pub fn is_failed(&self) -> bool {
        self.status == status::FAILED || self.status == status::INVALID
    }
}

/// CustomResourceDefinition manifest for `Webapp`, as YAML
pub fn crd_yaml() -> Result<String> {
    Ok(serde_yaml::to_string(&Webapp::crd())?)
}

//! Shared command-line arguments
//!
//! Every deployment parameter can come from a flag, a `SITEDEPLOY_*`
//! environment variable or a `--config` YAML file. Flags and environment
//! variables override the file.

use clap::Args;
use std::path::PathBuf;

use sitedeploy_core::{BlobEndpoint, CoreError, CredentialRef, DeploymentRequest};
use sitedeploy_store::{AzureBlobStore, ClientSecretCredential, StaticTokenCredential};

use crate::error::{CliError, Result};

/// Parameters that make up a `DeploymentRequest`
#[derive(Args, Debug, Clone, Default)]
pub struct RequestArgs {
    /// YAML file with the deployment parameters
    #[arg(long, env = "SITEDEPLOY_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory (tenant) id of the service principal
    #[arg(long, env = "SITEDEPLOY_TENANT_ID")]
    pub tenant_id: Option<String>,

    /// Application (client) id of the service principal
    #[arg(long, env = "SITEDEPLOY_CLIENT_ID")]
    pub client_id: Option<String>,

    /// Client secret of the service principal
    #[arg(long, env = "SITEDEPLOY_CLIENT_SECRET", hide_env_values = true)]
    pub client_secret: Option<String>,

    /// Destination storage account
    #[arg(long, env = "SITEDEPLOY_STORAGE_NAME")]
    pub storage_name: Option<String>,

    /// Destination container [default: $web]
    #[arg(long, env = "SITEDEPLOY_CONTAINER_NAME")]
    pub container_name: Option<String>,

    /// Marker object whose tag holds the published version [default: index.html]
    #[arg(long, env = "SITEDEPLOY_MARKER_FILE")]
    pub marker_file: Option<String>,

    /// Tag key holding the version [default: version]
    #[arg(long, env = "SITEDEPLOY_TAG_KEY")]
    pub tag_key: Option<String>,

    /// Version to deploy
    #[arg(long, env = "SITEDEPLOY_VERSION")]
    pub desired_version: Option<String>,

    /// Storage account holding the packages
    #[arg(long, env = "SITEDEPLOY_PACKAGE_STORAGE_NAME")]
    pub package_storage_name: Option<String>,

    /// Container holding the packages [default: packages]
    #[arg(long, env = "SITEDEPLOY_PACKAGE_CONTAINER_NAME")]
    pub package_container_name: Option<String>,
}

impl RequestArgs {
    /// Build the request: file first, then flag overrides
    pub fn to_request(&self) -> Result<DeploymentRequest> {
        let base = match &self.config {
            Some(path) => DeploymentRequest::load_from(path)?,
            None => DeploymentRequest::default(),
        };

        let credential = base.credential().clone();
        let credential = CredentialRef::new(
            self.tenant_id.clone().unwrap_or(credential.tenant_id),
            self.client_id.clone().unwrap_or(credential.client_id),
            self.client_secret.clone().unwrap_or(credential.client_secret),
        );

        let mut request = base.with_credential(credential);
        if let Some(storage_name) = &self.storage_name {
            request = request.with_storage_account(storage_name);
        }
        if let Some(container_name) = &self.container_name {
            request = request.with_container(container_name);
        }
        if let Some(marker_file) = &self.marker_file {
            request = request.with_marker_file(marker_file);
        }
        if let Some(tag_key) = &self.tag_key {
            request = request.with_tag_key(tag_key);
        }
        if let Some(version) = &self.desired_version {
            request = request.with_desired_version(version);
        }
        if let Some(package_storage_name) = &self.package_storage_name {
            request = request.with_package_account(package_storage_name);
        }
        if let Some(package_container_name) = &self.package_container_name {
            request = request.with_package_container(package_container_name);
        }

        Ok(request)
    }
}

/// How to reach and authenticate against blob storage
#[derive(Args, Debug, Clone, Default)]
pub struct StoreArgs {
    /// Bearer token for blob storage; skips the client-secret exchange
    #[arg(long, env = "SITEDEPLOY_ACCESS_TOKEN", hide_env_values = true)]
    pub access_token: Option<String>,

    /// Blob service DNS suffix (accounts are reached at https://{account}.{domain})
    #[arg(long, env = "SITEDEPLOY_ENDPOINT_DOMAIN", conflicts_with = "path_style_endpoint")]
    pub endpoint_domain: Option<String>,

    /// Blob service base URL with the account in the path (emulators)
    #[arg(long, env = "SITEDEPLOY_PATH_STYLE_ENDPOINT")]
    pub path_style_endpoint: Option<String>,

    /// Identity provider for the client-secret exchange
    #[arg(long, env = "SITEDEPLOY_AUTHORITY_HOST")]
    pub authority_host: Option<String>,
}

/// Parameters the identity provider needs; not required with an access token
const CREDENTIAL_FIELDS: [&str; 3] = ["TenantId", "SpnId", "SpnSecret"];

impl StoreArgs {
    pub fn endpoint(&self) -> BlobEndpoint {
        match (&self.path_style_endpoint, &self.endpoint_domain) {
            (Some(base_url), _) => BlobEndpoint::PathStyle {
                base_url: base_url.clone(),
            },
            (None, Some(domain)) => BlobEndpoint::Azure {
                domain: domain.clone(),
            },
            (None, None) => BlobEndpoint::default(),
        }
    }

    /// Blob store client for a request's credential
    pub fn store_for(&self, request: &DeploymentRequest) -> Result<AzureBlobStore> {
        let endpoint = self.endpoint();
        let store = match &self.access_token {
            Some(token) => AzureBlobStore::new(endpoint, StaticTokenCredential::new(token))?,
            None => {
                let mut credential = ClientSecretCredential::new(request.credential().clone())?;
                if let Some(host) = &self.authority_host {
                    credential = credential.with_authority_host(host);
                }
                AzureBlobStore::new(endpoint, credential)?
            }
        };
        Ok(store)
    }

    /// Check a request, leaving out parameters this invocation does not use
    pub fn check(&self, request: &DeploymentRequest, unused: &[&str]) -> Result<()> {
        let missing: Vec<&str> = request
            .missing_fields()
            .into_iter()
            .filter(|field| !unused.contains(field))
            .filter(|field| self.access_token.is_none() || !CREDENTIAL_FIELDS.contains(field))
            .collect();

        if !missing.is_empty() {
            return Err(CliError::input_with_help(
                format!("Missing required parameter(s): {}", missing.join(", ")),
                "Pass the parameters as flags, SITEDEPLOY_* environment variables or a --config file",
            ));
        }

        match request.validate() {
            Err(e @ CoreError::InvalidField { .. }) => Err(e.into()),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn full_args() -> RequestArgs {
        RequestArgs {
            tenant_id: Some("tenant".to_string()),
            client_id: Some("client".to_string()),
            client_secret: Some("secret".to_string()),
            storage_name: Some("mysite".to_string()),
            desired_version: Some("2.0.0".to_string()),
            package_storage_name: Some("mypackages".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn test_flags_build_request_with_defaults() {
        let request = full_args().to_request().unwrap();
        assert_eq!(request.container(), "$web");
        assert_eq!(request.marker_file(), "index.html");
        assert_eq!(request.package_container(), "packages");
        assert!(StoreArgs::default().check(&request, &[]).is_ok());
    }

    #[test]
    fn test_flags_override_config_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "storageAccount: fromfile\ncontainer: web\ndesiredVersion: 1.0.0\npackageAccount: pkgs"
        )
        .unwrap();

        let args = RequestArgs {
            config: Some(file.path().to_path_buf()),
            desired_version: Some("1.1.0".to_string()),
            tenant_id: Some("t".to_string()),
            ..Default::default()
        };
        let request = args.to_request().unwrap();

        assert_eq!(request.storage_account(), "fromfile");
        assert_eq!(request.container(), "web");
        assert_eq!(request.desired_version(), "1.1.0");
        assert_eq!(request.credential().tenant_id, "t");
    }

    #[test]
    fn test_check_reports_every_missing_parameter() {
        let request = RequestArgs::default().to_request().unwrap();
        let err = StoreArgs::default().check(&request, &[]).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid input: Missing required parameter(s): TenantId, SpnId, SpnSecret, StorageName, VersionToDeploy, PackageStorageName"
        );
    }

    #[test]
    fn test_access_token_replaces_credential_parameters() {
        let args = RequestArgs {
            storage_name: Some("mysite".to_string()),
            ..Default::default()
        };
        let store = StoreArgs {
            access_token: Some("token".to_string()),
            ..Default::default()
        };
        let request = args.to_request().unwrap();

        assert!(
            store
                .check(&request, &["VersionToDeploy", "PackageStorageName"])
                .is_ok()
        );
    }

    #[test]
    fn test_endpoint_selection() {
        let path_style = StoreArgs {
            path_style_endpoint: Some("http://127.0.0.1:10000".to_string()),
            ..Default::default()
        };
        assert_eq!(
            path_style.endpoint(),
            BlobEndpoint::PathStyle {
                base_url: "http://127.0.0.1:10000".to_string()
            }
        );
        assert_eq!(StoreArgs::default().endpoint(), BlobEndpoint::default());
    }
}

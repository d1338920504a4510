//! Deployment request - the full description of one deployment attempt
//!
//! A request is assembled by a caller (CLI flags, a YAML file or a `Webapp`
//! resource) and handed to the deployment engine by reference. It is never
//! modified after construction; every setter consumes and returns the request.

use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{CoreError, Result};
use crate::location::{BlobEndpoint, ContainerRef};

pub const DEFAULT_CONTAINER: &str = "$web";
pub const DEFAULT_MARKER_FILE: &str = "index.html";
pub const DEFAULT_TAG_KEY: &str = "version";
pub const DEFAULT_PACKAGE_CONTAINER: &str = "packages";

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

/// Identity used to obtain a storage credential from the identity provider
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct CredentialRef {
    pub tenant_id: String,
    pub client_id: String,
    pub client_secret: String,
}

impl CredentialRef {
    pub fn new(
        tenant_id: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: impl Into<String>,
    ) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            client_id: client_id.into(),
            client_secret: client_secret.into(),
        }
    }
}

impl std::fmt::Debug for CredentialRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialRef")
            .field("tenant_id", &self.tenant_id)
            .field("client_id", &self.client_id)
            .field("client_secret", &obfuscate(&self.client_secret))
            .finish()
    }
}

/// Everything needed to check and, if required, deploy one version
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentRequest {
    #[serde(default)]
    credential: CredentialRef,

    /// Destination storage account
    #[serde(default)]
    storage_account: String,

    /// Destination container
    #[serde(default = "default_container")]
    container: String,

    /// Object whose tags advertise the published version
    #[serde(default = "default_marker_file")]
    marker_file: String,

    /// Tag key holding the version on the marker object
    #[serde(default = "default_tag_key")]
    tag_key: String,

    #[serde(default)]
    desired_version: String,

    /// Storage account holding the packages
    #[serde(default)]
    package_account: String,

    #[serde(default = "default_package_container")]
    package_container: String,
}

impl DeploymentRequest {
    /// Create a request with default container, marker, tag key and package container
    pub fn new(
        credential: CredentialRef,
        storage_account: impl Into<String>,
        desired_version: impl Into<String>,
        package_account: impl Into<String>,
    ) -> Self {
        Self {
            credential,
            storage_account: storage_account.into(),
            container: default_container(),
            marker_file: default_marker_file(),
            tag_key: default_tag_key(),
            desired_version: desired_version.into(),
            package_account: package_account.into(),
            package_container: default_package_container(),
        }
    }

    /// Load a request from a YAML file
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn with_credential(mut self, credential: CredentialRef) -> Self {
        self.credential = credential;
        self
    }

    pub fn with_storage_account(mut self, storage_account: impl Into<String>) -> Self {
        self.storage_account = storage_account.into();
        self
    }

    pub fn with_desired_version(mut self, desired_version: impl Into<String>) -> Self {
        self.desired_version = desired_version.into();
        self
    }

    pub fn with_package_account(mut self, package_account: impl Into<String>) -> Self {
        self.package_account = package_account.into();
        self
    }

    pub fn with_container(mut self, container: impl Into<String>) -> Self {
        self.container = container.into();
        self
    }

    pub fn with_marker_file(mut self, marker_file: impl Into<String>) -> Self {
        self.marker_file = marker_file.into();
        self
    }

    pub fn with_tag_key(mut self, tag_key: impl Into<String>) -> Self {
        self.tag_key = tag_key.into();
        self
    }

    pub fn with_package_container(mut self, package_container: impl Into<String>) -> Self {
        self.package_container = package_container.into();
        self
    }

    pub fn credential(&self) -> &CredentialRef {
        &self.credential
    }

    pub fn storage_account(&self) -> &str {
        &self.storage_account
    }

    pub fn container(&self) -> &str {
        &self.container
    }

    pub fn marker_file(&self) -> &str {
        &self.marker_file
    }

    pub fn tag_key(&self) -> &str {
        &self.tag_key
    }

    pub fn desired_version(&self) -> &str {
        &self.desired_version
    }

    pub fn package_account(&self) -> &str {
        &self.package_account
    }

    pub fn package_container(&self) -> &str {
        &self.package_container
    }

    /// The destination container
    pub fn destination(&self) -> ContainerRef {
        ContainerRef::new(&self.storage_account, &self.container)
    }

    /// The container holding the versioned packages
    pub fn package_source(&self) -> ContainerRef {
        ContainerRef::new(&self.package_account, &self.package_container)
    }

    /// Name of the package object inside the package container
    pub fn package_object_name(&self) -> String {
        format!("{}.zip", self.desired_version)
    }

    /// URL prefix of the destination container
    pub fn storage_url(&self, endpoint: &BlobEndpoint) -> String {
        endpoint.container_url(&self.destination())
    }

    /// URL prefix of the package container
    pub fn package_url(&self, endpoint: &BlobEndpoint) -> String {
        endpoint.container_url(&self.package_source())
    }

    /// Full URL of the package archive for the desired version
    pub fn package_archive_url(&self, endpoint: &BlobEndpoint) -> String {
        format!("{}{}", self.package_url(endpoint), self.package_object_name())
    }

    /// Names of the required parameters left empty, in declaration order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let checks = [
            ("TenantId", &self.credential.tenant_id),
            ("SpnId", &self.credential.client_id),
            ("SpnSecret", &self.credential.client_secret),
            ("StorageName", &self.storage_account),
            ("ContainerName", &self.container),
            ("FileNameToCheck", &self.marker_file),
            ("BlobTagKey", &self.tag_key),
            ("VersionToDeploy", &self.desired_version),
            ("PackageContainerName", &self.package_container),
            ("PackageStorageName", &self.package_account),
        ];

        checks
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| *name)
            .collect()
    }

    /// Check that every required parameter is set
    ///
    /// All missing parameters are reported at once.
    pub fn validate(&self) -> Result<()> {
        let missing = self.missing_fields();
        if !missing.is_empty() {
            return Err(CoreError::MissingFields {
                fields: missing.into_iter().map(String::from).collect(),
            });
        }

        if self.desired_version.contains('/') {
            return Err(CoreError::InvalidField {
                field: "VersionToDeploy".to_string(),
                message: "a version cannot contain '/'".to_string(),
            });
        }

        Ok(())
    }
}

impl Default for DeploymentRequest {
    fn default() -> Self {
        Self::new(CredentialRef::default(), "", "", "")
    }
}

impl std::fmt::Display for DeploymentRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "TenantId: {}", self.credential.tenant_id)?;
        writeln!(f, "SpnId: {}", self.credential.client_id)?;
        writeln!(f, "SpnSecret: {}", obfuscate(&self.credential.client_secret))?;
        writeln!(f, "StorageName: {}", self.storage_account)?;
        writeln!(f, "ContainerName: {}", self.container)?;
        writeln!(f, "FileNameToCheck: {}", self.marker_file)?;
        writeln!(f, "BlobTagKey: {}", self.tag_key)?;
        writeln!(f, "PackageStorageName: {}", self.package_account)?;
        writeln!(f, "PackageContainerName: {}", self.package_container)?;
        write!(f, "VersionToDeploy: {}", self.desired_version)
    }
}

/// Mask a secret, keeping its first three characters
pub fn obfuscate(secret: &str) -> String {
    secret
        .chars()
        .enumerate()
        .map(|(i, c)| if i < 3 { c } else { '*' })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> DeploymentRequest {
        DeploymentRequest::new(
            CredentialRef::new("tenant", "client", "supersecret"),
            "mysite",
            "2.0.0",
            "mypackages",
        )
    }

    #[test]
    fn test_defaults() {
        let req = request();
        assert_eq!(req.container(), "$web");
        assert_eq!(req.marker_file(), "index.html");
        assert_eq!(req.tag_key(), "version");
        assert_eq!(req.package_container(), "packages");
    }

    #[test]
    fn test_package_archive_url() {
        let req = request();
        assert_eq!(req.package_object_name(), "2.0.0.zip");
        assert_eq!(
            req.package_archive_url(&BlobEndpoint::default()),
            "https://mypackages.blob.core.windows.net/packages/2.0.0.zip"
        );
        assert_eq!(
            req.storage_url(&BlobEndpoint::default()),
            "https://mysite.blob.core.windows.net/$web/"
        );
    }

    #[test]
    fn test_validate_reports_all_missing_fields() {
        let req = DeploymentRequest::new(CredentialRef::new("", "client", ""), "", "", "pkgs");
        match req.validate() {
            Err(CoreError::MissingFields { fields }) => {
                assert_eq!(
                    fields,
                    vec!["TenantId", "SpnSecret", "StorageName", "VersionToDeploy"]
                );
            }
            other => panic!("expected MissingFields, got {:?}", other),
        }
    }

    #[test]
    fn test_validate_ok() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_version_with_slash() {
        let req = DeploymentRequest::new(
            CredentialRef::new("t", "c", "s"),
            "site",
            "../1.0.0",
            "pkgs",
        );
        assert!(matches!(
            req.validate(),
            Err(CoreError::InvalidField { .. })
        ));
    }

    #[test]
    fn test_secret_never_displayed() {
        let req = request();
        let display = req.to_string();
        let debug = format!("{:?}", req);
        assert!(!display.contains("supersecret"));
        assert!(!debug.contains("supersecret"));
        assert!(display.contains("SpnSecret: sup********"));
    }

    #[test]
    fn test_obfuscate_short_secret() {
        assert_eq!(obfuscate("ab"), "ab");
        assert_eq!(obfuscate("abcd"), "abc*");
        assert_eq!(obfuscate(""), "");
    }

    #[test]
    fn test_from_yaml_applies_defaults() {
        let yaml = r#"
credential:
  tenantId: t
  clientId: c
  clientSecret: s
storageAccount: site
desiredVersion: 1.2.3
packageAccount: pkgs
markerFile: app.html
"#;
        let req = DeploymentRequest::from_yaml(yaml).unwrap();
        assert_eq!(req.container(), "$web");
        assert_eq!(req.marker_file(), "app.html");
        assert_eq!(req.desired_version(), "1.2.3");
        assert_eq!(req.package_container(), "packages");
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deploy.yaml");
        std::fs::write(
            &path,
            "credential: {tenantId: t, clientId: c, clientSecret: s}\nstorageAccount: site\ndesiredVersion: '3.0'\npackageAccount: pkgs\n",
        )
        .unwrap();
        let req = DeploymentRequest::load_from(&path).unwrap();
        assert_eq!(req.desired_version(), "3.0");
    }

    #[test]
    fn test_partial_yaml_completed_by_setters() {
        let req = DeploymentRequest::from_yaml("storageAccount: site\ncontainer: web\n").unwrap();
        assert_eq!(
            req.missing_fields(),
            vec!["TenantId", "SpnId", "SpnSecret", "VersionToDeploy", "PackageStorageName"]
        );

        let req = req
            .with_credential(CredentialRef::new("t", "c", "s"))
            .with_desired_version("4.0.0")
            .with_package_account("pkgs");
        assert!(req.validate().is_ok());
        assert_eq!(req.container(), "web");
    }
}

//! Addressing of blob containers
//!
//! A container is always named together with the storage account that owns it.
//! How an account maps to a base URL is decided by the [`BlobEndpoint`].

use serde::{Deserialize, Serialize};

/// Public Azure blob service domain
pub const DEFAULT_BLOB_DOMAIN: &str = "blob.core.windows.net";

/// A container under a storage account
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContainerRef {
    pub account: String,
    pub container: String,
}

impl ContainerRef {
    pub fn new(account: impl Into<String>, container: impl Into<String>) -> Self {
        Self {
            account: account.into(),
            container: container.into(),
        }
    }
}

impl std::fmt::Display for ContainerRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.account, self.container)
    }
}

/// How storage account names are turned into service URLs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "camelCase")]
pub enum BlobEndpoint {
    /// `https://{account}.{domain}/`
    Azure { domain: String },

    /// `{base_url}/{account}/` (storage emulators, local test servers)
    PathStyle { base_url: String },
}

impl Default for BlobEndpoint {
    fn default() -> Self {
        BlobEndpoint::Azure {
            domain: DEFAULT_BLOB_DOMAIN.to_string(),
        }
    }
}

impl BlobEndpoint {
    /// Base URL of the blob service for an account, always ending with `/`
    pub fn account_url(&self, account: &str) -> String {
        match self {
            BlobEndpoint::Azure { domain } => format!("https://{}.{}/", account, domain),
            BlobEndpoint::PathStyle { base_url } => {
                format!("{}/{}/", base_url.trim_end_matches('/'), account)
            }
        }
    }

    /// Logical URL prefix of a container, always ending with `/`
    pub fn container_url(&self, container: &ContainerRef) -> String {
        format!(
            "{}{}/",
            self.account_url(&container.account),
            container.container
        )
    }
}

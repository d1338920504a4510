//! Storage credentials
//!
//! Authentication itself is the identity provider's job. This module only
//! holds an already issued bearer token, or asks the provider's token endpoint
//! for one on behalf of a service principal and keeps it until it expires.

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use sitedeploy_core::CredentialRef;

use crate::error::{Result, StoreError};

/// Identity provider used when none is configured
pub const DEFAULT_AUTHORITY_HOST: &str = "https://login.microsoftonline.com";

/// Token audience for blob storage
pub const STORAGE_SCOPE: &str = "https://storage.azure.com/.default";

/// Tokens this close to expiry are renewed
const EXPIRY_MARGIN: Duration = Duration::minutes(5);

/// A bearer token for the blob service
#[derive(Clone)]
pub struct AccessToken {
    pub token: String,
    pub expires_on: Option<DateTime<Utc>>,
}

impl AccessToken {
    fn is_fresh(&self) -> bool {
        match self.expires_on {
            Some(expires_on) => expires_on - EXPIRY_MARGIN > Utc::now(),
            None => true,
        }
    }
}

impl std::fmt::Debug for AccessToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessToken")
            .field("token", &sitedeploy_core::obfuscate(&self.token))
            .field("expires_on", &self.expires_on)
            .finish()
    }
}

/// Source of bearer tokens
#[async_trait]
pub trait TokenCredential: Send + Sync {
    async fn token(&self) -> Result<AccessToken>;
}

/// A token obtained elsewhere (e.g. `az account get-access-token`)
#[derive(Debug, Clone)]
pub struct StaticTokenCredential {
    token: AccessToken,
}

impl StaticTokenCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: AccessToken {
                token: token.into(),
                expires_on: None,
            },
        }
    }
}

#[async_trait]
impl TokenCredential for StaticTokenCredential {
    async fn token(&self) -> Result<AccessToken> {
        Ok(self.token.clone())
    }
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
    expires_in: i64,
}

#[derive(Deserialize)]
struct TokenErrorResponse {
    error: String,
    #[serde(default)]
    error_description: Option<String>,
}

/// Service principal credential exchanged for tokens at the identity provider
pub struct ClientSecretCredential {
    identity: CredentialRef,
    authority_host: String,
    http: reqwest::Client,
    cached: Mutex<Option<AccessToken>>,
}

impl ClientSecretCredential {
    pub fn new(identity: CredentialRef) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("sitedeploy/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            identity,
            authority_host: DEFAULT_AUTHORITY_HOST.to_string(),
            http,
            cached: Mutex::new(None),
        })
    }

    /// Use another identity provider (sovereign clouds, test servers)
    pub fn with_authority_host(mut self, authority_host: impl Into<String>) -> Self {
        self.authority_host = authority_host.into();
        self
    }

    fn token_url(&self) -> String {
        format!(
            "{}/{}/oauth2/v2.0/token",
            self.authority_host.trim_end_matches('/'),
            self.identity.tenant_id
        )
    }

    async fn request_token(&self) -> Result<AccessToken> {
        let form = [
            ("grant_type", "client_credentials"),
            ("client_id", self.identity.client_id.as_str()),
            ("client_secret", self.identity.client_secret.as_str()),
            ("scope", STORAGE_SCOPE),
        ];

        let response = self
            .http
            .post(self.token_url())
            .form(&form)
            .send()
            .await
            .map_err(|e| StoreError::Credential {
                message: format!("token request failed: {}", e),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = match serde_json::from_str::<TokenErrorResponse>(&body) {
                Ok(err) => err.error_description.unwrap_or(err.error),
                Err(_) => format!("identity provider answered {}", status),
            };
            return Err(StoreError::Credential { message });
        }

        let token: TokenResponse = response.json().await.map_err(|e| StoreError::Credential {
            message: format!("unreadable token response: {}", e),
        })?;

        Ok(AccessToken {
            token: token.access_token,
            expires_on: Some(Utc::now() + Duration::seconds(token.expires_in)),
        })
    }
}

impl std::fmt::Debug for ClientSecretCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClientSecretCredential")
            .field("identity", &self.identity)
            .field("authority_host", &self.authority_host)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl TokenCredential for ClientSecretCredential {
    async fn token(&self) -> Result<AccessToken> {
        let mut cached = self.cached.lock().await;
        if let Some(token) = cached.as_ref()
            && token.is_fresh()
        {
            return Ok(token.clone());
        }

        tracing::debug!(tenant = %self.identity.tenant_id, client = %self.identity.client_id, "requesting storage token");
        let token = self.request_token().await?;
        *cached = Some(token.clone());
        Ok(token)
    }
}

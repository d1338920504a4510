//! Error types for blob store operations

use thiserror::Error;

/// Blob store operation errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    // ============ Addressing Errors ============
    #[error("Container not found: {container}")]
    ContainerNotFound { container: String },

    #[error("Blob not found: {name} in container {container}")]
    BlobNotFound { container: String, name: String },

    #[error("Invalid blob URL: {url} - {reason}")]
    InvalidUrl { url: String, reason: String },

    // ============ Authentication Errors ============
    #[error("Authorization failed ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Unable to obtain a credential: {message}")]
    Credential { message: String },

    // ============ Network Errors ============
    #[error("HTTP error: {status}{} - {message}", .code.as_ref().map(|c| format!(" ({})", c)).unwrap_or_default())]
    HttpError {
        status: u16,
        code: Option<String>,
        message: String,
    },

    #[error("Network error: {message}")]
    NetworkError { message: String },

    #[error("Request timed out: {message}")]
    Timeout { message: String },

    #[error("Invalid response from blob service: {message}")]
    InvalidResponse { message: String },
}

/// Result type for blob store operations
pub type Result<T> = std::result::Result<T, StoreError>;

impl StoreError {
    /// The store refused the caller's identity
    pub fn is_auth(&self) -> bool {
        matches!(
            self,
            StoreError::Unauthorized { .. } | StoreError::Credential { .. }
        )
    }

    /// Failures a later attempt could plausibly get past
    pub fn is_transient(&self) -> bool {
        match self {
            StoreError::NetworkError { .. } | StoreError::Timeout { .. } => true,
            StoreError::HttpError { status, .. } => *status == 429 || *status >= 500,
            _ => false,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            StoreError::Timeout {
                message: e.to_string(),
            }
        } else if e.is_connect() {
            StoreError::NetworkError {
                message: format!("Connection failed: {}", e),
            }
        } else if let Some(status) = e.status() {
            StoreError::HttpError {
                status: status.as_u16(),
                code: None,
                message: e.to_string(),
            }
        } else {
            StoreError::NetworkError {
                message: e.to_string(),
            }
        }
    }
}

impl From<url::ParseError> for StoreError {
    fn from(e: url::ParseError) -> Self {
        StoreError::InvalidUrl {
            url: String::new(),
            reason: e.to_string(),
        }
    }
}

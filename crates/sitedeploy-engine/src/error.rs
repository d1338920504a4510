//! Error types for sitedeploy-engine

use sitedeploy_core::{ContainerRef, ErrorKind, PackageError};
use sitedeploy_store::StoreError;
use thiserror::Error;

/// Result type for deployment operations
pub type Result<T> = std::result::Result<T, DeployError>;

/// Errors that end a deployment attempt
///
/// Every variant names the object and container it concerns. Store failures
/// keep the originating `StoreError` as their source.
#[derive(Debug, Error)]
pub enum DeployError {
    #[error("marker object '{marker}' not found in container {container}")]
    MarkerNotFound { marker: String, container: String },

    #[error("marker object '{marker}' in container {container} has no '{tag_key}' tag")]
    VersionTagNotFound {
        marker: String,
        tag_key: String,
        container: String,
    },

    #[error("cannot list container {container}")]
    ContainerUnavailable {
        container: String,
        #[source]
        source: StoreError,
    },

    #[error("credential rejected while {operation} {container}")]
    CredentialInvalid {
        operation: &'static str,
        container: String,
        #[source]
        source: StoreError,
    },

    #[error("cannot download package '{object}' from {container}")]
    DownloadFailure {
        object: String,
        container: String,
        #[source]
        source: StoreError,
    },

    #[error("package '{object}' is not a readable ZIP archive: {message}")]
    CorruptArchive { object: String, message: String },

    #[error("cannot read entry '{entry}' of package '{object}': {message}")]
    EntryReadFailure {
        object: String,
        entry: String,
        message: String,
    },

    #[error("cannot upload '{file}' to {container}")]
    UploadFailure {
        file: String,
        container: String,
        #[source]
        source: StoreError,
    },
}

impl DeployError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            DeployError::MarkerNotFound { .. } => ErrorKind::MarkerNotFound,
            DeployError::VersionTagNotFound { .. } => ErrorKind::VersionTagNotFound,
            DeployError::ContainerUnavailable { .. } => ErrorKind::ContainerUnavailable,
            DeployError::CredentialInvalid { .. } => ErrorKind::CredentialInvalid,
            DeployError::DownloadFailure { .. } => ErrorKind::DownloadFailure,
            DeployError::CorruptArchive { .. } => ErrorKind::CorruptArchive,
            DeployError::EntryReadFailure { .. } => ErrorKind::EntryReadFailure,
            DeployError::UploadFailure { .. } => ErrorKind::UploadFailure,
        }
    }

    /// The store failure behind this error, if any
    pub fn store_error(&self) -> Option<&StoreError> {
        match self {
            DeployError::ContainerUnavailable { source, .. }
            | DeployError::CredentialInvalid { source, .. }
            | DeployError::DownloadFailure { source, .. }
            | DeployError::UploadFailure { source, .. } => Some(source),
            _ => None,
        }
    }

    /// Whether a later attempt could get past this error unchanged
    pub fn is_transient(&self) -> bool {
        self.store_error().is_some_and(StoreError::is_transient)
    }

    /// Message with the store failure appended, for status fields and logs
    pub fn detail(&self) -> String {
        match self.store_error() {
            Some(source) => format!("{}: {}", self, source),
            None => self.to_string(),
        }
    }

    pub(crate) fn listing(container: &ContainerRef, source: StoreError) -> Self {
        if source.is_auth() {
            return DeployError::CredentialInvalid {
                operation: "listing",
                container: container.to_string(),
                source,
            };
        }
        DeployError::ContainerUnavailable {
            container: container.to_string(),
            source,
        }
    }

    pub(crate) fn download(container: &ContainerRef, object: &str, source: StoreError) -> Self {
        if source.is_auth() {
            return DeployError::CredentialInvalid {
                operation: "downloading from",
                container: container.to_string(),
                source,
            };
        }
        DeployError::DownloadFailure {
            object: object.to_string(),
            container: container.to_string(),
            source,
        }
    }

    pub(crate) fn upload(container: &ContainerRef, file: &str, source: StoreError) -> Self {
        if source.is_auth() {
            return DeployError::CredentialInvalid {
                operation: "uploading to",
                container: container.to_string(),
                source,
            };
        }
        DeployError::UploadFailure {
            file: file.to_string(),
            container: container.to_string(),
            source,
        }
    }

    pub(crate) fn package(object: &str, error: PackageError) -> Self {
        match error {
            PackageError::CorruptArchive { message } => DeployError::CorruptArchive {
                object: object.to_string(),
                message,
            },
            PackageError::EntryReadFailure { entry, message } => DeployError::EntryReadFailure {
                object: object.to_string(),
                entry,
                message,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn web() -> ContainerRef {
        ContainerRef::new("mysite", "$web")
    }

    #[test]
    fn test_listing_errors() {
        let missing = DeployError::listing(
            &web(),
            StoreError::ContainerNotFound {
                container: "mysite/$web".to_string(),
            },
        );
        assert_eq!(missing.kind(), ErrorKind::ContainerUnavailable);

        let forbidden = DeployError::listing(
            &web(),
            StoreError::Unauthorized {
                status: 403,
                message: "AuthorizationPermissionMismatch".to_string(),
            },
        );
        assert_eq!(forbidden.kind(), ErrorKind::CredentialInvalid);
        assert_eq!(
            forbidden.to_string(),
            "credential rejected while listing mysite/$web"
        );
    }

    #[test]
    fn test_upload_error_names_file() {
        let err = DeployError::upload(
            &web(),
            "assets/app.js",
            StoreError::NetworkError {
                message: "connection reset".to_string(),
            },
        );
        assert_eq!(err.kind(), ErrorKind::UploadFailure);
        assert_eq!(
            err.detail(),
            "cannot upload 'assets/app.js' to mysite/$web: Network error: connection reset"
        );
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.is_transient());
    }

    #[test]
    fn test_transient_errors() {
        let busy = DeployError::download(
            &ContainerRef::new("pkgs", "packages"),
            "2.0.0.zip",
            StoreError::HttpError {
                status: 503,
                code: Some("ServerBusy".to_string()),
                message: "The server is busy.".to_string(),
            },
        );
        assert!(busy.is_transient());

        let missing = DeployError::MarkerNotFound {
            marker: "index.html".to_string(),
            container: "mysite/$web".to_string(),
        };
        assert!(!missing.is_transient());

        let rejected = DeployError::listing(
            &web(),
            StoreError::Unauthorized {
                status: 403,
                message: "AuthorizationFailure".to_string(),
            },
        );
        assert!(!rejected.is_transient());
    }

    #[test]
    fn test_download_credential_failure() {
        let err = DeployError::download(
            &ContainerRef::new("pkgs", "packages"),
            "2.0.0.zip",
            StoreError::Credential {
                message: "invalid_client".to_string(),
            },
        );
        assert_eq!(err.kind(), ErrorKind::CredentialInvalid);
    }

    #[test]
    fn test_package_errors_keep_kind() {
        let corrupt = DeployError::package(
            "2.0.0.zip",
            PackageError::CorruptArchive {
                message: "invalid Zip archive".to_string(),
            },
        );
        assert_eq!(corrupt.kind(), ErrorKind::CorruptArchive);

        let entry = DeployError::package(
            "2.0.0.zip",
            PackageError::EntryReadFailure {
                entry: "broken.txt".to_string(),
                message: "checksum mismatch".to_string(),
            },
        );
        assert_eq!(entry.kind(), ErrorKind::EntryReadFailure);
        assert!(entry.to_string().contains("broken.txt"));
    }
}
